use dagcap::{Graph, GraphError, NodeId};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn linear_chain(n: usize) -> (Graph, Vec<NodeId>) {
    let mut graph = Graph::new();
    let nodes: Vec<NodeId> = (0..n).map(|i| graph.insert_node(format!("n{i}"))).collect();
    for pair in nodes.windows(2) {
        graph.insert_edge(pair[0], pair[1]);
    }
    (graph, nodes)
}

/// Independent oracle: rebuild the cluster DAG in petgraph and ask it
/// about cycles.
fn cluster_dag_is_acyclic(graph: &Graph) -> bool {
    let dag = graph.cluster_dag().expect("partition ran");
    let mut pg: DiGraph<usize, ()> = DiGraph::new();
    let indices: Vec<_> = (0..dag.num_clusters()).map(|c| pg.add_node(c)).collect();
    for edge in dag.edges() {
        pg.add_edge(indices[edge.from], indices[edge.to], ());
    }
    !is_cyclic_directed(&pg)
}

#[test]
fn chain_of_100_makes_10_chained_clusters() {
    let (mut graph, nodes) = linear_chain(100);
    graph.set_partition_size(10);
    graph.partition_c_pasta().unwrap();

    let dag = graph.cluster_dag().unwrap();
    assert_eq!(dag.num_clusters(), 10);
    for c in 0..10 {
        assert_eq!(dag.members(c).len(), 10);
    }

    // The whole chain is walked in order by one worker, so membership
    // is contiguous and the cluster DAG is itself a chain.
    for (i, node) in nodes.iter().enumerate() {
        assert_eq!(graph.cluster_id(*node), Some(i / 10));
    }
    assert_eq!(dag.num_edges(), 9);
    for c in 0..9 {
        assert_eq!(dag.fanouts(c).collect::<Vec<_>>(), vec![c + 1]);
    }
    assert!(!dag.has_cycle());
    assert!(cluster_dag_is_acyclic(&graph));
}

#[test]
fn fully_parallel_nodes_cluster_without_edges() {
    let mut graph = Graph::new();
    let nodes: Vec<NodeId> = (0..100).map(|i| graph.insert_node(format!("p{i}"))).collect();
    graph.set_partition_size(10);
    graph.partition_c_pasta().unwrap();

    // Every source opens its own cluster, so isolated nodes stay
    // singletons; what matters is the bound and the absence of edges.
    let dag = graph.cluster_dag().unwrap();
    assert_eq!(dag.num_edges(), 0);
    for node in &nodes {
        assert!(graph.cluster_id(*node).is_some());
    }
    for c in 0..dag.num_clusters() {
        assert!(dag.members(c).len() <= 10);
        assert!(!dag.members(c).is_empty());
    }
    assert!(!dag.has_cycle());
}

#[test]
fn random_dag_respects_size_bound_and_stays_acyclic() {
    let mut rng = StdRng::seed_from_u64(99);
    let (mut graph, _) = linear_chain(50);
    graph.add_random_edges(60, &mut rng);
    assert!(!graph.has_cycle());

    graph.set_partition_size(7);
    graph.partition_c_pasta().unwrap();

    let dag = graph.cluster_dag().unwrap();
    let mut total_members = 0;
    for c in 0..dag.num_clusters() {
        let members = dag.members(c);
        assert!(members.len() <= 7);
        total_members += members.len();
        for node in members {
            assert_eq!(graph.cluster_id(*node), Some(c));
        }
    }
    assert_eq!(total_members, graph.num_nodes());

    // Cross-cluster edges always climb to a larger cluster id, which
    // is what makes the cluster DAG acyclic by construction.
    for edge in dag.edges() {
        assert!(edge.from < edge.to);
    }
    assert!(!dag.has_cycle());
    assert!(cluster_dag_is_acyclic(&graph));
}

#[test]
fn zero_partition_size_is_a_config_error() {
    let (mut graph, _) = linear_chain(5);
    assert!(matches!(
        graph.partition_c_pasta(),
        Err(GraphError::Config(_))
    ));
}

#[test]
fn cyclic_input_is_rejected() {
    let (mut graph, nodes) = linear_chain(5);
    graph.insert_edge(nodes[4], nodes[0]);
    graph.set_partition_size(2);
    assert!(matches!(
        graph.partition_c_pasta(),
        Err(GraphError::CycleDetected)
    ));
}

#[test]
fn mutation_discards_the_cluster_dag() {
    let (mut graph, _) = linear_chain(20);
    graph.set_partition_size(4);
    graph.partition_c_pasta().unwrap();
    assert!(graph.cluster_dag().is_some());

    graph.insert_node("fresh");
    assert!(graph.cluster_dag().is_none());
}

#[test]
fn empty_graph_partitions_to_nothing() {
    let mut graph = Graph::new();
    graph.set_partition_size(4);
    graph.partition_c_pasta().unwrap();
    assert_eq!(graph.cluster_dag().unwrap().num_clusters(), 0);
}

#[test]
fn repartitioning_after_edits_reassigns_every_node() {
    let (mut graph, nodes) = linear_chain(30);
    graph.set_partition_size(5);
    graph.partition_c_pasta().unwrap();

    graph.remove_node(nodes[10]);
    let extra = graph.insert_node("extra");
    graph.insert_edge(nodes[9], extra);

    graph.partition_c_pasta().unwrap();
    for node in graph.node_ids() {
        assert!(graph.cluster_id(node).is_some());
    }
    let dag = graph.cluster_dag().unwrap();
    for c in 0..dag.num_clusters() {
        assert!(dag.members(c).len() <= 5);
    }
    assert!(!dag.has_cycle());
}
