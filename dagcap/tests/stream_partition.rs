use std::collections::HashSet;

use dagcap::{Graph, GraphError, NodeId};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seven-node fan: n1 -> {n3, n4, n5} -> n7, n3 -> n6, n2 isolated.
fn fan() -> (Graph, [NodeId; 7]) {
    let mut graph = Graph::new();
    let n: Vec<NodeId> = (1..=7).map(|i| graph.insert_node(format!("n{i}"))).collect();
    graph.insert_edge(n[0], n[2]);
    graph.insert_edge(n[0], n[3]);
    graph.insert_edge(n[0], n[4]);
    graph.insert_edge(n[2], n[6]);
    graph.insert_edge(n[3], n[6]);
    graph.insert_edge(n[4], n[6]);
    graph.insert_edge(n[2], n[5]);
    let ids = [n[0], n[1], n[2], n[3], n[4], n[5], n[6]];
    (graph, ids)
}

fn reshaped_edges(graph: &Graph) -> Vec<(NodeId, NodeId)> {
    let mut edges = Vec::new();
    for node in graph.node_ids() {
        for &succ in graph.reshaped_fanouts(node) {
            edges.push((node, succ));
        }
    }
    edges
}

/// Every reshaped edge must point from a smaller to a larger topo id;
/// that is what keeps the union of both edge sets acyclic.
fn assert_monotone(graph: &Graph) {
    for (from, to) in reshaped_edges(graph) {
        let t_from = graph.topo_id(from).unwrap();
        let t_to = graph.topo_id(to).unwrap();
        assert!(t_from < t_to, "reshaped edge {t_from} -> {t_to} goes backwards");
    }
}

#[test]
fn fan_with_two_streams() {
    let (mut graph, [n1, n2, n3, n4, n5, n6, n7]) = fan();
    graph.partition_stream(2).unwrap();

    assert!(graph.shares_topo_order_with_original());
    assert_monotone(&graph);

    // lid % 2 deals stream 0 = [n1, n3, n5, n6], stream 1 = [n2, n4, n7].
    // The chains show up as reshaped edges between stream neighbours.
    let edges: HashSet<(NodeId, NodeId)> = reshaped_edges(&graph).into_iter().collect();
    assert!(edges.contains(&(n1, n3)));
    assert!(edges.contains(&(n3, n5)));
    assert!(edges.contains(&(n5, n6)));
    assert!(edges.contains(&(n2, n4)));
    assert!(edges.contains(&(n4, n7)));
    // Cross-stream dependencies survive: n1 feeds n4's stream, n5 is
    // the latest same-stream predecessor of n7.
    assert!(edges.contains(&(n1, n4)));
    assert!(edges.contains(&(n5, n7)));
    assert_eq!(edges.len(), 7);
}

#[test]
fn single_stream_serializes_everything() {
    let (mut graph, _) = fan();
    graph.partition_stream(1).unwrap();

    // One chain of all nodes: exactly |V| - 1 linearization edges plus
    // no cross-stream edges.
    let edges = reshaped_edges(&graph);
    assert_eq!(edges.len(), graph.num_nodes() - 1);
    assert!(graph.shares_topo_order_with_original());
    assert_monotone(&graph);

    // Chain edges follow topo_id order exactly.
    let mut in_counts = vec![0usize; graph.num_nodes()];
    for node in graph.node_ids() {
        in_counts[graph.topo_id(node).unwrap()] = graph.reshaped_fanins(node).len();
    }
    // Every node except the first has exactly one reshaped fanin.
    assert_eq!(in_counts[0], 0);
    assert!(in_counts[1..].iter().all(|&c| c == 1));
}

#[test]
fn stream_partition_is_deterministic() {
    let (mut graph_a, _) = fan();
    let (mut graph_b, _) = fan();
    graph_a.partition_stream(3).unwrap();
    graph_b.partition_stream(3).unwrap();
    assert_eq!(reshaped_edges(&graph_a), reshaped_edges(&graph_b));

    // Re-partitioning the same graph reproduces the same reshaping.
    let first = reshaped_edges(&graph_a);
    graph_a.partition_stream(3).unwrap();
    assert_eq!(reshaped_edges(&graph_a), first);
}

#[test]
fn zero_streams_is_a_config_error() {
    let (mut graph, _) = fan();
    assert!(matches!(
        graph.partition_stream(0),
        Err(GraphError::Config(_))
    ));
}

#[test]
fn cyclic_graph_is_rejected() {
    let (mut graph, [n1, _, n3, ..]) = fan();
    graph.insert_edge(n3, n1);
    assert!(matches!(
        graph.partition_stream(2),
        Err(GraphError::CycleDetected)
    ));
}

#[test]
fn compatibility_holds_across_widths_on_a_random_dag() {
    let mut rng = StdRng::seed_from_u64(4242);
    let mut graph = Graph::new();
    let nodes: Vec<NodeId> = (0..80).map(|i| graph.insert_node(format!("r{i}"))).collect();
    for pair in nodes.windows(2) {
        graph.insert_edge(pair[0], pair[1]);
    }
    graph.add_random_edges(120, &mut rng);
    assert!(!graph.has_cycle());

    for streams in 1..=8 {
        graph.partition_stream(streams).unwrap();
        assert!(graph.shares_topo_order_with_original());
        assert_monotone(&graph);
    }
}

#[test]
fn at_most_s_chains_exist() {
    let (mut graph, _) = fan();
    for streams in 1..=4 {
        graph.partition_stream(streams).unwrap();

        // Chain heads are the nodes with no reshaped fanin from their
        // own chain; counting nodes with reshaped in-degree 0 bounds
        // the number of chains, since every chain head has none.
        let heads = graph
            .node_ids()
            .filter(|&n| graph.reshaped_fanins(n).is_empty())
            .count();
        assert!(heads <= streams, "{heads} chain heads with {streams} streams");
    }
}
