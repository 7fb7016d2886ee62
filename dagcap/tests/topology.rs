use dagcap::{Graph, GraphError, NodeId};

fn diamond() -> (Graph, [NodeId; 4]) {
    let mut graph = Graph::new();
    let a = graph.insert_node("A");
    let b = graph.insert_node("B");
    let c = graph.insert_node("C");
    let d = graph.insert_node("D");
    graph.insert_edge(a, c);
    graph.insert_edge(a, d);
    graph.insert_edge(b, d);
    (graph, [a, b, c, d])
}

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

#[test]
fn diamond_reverse_dfs_order() {
    let (graph, [a, b, c, d]) = diamond();

    assert!(!graph.has_cycle());
    // Sources in slot order (A then B), fanouts in insertion order.
    assert_eq!(graph.reverse_topo_dfs(), vec![c, d, a, b]);
    assert_eq!(graph.forward_topo_order(), vec![b, a, d, c]);
}

#[test]
fn forward_topo_order_respects_every_edge() {
    let (graph, _) = fan();
    let order = graph.forward_topo_order();
    assert_eq!(order.len(), graph.num_nodes());

    let position = |node: NodeId| order.iter().position(|&x| x == node).unwrap();
    for edge in graph.edge_ids() {
        let (from, to) = graph.edge_endpoints(edge);
        assert!(position(from) < position(to));
    }
}

#[test]
fn fan_level_decomposition() {
    let (mut graph, [n1, n2, n3, n4, n5, n6, n7]) = fan();

    let levels = graph.level_decomposition().unwrap();
    assert_eq!(levels.len(), 3);
    assert_eq!(levels[0], vec![n1, n2]);
    assert_eq!(levels[1], vec![n3, n4, n5]);
    assert_eq!(levels[2], vec![n6, n7]);

    // lid is the index within the level, topo_id the dequeue order.
    assert_eq!(graph.level(n5), Some(1));
    assert_eq!(graph.level_index(n5), Some(2));
    assert_eq!(graph.topo_id(n1), Some(0));
    assert_eq!(graph.topo_id(n6), Some(5));
    assert_eq!(graph.topo_id(n7), Some(6));
}

#[test]
fn cycle_is_detected_by_both_checkers() {
    let (mut graph, [a, _, c, _]) = diamond();
    assert!(!graph.has_cycle());
    assert!(graph.level_decomposition().is_ok());

    // C -> A closes a cycle A -> C -> A.
    graph.insert_edge(c, a);

    assert!(graph.has_cycle());
    assert!(matches!(
        graph.level_decomposition(),
        Err(GraphError::CycleDetected)
    ));
}

#[test]
fn cycle_reachable_from_a_source_is_detected() {
    let (mut graph, [_, _, c, _]) = diamond();
    let e = graph.insert_node("E");
    graph.insert_edge(c, e);
    graph.insert_edge(e, c);

    assert!(graph.has_cycle());
    assert!(graph.level_decomposition().is_err());
}

#[test]
fn two_node_loop_with_no_sources() {
    let mut graph = Graph::new();
    let a = graph.insert_node("A");
    let b = graph.insert_node("B");
    graph.insert_edge(a, b);
    graph.insert_edge(b, a);

    assert!(graph.has_cycle());
    // No sources, so the DFS topo emits nothing at all.
    assert!(graph.reverse_topo_dfs().is_empty());
    assert!(graph.level_decomposition().is_err());
}

#[test]
fn compatibility_check_trivially_true_without_reshaping() {
    let (graph, _) = fan();
    assert!(graph.shares_topo_order_with_original());
}

#[test]
fn empty_graph_is_acyclic() {
    let mut graph = Graph::new();
    assert!(!graph.has_cycle());
    assert!(graph.level_decomposition().unwrap().is_empty());
    assert!(graph.forward_topo_order().is_empty());
}
