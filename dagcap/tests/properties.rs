use std::collections::HashSet;

use dagcap::{Graph, NodeId};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Random DAG: `n` nodes, edges only from a lower to a higher index,
/// so acyclicity holds by construction.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = Graph> {
    (2..=max_nodes).prop_flat_map(|n| {
        let edges = proptest::collection::vec((0..n, 0..n), 0..n * 3);
        edges.prop_map(move |raw| {
            let mut graph = Graph::new();
            let nodes: Vec<NodeId> =
                (0..n).map(|i| graph.insert_node(format!("v{i}"))).collect();

            let mut seen = HashSet::new();
            for (a, b) in raw {
                let (i, j) = (a.min(b), a.max(b));
                if i == j || !seen.insert((i, j)) {
                    continue;
                }
                graph.insert_edge(nodes[i], nodes[j]);
            }
            graph
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stream_partition_always_shares_a_topo_order(
        mut graph in dag_strategy(24),
        streams in 1usize..=4,
    ) {
        prop_assert!(!graph.has_cycle());
        graph.partition_stream(streams).unwrap();
        prop_assert!(graph.shares_topo_order_with_original());

        for node in graph.node_ids().collect::<Vec<_>>() {
            let t = graph.topo_id(node).unwrap();
            for &succ in graph.reshaped_fanouts(node) {
                prop_assert!(t < graph.topo_id(succ).unwrap());
            }
        }
    }

    #[test]
    fn random_edge_insertion_preserves_the_dag(
        mut graph in dag_strategy(20),
        requested in 0usize..30,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let before = graph.num_edges();

        let added = graph.add_random_edges(requested, &mut rng);

        prop_assert!(added <= requested);
        prop_assert_eq!(graph.num_edges(), before + added);
        prop_assert!(!graph.has_cycle());

        let mut pairs = HashSet::new();
        for edge in graph.edge_ids().collect::<Vec<_>>() {
            prop_assert!(pairs.insert(graph.edge_endpoints(edge)));
        }
        graph.check_consistency().unwrap();
    }

    #[test]
    fn level_decomposition_respects_edges(mut graph in dag_strategy(24)) {
        let levels = graph.level_decomposition().unwrap();
        let total: usize = levels.iter().map(Vec::len).sum();
        prop_assert_eq!(total, graph.num_nodes());

        for edge in graph.edge_ids().collect::<Vec<_>>() {
            let (from, to) = graph.edge_endpoints(edge);
            prop_assert!(graph.level(from).unwrap() < graph.level(to).unwrap());
            prop_assert!(graph.topo_id(from).unwrap() < graph.topo_id(to).unwrap());
        }
    }
}
