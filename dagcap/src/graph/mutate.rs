// src/graph/mutate.rs

//! Randomized structural edits, used by the incremental benchmark loop
//! to churn the graph between executions.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::graph::{Graph, NodeId};

/// Attempt budget multiplier for [`Graph::add_random_edges`]: up to
/// `20 * count + 100` draws before giving up on a dense graph.
const ADD_EDGE_TRIES_PER_EDGE: usize = 20;

impl Graph {
    /// Remove `min(count, num_nodes())` nodes chosen uniformly,
    /// together with their incident edges.
    pub fn remove_random_nodes(&mut self, count: usize, rng: &mut impl Rng) {
        let mut candidates: Vec<NodeId> = self.node_ids().collect();
        candidates.shuffle(rng);
        candidates.truncate(count.min(self.num_nodes()));
        for node in candidates {
            self.remove_node(node);
        }
    }

    /// Remove `min(count, num_edges())` edges chosen uniformly.
    pub fn remove_random_edges(&mut self, count: usize, rng: &mut impl Rng) {
        let mut candidates: Vec<_> = self.edge_ids().collect();
        candidates.shuffle(rng);
        candidates.truncate(count.min(self.num_edges()));
        for edge in candidates {
            self.remove_edge(edge);
        }
    }

    /// Insert up to `count` edges that respect the current topological
    /// order, so the graph stays acyclic. Each attempt draws positions
    /// `i < j` in a forward topological order and connects
    /// `topo[i] -> topo[j]` unless that edge already exists.
    ///
    /// Returns the number actually added, which can fall short of
    /// `count` on a dense graph once the attempt budget runs out.
    pub fn add_random_edges(&mut self, count: usize, rng: &mut impl Rng) -> usize {
        let topo = self.forward_topo_order();
        let n = topo.len();
        if n < 2 || count == 0 {
            return 0;
        }

        let max_possible = n * (n - 1) / 2;
        let target = count.min(max_possible);
        let max_tries = ADD_EDGE_TRIES_PER_EDGE * target + 100;

        let mut added = 0usize;
        for _ in 0..max_tries {
            if added == target {
                break;
            }
            let i = rng.gen_range(0..=n - 2);
            let j = rng.gen_range(i + 1..=n - 1);
            let (from, to) = (topo[i], topo[j]);
            if self.contains_edge(from, to) {
                continue;
            }
            self.insert_edge(from, to);
            added += 1;
        }

        debug!(requested = count, added, "random forward edges inserted");
        added
    }

    /// Insert `count` fresh nodes named `{prefix}_{num_nodes}_{i}`,
    /// each wired to one uniformly-chosen pre-existing node with a fair
    /// coin deciding the direction. A fresh node has no other edges,
    /// so either direction keeps the graph acyclic.
    pub fn add_random_nodes(
        &mut self,
        count: usize,
        rng: &mut impl Rng,
        prefix: &str,
    ) -> Vec<NodeId> {
        let existing: Vec<NodeId> = self.node_ids().collect();

        let mut fresh = Vec::with_capacity(count);
        for i in 0..count {
            let name = format!("{prefix}_{}_{i}", self.num_nodes());
            fresh.push(self.insert_node(name));
        }

        if existing.is_empty() {
            return fresh;
        }

        for &node in &fresh {
            let anchor = existing[rng.gen_range(0..existing.len())];
            if rng.gen_bool(0.5) {
                self.insert_edge(anchor, node);
            } else {
                self.insert_edge(node, anchor);
            }
        }
        fresh
    }
}
