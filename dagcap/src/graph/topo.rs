// src/graph/topo.rs

//! Topology services over the DAG store.
//!
//! - reverse topological order by iterative DFS from the sources
//! - BFS level decomposition assigning `level`, `lid` and `topo_id`
//! - cycle detection
//! - topological-compatibility check between the primary and the
//!   reshaped edge sets
//!
//! All traversals are deterministic: sources are taken in slot order,
//! successors follow fanout insertion order, and BFS ties break in FIFO
//! queue order. Tests rely on this.

use std::collections::VecDeque;

use crate::errors::{GraphError, Result};
use crate::graph::{Graph, NodeId};

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

impl Graph {
    /// True if the graph currently contains a directed cycle.
    ///
    /// Three-color DFS over every node in slot order, so cycles are
    /// found whether or not they are reachable from a source.
    pub fn has_cycle(&self) -> bool {
        let mut color = vec![Color::White; self.node_slot_capacity()];

        for start in self.node_slots() {
            if color[start as usize] != Color::White {
                continue;
            }
            // Frame: node slot plus a cursor into its fanout list.
            let mut stack = vec![(start, self.out_cursor(start))];
            color[start as usize] = Color::Gray;

            while let Some((slot, cursor)) = stack.last_mut() {
                match self.advance_out(cursor) {
                    Some(succ) => match color[succ as usize] {
                        Color::Gray => return true,
                        Color::White => {
                            color[succ as usize] = Color::Gray;
                            let frame = (succ, self.out_cursor(succ));
                            stack.push(frame);
                        }
                        Color::Black => {}
                    },
                    None => {
                        color[*slot as usize] = Color::Black;
                        stack.pop();
                    }
                }
            }
        }
        false
    }

    /// Reverse topological order: DFS from every source, emitting each
    /// node after its subtree is complete. Reversing the result yields
    /// a forward topological order.
    ///
    /// On a cyclic graph the output covers fewer than `num_nodes()`
    /// nodes only when the cycle is unreachable from every source;
    /// [`has_cycle`](Graph::has_cycle) is the authoritative check.
    pub fn reverse_topo_dfs(&self) -> Vec<NodeId> {
        let mut visited = vec![false; self.node_slot_capacity()];
        let mut order = Vec::with_capacity(self.num_nodes());

        for start in self.node_slots() {
            if self.node_data(start).in_len != 0 || visited[start as usize] {
                continue;
            }
            visited[start as usize] = true;
            let mut stack = vec![(start, self.out_cursor(start))];

            while let Some((slot, cursor)) = stack.last_mut() {
                match self.advance_out(cursor) {
                    Some(succ) => {
                        if !visited[succ as usize] {
                            visited[succ as usize] = true;
                            let frame = (succ, self.out_cursor(succ));
                            stack.push(frame);
                        }
                    }
                    None => {
                        order.push(self.node_id_at(*slot));
                        stack.pop();
                    }
                }
            }
        }
        order
    }

    /// Forward topological order (reverse of
    /// [`reverse_topo_dfs`](Graph::reverse_topo_dfs)).
    pub fn forward_topo_order(&self) -> Vec<NodeId> {
        let mut order = self.reverse_topo_dfs();
        order.reverse();
        order
    }

    /// BFS level decomposition.
    ///
    /// Sources sit at level 0; each later wave holds the nodes whose
    /// last dependency resolved in the previous wave. Assigns every
    /// node its `level`, its index within the level (`lid`) and a
    /// strict global `topo_id` in dequeue order, then returns the
    /// per-level node lists.
    ///
    /// Fails with [`GraphError::CycleDetected`] when fewer than
    /// `num_nodes()` nodes are reachable this way.
    pub fn level_decomposition(&mut self) -> Result<Vec<Vec<NodeId>>> {
        let cap = self.node_slot_capacity();
        let mut indegree = vec![0usize; cap];
        let mut queue: VecDeque<u32> = VecDeque::new();

        for slot in self.node_slots() {
            let deg = self.node_data(slot).in_len;
            indegree[slot as usize] = deg;
            if deg == 0 {
                queue.push_back(slot);
            }
        }

        let mut levels: Vec<Vec<NodeId>> = Vec::new();
        let mut visited = 0usize;

        while !queue.is_empty() {
            let width = queue.len();
            let level_idx = levels.len();
            let mut level_nodes = Vec::with_capacity(width);

            for _ in 0..width {
                let Some(slot) = queue.pop_front() else { break };

                let lid = level_nodes.len();
                let node = self.node_data_mut(slot);
                node.level = Some(level_idx);
                node.lid = Some(lid);
                node.topo_id = Some(visited);
                visited += 1;
                level_nodes.push(self.node_id_at(slot));

                for e in self.out_edge_slots(slot) {
                    let succ = self.edge_data(e).to.index as usize;
                    indegree[succ] -= 1;
                    if indegree[succ] == 0 {
                        queue.push_back(succ as u32);
                    }
                }
            }
            levels.push(level_nodes);
        }

        if visited != self.num_nodes() {
            return Err(GraphError::CycleDetected);
        }
        Ok(levels)
    }

    /// Whether the primary edge set and the reshaped edge set admit a
    /// common topological order, i.e. whether their union multigraph is
    /// acyclic.
    ///
    /// Reflects the reshaped adjacency written by the most recent
    /// [`partition_stream`](Graph::partition_stream) call; structural
    /// mutations invalidate that view until the next partition.
    pub fn shares_topo_order_with_original(&self) -> bool {
        let cap = self.node_slot_capacity();
        let mut indegree = vec![0usize; cap];
        let mut adj: Vec<Vec<u32>> = vec![Vec::new(); cap];

        // Union of both edge sets; duplicates are fine, the sort just
        // counts them twice.
        for slot in self.node_slots() {
            let node = self.node_data(slot);
            indegree[slot as usize] = node.in_len + node.reshaped_in.len();
            for e in self.out_edge_slots(slot) {
                adj[slot as usize].push(self.edge_data(e).to.index);
            }
            for succ in &node.reshaped_out {
                adj[slot as usize].push(succ.index);
            }
        }

        let mut queue: VecDeque<u32> = VecDeque::new();
        for slot in self.node_slots() {
            if indegree[slot as usize] == 0 {
                queue.push_back(slot);
            }
        }

        let mut visited = 0usize;
        while let Some(slot) = queue.pop_front() {
            visited += 1;
            for &succ in &adj[slot as usize] {
                indegree[succ as usize] -= 1;
                if indegree[succ as usize] == 0 {
                    queue.push_back(succ);
                }
            }
        }

        visited == self.num_nodes()
    }

    /// Global topological id assigned by the most recent level
    /// decomposition, or `None` if none has run since the last reset.
    pub fn topo_id(&self, node: NodeId) -> Option<usize> {
        self.node_data(self.node_slot(node)).topo_id
    }

    /// BFS level assigned by the most recent level decomposition.
    pub fn level(&self, node: NodeId) -> Option<usize> {
        self.node_data(self.node_slot(node)).level
    }

    /// Index within its BFS level assigned by the most recent level
    /// decomposition.
    pub fn level_index(&self, node: NodeId) -> Option<usize> {
        self.node_data(self.node_slot(node)).lid
    }

    // Cursor helpers so DFS frames can hold a position in a fanout
    // list without borrowing the graph.
    fn out_cursor(&self, slot: u32) -> Option<u32> {
        self.out_edge_slots(slot).next()
    }

    fn advance_out(&self, cursor: &mut Option<u32>) -> Option<u32> {
        let e = (*cursor)?;
        let succ = self.edge_data(e).to.index;
        *cursor = self.next_out_edge(e);
        Some(succ)
    }
}
