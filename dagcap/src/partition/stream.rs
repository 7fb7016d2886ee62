// src/partition/stream.rs

//! Stream partitioning: deterministic reshaping of the edge set into
//! `S` linear chains plus cross-chain edges. Execution of the reshaped
//! adjacency never has more than `S` tasks ready at once, and the
//! reshaped edges stay compatible with a topological order of the
//! primary graph.

use tracing::info;

use crate::errors::{GraphError, Result};
use crate::graph::{Graph, NodeId};

impl Graph {
    /// Reshape the graph into `num_streams` chains.
    ///
    /// Nodes are processed in BFS level order and dealt to streams by
    /// `lid % num_streams`. For each node, one reshaped edge is added
    /// per cross-stream predecessor, except that predecessors living on
    /// the stream recorded in the node's stream mark collapse to a
    /// single edge from the one with the largest `topo_id` (the chain
    /// covers the earlier ones transitively). Finally each stream is
    /// linearized by connecting its adjacent members.
    ///
    /// Deterministic for a given graph and stream count. Fails with
    /// [`GraphError::Config`] for a zero stream count, propagates
    /// [`GraphError::CycleDetected`] from the level decomposition, and
    /// fails with [`GraphError::InvariantViolation`] if the reshaped
    /// adjacency does not share a topological order with the primary
    /// edges.
    pub fn partition_stream(&mut self, num_streams: usize) -> Result<()> {
        if num_streams == 0 {
            return Err(GraphError::Config("stream count must be at least 1".into()));
        }

        let slots: Vec<u32> = self.node_slots().collect();
        for &slot in &slots {
            self.node_data_mut(slot).reset_marks();
        }

        let levels = self.level_decomposition()?;
        let mut streams: Vec<Vec<u32>> = vec![Vec::new(); num_streams];

        for level in &levels {
            for node in level {
                let slot = node.index;
                let stream_cur = self.stream_of(slot, num_streams);
                let mark = self.node_data(slot).stream_mark;

                // Scan predecessors: same-mark ones compete for a
                // single edge, other cross-stream ones each get a
                // direct edge.
                let mut last_same: Option<(u32, usize)> = None;
                let mut cross: Vec<u32> = Vec::new();
                for e in self.in_edge_slots(slot) {
                    let pred = self.edge_data(e).from.index;
                    let pred_stream = self.stream_of(pred, num_streams);
                    if Some(pred_stream) == mark {
                        let topo = self.topo_of(pred);
                        match last_same {
                            Some((_, best)) if best >= topo => {}
                            _ => last_same = Some((pred, topo)),
                        }
                    } else if pred_stream != stream_cur {
                        cross.push(pred);
                    }
                }

                for pred in cross {
                    self.push_reshaped(pred, slot);
                }
                if let Some((pred, _)) = last_same {
                    self.push_reshaped(pred, slot);
                }

                streams[stream_cur].push(slot);

                // Hint cross-stream successors that a predecessor of
                // theirs lives on this stream.
                let succs: Vec<u32> = self
                    .out_edge_slots(slot)
                    .map(|e| self.edge_data(e).to.index)
                    .collect();
                for succ in succs {
                    if self.stream_of(succ, num_streams) != stream_cur {
                        self.node_data_mut(succ).stream_mark = Some(stream_cur);
                    }
                }
            }
        }

        // Serialize each stream into a chain.
        for stream in &streams {
            for pair in stream.windows(2) {
                self.push_reshaped(pair[0], pair[1]);
            }
        }

        if !self.shares_topo_order_with_original() {
            return Err(GraphError::InvariantViolation(
                "reshaped edges do not share a topological order with the primary graph".into(),
            ));
        }

        info!(
            streams = num_streams,
            nodes = self.num_nodes(),
            "stream partition complete"
        );
        Ok(())
    }

    /// Reshaped predecessors of `node` from the most recent
    /// [`partition_stream`](Graph::partition_stream).
    pub fn reshaped_fanins(&self, node: NodeId) -> &[NodeId] {
        &self.node_data(self.node_slot(node)).reshaped_in
    }

    /// Reshaped successors of `node` from the most recent
    /// [`partition_stream`](Graph::partition_stream).
    pub fn reshaped_fanouts(&self, node: NodeId) -> &[NodeId] {
        &self.node_data(self.node_slot(node)).reshaped_out
    }

    /// Stream a node is dealt to: its level index modulo the stream
    /// count.
    fn stream_of(&self, slot: u32, num_streams: usize) -> usize {
        let lid = self
            .node_data(slot)
            .lid
            .expect("level decomposition assigns every node a lid");
        lid % num_streams
    }

    fn topo_of(&self, slot: u32) -> usize {
        self.node_data(slot)
            .topo_id
            .expect("level decomposition assigns every node a topo id")
    }

    fn push_reshaped(&mut self, from_slot: u32, to_slot: u32) {
        let from = self.node_id_at(from_slot);
        let to = self.node_id_at(to_slot);
        self.node_data_mut(from_slot).reshaped_out.push(to);
        self.node_data_mut(to_slot).reshaped_in.push(from);
    }
}
