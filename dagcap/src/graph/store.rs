// src/graph/store.rs

use tracing::debug;

use crate::errors::{GraphError, Result};
use crate::exec::RunTotals;
use crate::partition::ClusterDag;

/// Stable handle to a node: slot index plus a generation tag.
///
/// Handles survive arbitrary insertions and removals of *other* nodes
/// and edges. Once the node itself is removed, the handle is stale and
/// any use of it panics instead of silently aliasing a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) gen: u32,
}

impl NodeId {
    /// Slot index of this node, stable for the node's lifetime.
    ///
    /// Indices are dense for a freshly loaded graph and may gain holes
    /// (later reused) as nodes are removed.
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Stable handle to an edge; same slot-plus-generation scheme as
/// [`NodeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId {
    pub(crate) index: u32,
    pub(crate) gen: u32,
}

/// Arena slot. The generation is bumped on every removal so stale
/// handles can be told apart from the slot's next occupant.
#[derive(Debug)]
struct Slot<T> {
    gen: u32,
    data: Option<T>,
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) name: String,

    first_in: Option<u32>,
    last_in: Option<u32>,
    pub(crate) in_len: usize,

    first_out: Option<u32>,
    last_out: Option<u32>,
    pub(crate) out_len: usize,

    // Derived marks, written by the level decomposition and the
    // partitioners. Meaningless (None) until the corresponding pass
    // has run; reset by the next pass.
    pub(crate) level: Option<usize>,
    pub(crate) lid: Option<usize>,
    pub(crate) topo_id: Option<usize>,
    pub(crate) stream_mark: Option<usize>,
    pub(crate) cluster_id: Option<usize>,

    pub(crate) reshaped_in: Vec<NodeId>,
    pub(crate) reshaped_out: Vec<NodeId>,
}

impl NodeData {
    fn new(name: String) -> Self {
        Self {
            name,
            first_in: None,
            last_in: None,
            in_len: 0,
            first_out: None,
            last_out: None,
            out_len: 0,
            level: None,
            lid: None,
            topo_id: None,
            stream_mark: None,
            cluster_id: None,
            reshaped_in: Vec::new(),
            reshaped_out: Vec::new(),
        }
    }

    pub(crate) fn reset_marks(&mut self) {
        self.level = None;
        self.lid = None;
        self.topo_id = None;
        self.stream_mark = None;
        self.reshaped_in.clear();
        self.reshaped_out.clear();
    }
}

/// Edge record. The four link fields thread this edge through two
/// intrusive doubly-linked lists at once: the source's fanout list and
/// the target's fanin list. Unlinking from both is O(1), which is what
/// makes `remove_edge` O(1) and `remove_node` O(deg).
#[derive(Debug)]
pub(crate) struct EdgeData {
    pub(crate) from: NodeId,
    pub(crate) to: NodeId,

    prev_out: Option<u32>,
    next_out: Option<u32>,
    prev_in: Option<u32>,
    next_in: Option<u32>,
}

/// Mutable DAG of named task nodes.
///
/// Nodes and edges live in generational slot arenas; adjacency lists
/// append at the tail, so fanin/fanout iteration observes insertion
/// order. Structural edits are cheap and never invalidate handles to
/// surviving entities:
///
/// - [`insert_node`](Graph::insert_node) and
///   [`insert_edge`](Graph::insert_edge) are O(1). `insert_edge`
///   checks neither for duplicates nor for cycles; callers that need
///   uniqueness use [`contains_edge`](Graph::contains_edge), and
///   acyclicity is the caller's contract at partition/execution time.
/// - [`remove_edge`](Graph::remove_edge) is O(1);
///   [`remove_node`](Graph::remove_node) is O(deg).
///
/// Any structural edit discards the cached cluster partition: cluster
/// nodes only live between a partition call and the next mutation.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Slot<NodeData>>,
    edges: Vec<Slot<EdgeData>>,
    free_nodes: Vec<u32>,
    free_edges: Vec<u32>,
    node_count: usize,
    edge_count: usize,

    partition_size: usize,
    pub(crate) clusters: Option<ClusterDag>,
    pub(crate) totals: RunTotals,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_nodes(&self) -> usize {
        self.node_count
    }

    pub fn num_edges(&self) -> usize {
        self.edge_count
    }

    /// Upper bound on cluster size used by
    /// [`partition_c_pasta`](Graph::partition_c_pasta).
    pub fn set_partition_size(&mut self, size: usize) {
        self.partition_size = size;
    }

    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    /// Insert a fresh node with no edges.
    pub fn insert_node(&mut self, name: impl Into<String>) -> NodeId {
        self.clusters = None;
        let data = NodeData::new(name.into());
        let index = match self.free_nodes.pop() {
            Some(index) => {
                let slot = &mut self.nodes[index as usize];
                slot.data = Some(data);
                index
            }
            None => {
                self.nodes.push(Slot { gen: 0, data: Some(data) });
                (self.nodes.len() - 1) as u32
            }
        };
        self.node_count += 1;
        NodeId {
            index,
            gen: self.nodes[index as usize].gen,
        }
    }

    /// Insert the edge `from -> to`, appending it to `from`'s fanout
    /// list and `to`'s fanin list.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn insert_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        let from_slot = self.node_slot(from);
        let to_slot = self.node_slot(to);
        self.clusters = None;

        let data = EdgeData {
            from,
            to,
            prev_out: self.node_data(from_slot).last_out,
            next_out: None,
            prev_in: self.node_data(to_slot).last_in,
            next_in: None,
        };
        let index = match self.free_edges.pop() {
            Some(index) => {
                self.edges[index as usize].data = Some(data);
                index
            }
            None => {
                self.edges.push(Slot { gen: 0, data: Some(data) });
                (self.edges.len() - 1) as u32
            }
        };

        // Tail append on both endpoint lists.
        let prev_out = self.edge_data(index).prev_out;
        match prev_out {
            Some(p) => self.edge_data_mut(p).next_out = Some(index),
            None => self.node_data_mut(from_slot).first_out = Some(index),
        }
        self.node_data_mut(from_slot).last_out = Some(index);
        self.node_data_mut(from_slot).out_len += 1;

        let prev_in = self.edge_data(index).prev_in;
        match prev_in {
            Some(p) => self.edge_data_mut(p).next_in = Some(index),
            None => self.node_data_mut(to_slot).first_in = Some(index),
        }
        self.node_data_mut(to_slot).last_in = Some(index);
        self.node_data_mut(to_slot).in_len += 1;

        self.edge_count += 1;
        EdgeId {
            index,
            gen: self.edges[index as usize].gen,
        }
    }

    /// Remove a single edge, splicing it out of both endpoint lists.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_edge(&mut self, edge: EdgeId) {
        let index = self.edge_slot(edge);
        self.clusters = None;
        self.unlink_edge(index);
        let slot = &mut self.edges[index as usize];
        slot.data = None;
        slot.gen = slot.gen.wrapping_add(1);
        self.free_edges.push(index);
        self.edge_count -= 1;
    }

    /// Remove a node together with all incident edges.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_node(&mut self, node: NodeId) {
        let slot = self.node_slot(node);
        self.clusters = None;

        while let Some(eidx) = self.node_data(slot).first_in {
            self.unlink_edge(eidx);
            self.release_edge_slot(eidx);
        }
        while let Some(eidx) = self.node_data(slot).first_out {
            self.unlink_edge(eidx);
            self.release_edge_slot(eidx);
        }

        let s = &mut self.nodes[slot as usize];
        s.data = None;
        s.gen = s.gen.wrapping_add(1);
        self.free_nodes.push(slot);
        self.node_count -= 1;
        debug!(node = node.index, remaining = self.node_count, "node removed");
    }

    /// True if `node` still refers to a live node.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes
            .get(node.index as usize)
            .is_some_and(|s| s.gen == node.gen && s.data.is_some())
    }

    /// True if `edge` still refers to a live edge.
    pub fn contains_edge_id(&self, edge: EdgeId) -> bool {
        self.edges
            .get(edge.index as usize)
            .is_some_and(|s| s.gen == edge.gen && s.data.is_some())
    }

    /// Linear scan of `from`'s fanout list for an edge to `to`.
    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        let slot = self.node_slot(from);
        self.out_edge_slots(slot)
            .any(|e| self.edge_data(e).to == to)
    }

    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_data(self.node_slot(node)).name
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.node_data(self.node_slot(node)).in_len
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.node_data(self.node_slot(node)).out_len
    }

    pub fn edge_endpoints(&self, edge: EdgeId) -> (NodeId, NodeId) {
        let e = self.edge_data(self.edge_slot(edge));
        (e.from, e.to)
    }

    /// Live nodes in slot order (insertion order, with removed slots
    /// punched out and reused by later insertions).
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, s)| {
            s.data.as_ref().map(|_| NodeId {
                index: i as u32,
                gen: s.gen,
            })
        })
    }

    /// Live edges in slot order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().enumerate().filter_map(|(i, s)| {
            s.data.as_ref().map(|_| EdgeId {
                index: i as u32,
                gen: s.gen,
            })
        })
    }

    /// Incoming edges of `node`, in insertion order.
    pub fn fanins(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let slot = self.node_slot(node);
        self.in_edge_slots(slot).map(|i| EdgeId {
            index: i,
            gen: self.edges[i as usize].gen,
        })
    }

    /// Outgoing edges of `node`, in insertion order.
    pub fn fanouts(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let slot = self.node_slot(node);
        self.out_edge_slots(slot).map(|i| EdgeId {
            index: i,
            gen: self.edges[i as usize].gen,
        })
    }

    /// Source nodes of `node`'s incoming edges, in insertion order.
    pub fn fanin_sources(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let slot = self.node_slot(node);
        self.in_edge_slots(slot).map(|i| self.edge_data(i).from)
    }

    /// Target nodes of `node`'s outgoing edges, in insertion order.
    pub fn fanout_targets(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let slot = self.node_slot(node);
        self.out_edge_slots(slot).map(|i| self.edge_data(i).to)
    }

    /// Verify the adjacency invariant: every live edge is linked
    /// exactly once in its source's fanout list and once in its
    /// target's fanin list, list lengths match the degree counters,
    /// and the back-links are mutually consistent.
    ///
    /// O(V + E); meant for tests and debugging after mutation
    /// sequences, not for the hot path.
    pub fn check_consistency(&self) -> Result<()> {
        let mut seen_out = 0usize;
        let mut seen_in = 0usize;

        for slot in self.node_slots() {
            let node = self.node_data(slot);

            let mut prev: Option<u32> = None;
            let mut len = 0usize;
            let mut cur = node.first_out;
            while let Some(e) = cur {
                let edge = self.edge_data(e);
                if edge.from.index != slot {
                    return Err(GraphError::InvariantViolation(format!(
                        "edge {e} in fanout list of node {slot} but points from {}",
                        edge.from.index
                    )));
                }
                if edge.prev_out != prev {
                    return Err(GraphError::InvariantViolation(format!(
                        "broken prev_out link at edge {e}"
                    )));
                }
                prev = cur;
                cur = edge.next_out;
                len += 1;
            }
            if node.last_out != prev || len != node.out_len {
                return Err(GraphError::InvariantViolation(format!(
                    "fanout list of node {slot} has {len} entries, counter says {}",
                    node.out_len
                )));
            }
            seen_out += len;

            let mut prev: Option<u32> = None;
            let mut len = 0usize;
            let mut cur = node.first_in;
            while let Some(e) = cur {
                let edge = self.edge_data(e);
                if edge.to.index != slot {
                    return Err(GraphError::InvariantViolation(format!(
                        "edge {e} in fanin list of node {slot} but points to {}",
                        edge.to.index
                    )));
                }
                if edge.prev_in != prev {
                    return Err(GraphError::InvariantViolation(format!(
                        "broken prev_in link at edge {e}"
                    )));
                }
                prev = cur;
                cur = edge.next_in;
                len += 1;
            }
            if node.last_in != prev || len != node.in_len {
                return Err(GraphError::InvariantViolation(format!(
                    "fanin list of node {slot} has {len} entries, counter says {}",
                    node.in_len
                )));
            }
            seen_in += len;
        }

        if seen_out != self.edge_count || seen_in != self.edge_count {
            return Err(GraphError::InvariantViolation(format!(
                "edge count {} but fanout lists hold {seen_out} and fanin lists {seen_in}",
                self.edge_count
            )));
        }
        Ok(())
    }

    // ---- crate-internal slot-level access for the algorithm modules ----

    /// Number of node slots ever allocated; scratch arrays indexed by
    /// slot are sized with this.
    pub(crate) fn node_slot_capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Occupied node slots in slot order.
    pub(crate) fn node_slots(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.data.as_ref().map(|_| i as u32))
    }

    pub(crate) fn node_id_at(&self, slot: u32) -> NodeId {
        NodeId {
            index: slot,
            gen: self.nodes[slot as usize].gen,
        }
    }

    pub(crate) fn node_slot(&self, node: NodeId) -> u32 {
        match self.nodes.get(node.index as usize) {
            Some(s) if s.gen == node.gen && s.data.is_some() => node.index,
            _ => panic!("stale node handle {node:?}"),
        }
    }

    pub(crate) fn edge_slot(&self, edge: EdgeId) -> u32 {
        match self.edges.get(edge.index as usize) {
            Some(s) if s.gen == edge.gen && s.data.is_some() => edge.index,
            _ => panic!("stale edge handle {edge:?}"),
        }
    }

    pub(crate) fn node_data(&self, slot: u32) -> &NodeData {
        self.nodes[slot as usize]
            .data
            .as_ref()
            .expect("empty node slot")
    }

    pub(crate) fn node_data_mut(&mut self, slot: u32) -> &mut NodeData {
        self.nodes[slot as usize]
            .data
            .as_mut()
            .expect("empty node slot")
    }

    pub(crate) fn edge_data(&self, slot: u32) -> &EdgeData {
        self.edges[slot as usize]
            .data
            .as_ref()
            .expect("empty edge slot")
    }

    fn edge_data_mut(&mut self, slot: u32) -> &mut EdgeData {
        self.edges[slot as usize]
            .data
            .as_mut()
            .expect("empty edge slot")
    }

    /// Fanout edge slots of a node, in list (insertion) order.
    pub(crate) fn out_edge_slots(&self, slot: u32) -> impl Iterator<Item = u32> + '_ {
        let mut cur = self.node_data(slot).first_out;
        std::iter::from_fn(move || {
            let e = cur?;
            cur = self.edge_data(e).next_out;
            Some(e)
        })
    }

    /// Successor link of an edge within its source's fanout list.
    pub(crate) fn next_out_edge(&self, eidx: u32) -> Option<u32> {
        self.edge_data(eidx).next_out
    }

    /// Fanin edge slots of a node, in list (insertion) order.
    pub(crate) fn in_edge_slots(&self, slot: u32) -> impl Iterator<Item = u32> + '_ {
        let mut cur = self.node_data(slot).first_in;
        std::iter::from_fn(move || {
            let e = cur?;
            cur = self.edge_data(e).next_in;
            Some(e)
        })
    }

    // ---- linked-list surgery ----

    fn unlink_edge(&mut self, eidx: u32) {
        let (from, to, prev_out, next_out, prev_in, next_in) = {
            let e = self.edge_data(eidx);
            (e.from.index, e.to.index, e.prev_out, e.next_out, e.prev_in, e.next_in)
        };

        match prev_out {
            Some(p) => self.edge_data_mut(p).next_out = next_out,
            None => self.node_data_mut(from).first_out = next_out,
        }
        match next_out {
            Some(n) => self.edge_data_mut(n).prev_out = prev_out,
            None => self.node_data_mut(from).last_out = prev_out,
        }
        self.node_data_mut(from).out_len -= 1;

        match prev_in {
            Some(p) => self.edge_data_mut(p).next_in = next_in,
            None => self.node_data_mut(to).first_in = next_in,
        }
        match next_in {
            Some(n) => self.edge_data_mut(n).prev_in = prev_in,
            None => self.node_data_mut(to).last_in = prev_in,
        }
        self.node_data_mut(to).in_len -= 1;
    }

    /// Free an edge slot that has already been unlinked.
    fn release_edge_slot(&mut self, eidx: u32) {
        let slot = &mut self.edges[eidx as usize];
        slot.data = None;
        slot.gen = slot.gen.wrapping_add(1);
        self.free_edges.push(eidx);
        self.edge_count -= 1;
    }
}
