// src/partition/cluster.rs

//! C-PASTA clustering: a parallel work-stealing traversal that fuses
//! nodes into clusters of bounded size, biased toward the cluster of
//! each node's highest-numbered predecessor so linear chains stay
//! together. The result is a coarse cluster DAG that executes with far
//! fewer, larger tasks.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::thread;

use crossbeam_deque::{Steal, Stealer, Worker};
use tracing::{debug, info};

use crate::errors::{GraphError, Result};
use crate::graph::{Graph, NodeId};

/// Aggregate node of the cluster DAG: the primary nodes fused into one
/// schedulable unit.
#[derive(Debug)]
pub struct ClusterNode {
    members: Vec<NodeId>,
    fanins: Vec<usize>,
    fanouts: Vec<usize>,
}

/// Edge between two distinct clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterEdge {
    pub from: usize,
    pub to: usize,
}

/// Coarse DAG produced by [`Graph::partition_c_pasta`]. Rebuilt from
/// scratch on every partition call and discarded by the next structural
/// mutation of the primary graph.
#[derive(Debug, Default)]
pub struct ClusterDag {
    cnodes: Vec<ClusterNode>,
    cedges: Vec<ClusterEdge>,
}

impl ClusterDag {
    pub fn num_clusters(&self) -> usize {
        self.cnodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.cedges.len()
    }

    /// Primary nodes fused into cluster `cluster`, in slot order.
    pub fn members(&self, cluster: usize) -> &[NodeId] {
        &self.cnodes[cluster].members
    }

    /// Clusters reachable from `cluster` over one edge.
    pub fn fanouts(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.cnodes[cluster]
            .fanouts
            .iter()
            .map(|&e| self.cedges[e].to)
    }

    /// Clusters with an edge into `cluster`.
    pub fn fanins(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.cnodes[cluster]
            .fanins
            .iter()
            .map(|&e| self.cedges[e].from)
    }

    pub fn edges(&self) -> impl Iterator<Item = ClusterEdge> + '_ {
        self.cedges.iter().copied()
    }

    /// Kahn topological sort over the clusters; true when it stalls
    /// before visiting every cluster.
    pub fn has_cycle(&self) -> bool {
        let mut indegree: Vec<usize> =
            self.cnodes.iter().map(|c| c.fanins.len()).collect();
        let mut queue: VecDeque<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut visited = 0usize;
        while let Some(cluster) = queue.pop_front() {
            visited += 1;
            for e in &self.cnodes[cluster].fanouts {
                let succ = self.cedges[*e].to;
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    queue.push_back(succ);
                }
            }
        }
        visited != self.cnodes.len()
    }
}

/// Shared state of one clustering run. All arrays are indexed by node
/// slot; cluster ids are dense `0..=max_cluster_id`.
struct ClusterScratch {
    dep_cnt: Vec<AtomicUsize>,
    cluster_of: Vec<AtomicI64>,
    cluster_cnt: Vec<AtomicUsize>,
    processed: AtomicUsize,
    max_cluster_id: AtomicI64,
}

impl Graph {
    /// Fuse nodes into clusters of at most
    /// [`partition_size`](Graph::partition_size) members and build the
    /// cluster DAG.
    ///
    /// Runs one work-stealing worker per hardware thread. The member
    /// assignment is non-deterministic across runs (any racing worker
    /// may win a cluster slot), but the invariants are not: every node
    /// lands in exactly one cluster, no cluster exceeds the size bound,
    /// and every cross-cluster edge points from a smaller to a strictly
    /// larger cluster id, so the cluster DAG is acyclic.
    ///
    /// Fails with [`GraphError::Config`] when no partition size is set
    /// and [`GraphError::CycleDetected`] when the graph is not a DAG.
    pub fn partition_c_pasta(&mut self) -> Result<()> {
        let partition_size = self.partition_size();
        if partition_size == 0 {
            return Err(GraphError::Config(
                "partition size must be set before clustering".into(),
            ));
        }
        if self.has_cycle() {
            return Err(GraphError::CycleDetected);
        }

        let slots: Vec<u32> = self.node_slots().collect();
        for &slot in &slots {
            self.node_data_mut(slot).cluster_id = None;
        }

        let total = self.num_nodes();
        if total == 0 {
            self.clusters = Some(ClusterDag::default());
            return Ok(());
        }

        let cap = self.node_slot_capacity();
        let scratch = ClusterScratch {
            dep_cnt: (0..cap).map(|_| AtomicUsize::new(0)).collect(),
            cluster_of: (0..cap).map(|_| AtomicI64::new(-1)).collect(),
            cluster_cnt: (0..cap).map(|_| AtomicUsize::new(0)).collect(),
            processed: AtomicUsize::new(0),
            max_cluster_id: AtomicI64::new(-1),
        };

        let num_workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(total);

        let workers: Vec<Worker<u32>> =
            (0..num_workers).map(|_| Worker::new_lifo()).collect();
        let stealers: Vec<Stealer<u32>> = workers.iter().map(Worker::stealer).collect();

        // Seed every source into the first deque, each opening a fresh
        // cluster.
        let mut next_id: i64 = 0;
        for &slot in &slots {
            if self.node_data(slot).in_len == 0 {
                scratch.cluster_of[slot as usize].store(next_id, Ordering::Release);
                workers[0].push(slot);
                next_id += 1;
            }
        }
        scratch.max_cluster_id.store(next_id - 1, Ordering::Release);
        debug!(
            sources = next_id,
            workers = num_workers,
            "clustering traversal starting"
        );

        let graph: &Graph = self;
        let scratch_ref = &scratch;
        let stealers_ref = &stealers;
        thread::scope(|s| {
            for (me, worker) in workers.into_iter().enumerate() {
                s.spawn(move || {
                    while scratch_ref.processed.load(Ordering::Acquire) < total {
                        while let Some(slot) = worker.pop() {
                            process_chain(graph, scratch_ref, partition_size, &worker, slot);
                        }

                        for (other, stealer) in stealers_ref.iter().enumerate() {
                            if other == me {
                                continue;
                            }
                            let stolen = loop {
                                match stealer.steal() {
                                    Steal::Success(slot) => break Some(slot),
                                    Steal::Empty => break None,
                                    Steal::Retry => continue,
                                }
                            };
                            if let Some(slot) = stolen {
                                process_chain(graph, scratch_ref, partition_size, &worker, slot);
                                break;
                            }
                        }
                    }
                });
            }
        });

        self.materialize_clusters(&scratch, partition_size)
    }

    /// Cluster DAG from the most recent
    /// [`partition_c_pasta`](Graph::partition_c_pasta), or `None` if
    /// the graph was mutated since.
    pub fn cluster_dag(&self) -> Option<&ClusterDag> {
        self.clusters.as_ref()
    }

    /// Cluster id of `node` from the most recent clustering run.
    pub fn cluster_id(&self, node: NodeId) -> Option<usize> {
        self.node_data(self.node_slot(node)).cluster_id
    }

    fn materialize_clusters(
        &mut self,
        scratch: &ClusterScratch,
        partition_size: usize,
    ) -> Result<()> {
        let max_id = scratch.max_cluster_id.load(Ordering::Acquire);
        if max_id < 0 {
            return Err(GraphError::InvariantViolation(
                "clustering finished without allocating a cluster".into(),
            ));
        }

        let num_clusters = (max_id + 1) as usize;
        let mut buckets: Vec<Vec<NodeId>> = vec![Vec::new(); num_clusters];

        let slots: Vec<u32> = self.node_slots().collect();
        for &slot in &slots {
            let id = scratch.cluster_of[slot as usize].load(Ordering::Acquire);
            if id < 0 {
                return Err(GraphError::InvariantViolation(format!(
                    "node {slot} was never assigned a cluster"
                )));
            }
            let id = id as usize;
            self.node_data_mut(slot).cluster_id = Some(id);
            buckets[id].push(self.node_id_at(slot));
        }

        for (id, members) in buckets.iter().enumerate() {
            if members.is_empty() {
                return Err(GraphError::InvariantViolation(format!(
                    "cluster {id} has no members"
                )));
            }
            if members.len() > partition_size {
                return Err(GraphError::InvariantViolation(format!(
                    "cluster {id} holds {} members, limit is {partition_size}",
                    members.len()
                )));
            }
        }

        let mut dag = ClusterDag {
            cnodes: buckets
                .into_iter()
                .map(|members| ClusterNode {
                    members,
                    fanins: Vec::new(),
                    fanouts: Vec::new(),
                })
                .collect(),
            cedges: Vec::new(),
        };

        // One cluster edge per distinct (from, to) pair of the primary
        // edges that cross a cluster boundary.
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let edge_ids: Vec<_> = self.edge_ids().collect();
        for edge in edge_ids {
            let (u, v) = self.edge_endpoints(edge);
            let cu = self.node_data(self.node_slot(u)).cluster_id;
            let cv = self.node_data(self.node_slot(v)).cluster_id;
            let (Some(cu), Some(cv)) = (cu, cv) else { continue };
            if cu == cv || !seen.insert((cu, cv)) {
                continue;
            }
            let idx = dag.cedges.len();
            dag.cedges.push(ClusterEdge { from: cu, to: cv });
            dag.cnodes[cu].fanouts.push(idx);
            dag.cnodes[cv].fanins.push(idx);
        }

        info!(
            clusters = dag.num_clusters(),
            cluster_edges = dag.num_edges(),
            "clustering complete"
        );
        self.clusters = Some(dag);
        Ok(())
    }
}

/// Process one popped node: assign its cluster, inline the linear chain
/// hanging off it, then release its successors.
fn process_chain(
    graph: &Graph,
    scratch: &ClusterScratch,
    partition_size: usize,
    worker: &Worker<u32>,
    slot: u32,
) {
    scratch.processed.fetch_add(1, Ordering::AcqRel);
    assign_cluster_id(graph, scratch, partition_size, slot);

    // Follow the linear chain: single fanout whose target has a single
    // fanin. Chain members never need the deque, their only dependency
    // is the node we just handled.
    let mut cur = slot;
    loop {
        if graph.node_data(cur).out_len != 1 {
            break;
        }
        let Some(e) = graph.out_edge_slots(cur).next() else { break };
        let succ = graph.edge_data(e).to.index;
        if graph.node_data(succ).in_len != 1 {
            break;
        }
        cur = succ;
        scratch.dep_cnt[cur as usize].fetch_add(1, Ordering::AcqRel);
        scratch.processed.fetch_add(1, Ordering::AcqRel);
        assign_cluster_id(graph, scratch, partition_size, cur);
    }

    // Release the dependents of the chain's final node. The AcqRel
    // counter increment is what publishes this worker's cluster-id
    // stores to whichever worker ends up releasing the successor.
    for e in graph.out_edge_slots(cur) {
        let succ = graph.edge_data(e).to.index;
        let fanin_count = graph.node_data(succ).in_len;
        if scratch.dep_cnt[succ as usize].fetch_add(1, Ordering::AcqRel) == fanin_count - 1 {
            worker.push(succ);
        }
    }
}

/// Pick the cluster for `slot`: the highest cluster id among its
/// predecessors (or its own pre-seeded id for sources), falling back to
/// a fresh cluster when the desired one is full.
fn assign_cluster_id(
    graph: &Graph,
    scratch: &ClusterScratch,
    partition_size: usize,
    slot: u32,
) {
    let mut desired = scratch.cluster_of[slot as usize].load(Ordering::Acquire);
    for e in graph.in_edge_slots(slot) {
        let pred = graph.edge_data(e).from.index;
        let c = scratch.cluster_of[pred as usize].load(Ordering::Acquire);
        if c > desired {
            desired = c;
        }
    }
    // Every predecessor was assigned before this node was released and
    // sources are pre-seeded, so a cluster id is always available.
    debug_assert!(desired >= 0, "node processed before its predecessors");
    let desired = desired as usize;

    if scratch.cluster_cnt[desired].fetch_add(1, Ordering::AcqRel) < partition_size {
        scratch.cluster_of[slot as usize].store(desired as i64, Ordering::Release);
    } else {
        let fresh = scratch.max_cluster_id.fetch_add(1, Ordering::AcqRel) + 1;
        scratch.cluster_of[slot as usize].store(fresh, Ordering::Release);
        scratch.cluster_cnt[fresh as usize].fetch_add(1, Ordering::AcqRel);
    }
}
