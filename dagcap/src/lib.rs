// src/lib.rs

//! Parallelism-limited scheduling of task DAGs.
//!
//! Circuit-simulation workloads produce task graphs with far more
//! structural parallelism than any machine can exploit; running them
//! as-is drowns the runtime in scheduling overhead. This crate reshapes
//! such a graph so that executing it never exceeds a chosen width,
//! while preserving every original dependency:
//!
//! - [`Graph::partition_c_pasta`] fuses nodes into clusters of bounded
//!   size with a parallel work-stealing traversal, then executes at
//!   cluster granularity.
//! - [`Graph::partition_stream`] rewrites the edge set into `S` linear
//!   chains plus cross-chain edges, so at most `S` tasks are ever ready
//!   at once.
//!
//! The graph itself is editable between runs: node and edge insertion
//! and removal are O(1), so incremental workloads can mutate and
//! re-partition cheaply. Execution is delegated to tokio; each run mode
//! (original edges, cluster DAG, reshaped edges, or original edges
//! under a counting semaphore) reports wall-clock time and the peak
//! parallelism it actually reached.

pub mod errors;
pub mod exec;
pub mod graph;
pub mod partition;

pub use errors::{GraphError, Result};
pub use exec::{RunStats, RunTotals};
pub use graph::{EdgeId, Graph, NodeId};
pub use partition::ClusterDag;
