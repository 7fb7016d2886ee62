// src/partition/mod.rs

//! The two reshaping strategies that cap effective parallelism.
//!
//! - [`cluster`]: C-PASTA work-stealing clustering into bounded-size
//!   cluster nodes.
//! - [`stream`]: deterministic level-based reshaping into `S` linear
//!   chains.

pub mod cluster;
pub mod stream;

pub use cluster::{ClusterDag, ClusterEdge, ClusterNode};
