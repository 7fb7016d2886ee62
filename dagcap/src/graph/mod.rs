// src/graph/mod.rs

//! The mutable DAG and everything that reads or edits its structure.
//!
//! - [`store`] owns nodes and edges with O(1) structural edits.
//! - [`topo`] provides topological orders, level decomposition, cycle
//!   detection and the compatibility check.
//! - [`circuit`] loads the textual circuit format.
//! - [`mutate`] implements the randomized incremental edits.

pub mod circuit;
pub mod mutate;
pub mod store;
pub mod topo;

pub use circuit::parse_circuit;
pub use store::{EdgeId, Graph, NodeId};
