// src/exec/mod.rs

//! Execution driver: turns whichever dependency view is selected
//! (primary edges, cluster DAG, or reshaped adjacency) into a runtime
//! task graph and runs it on tokio, optionally gated by a counting
//! semaphore.

pub mod payload;
pub mod runner;

pub use runner::{RunStats, RunTotals};
