// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// The circuit file did not match the expected format.
    #[error("malformed circuit file: {0}")]
    Parse(String),

    #[error("reading circuit file: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-supplied parameter was out of range (zero partition
    /// size, zero streams, zero semaphore permits).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The graph contains a cycle at a point where a DAG is required.
    #[error("cycle detected in task graph")]
    CycleDetected,

    /// A partitioner produced an inconsistent result. This indicates a
    /// bug in the library, not in the caller.
    #[error("partition invariant violated: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
