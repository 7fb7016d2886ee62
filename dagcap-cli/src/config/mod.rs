// src/config/mod.rs

//! Scenario configuration for the benchmark drivers.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a scenario file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{IncrementalSection, ScenarioFile, WorkloadSection};
pub use validate::validate_scenario;
