// src/config/model.rs

use serde::Deserialize;

/// Scenario configuration as read from a TOML file:
///
/// ```toml
/// [workload]
/// matrix_size = 8
///
/// [incremental]
/// iterations = 1000
/// ops_per_iteration = 4
/// max_streams = 8
/// seed = 42
/// ```
///
/// Both sections are optional and have the defaults shown above.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioFile {
    /// Per-task payload parameters from `[workload]`.
    #[serde(default)]
    pub workload: WorkloadSection,

    /// Incremental benchmark parameters from `[incremental]`.
    #[serde(default)]
    pub incremental: IncrementalSection,
}

/// `[workload]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadSection {
    /// Side length of the synthetic matrix-multiply payload.
    #[serde(default = "default_matrix_size")]
    pub matrix_size: usize,
}

fn default_matrix_size() -> usize {
    8
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            matrix_size: default_matrix_size(),
        }
    }
}

/// `[incremental]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct IncrementalSection {
    /// Number of churn iterations to run.
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Nodes/edges removed and added per iteration, unless the CLI
    /// supplies its own count.
    #[serde(default = "default_ops_per_iteration")]
    pub ops_per_iteration: usize,

    /// The stream count bounces in `[1, max_streams]` across
    /// iterations.
    #[serde(default = "default_max_streams")]
    pub max_streams: usize,

    /// Seed for the mutation RNG; fixed so runs are reproducible.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_iterations() -> usize {
    1000
}

fn default_ops_per_iteration() -> usize {
    4
}

fn default_max_streams() -> usize {
    8
}

fn default_seed() -> u64 {
    42
}

impl Default for IncrementalSection {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            ops_per_iteration: default_ops_per_iteration(),
            max_streams: default_max_streams(),
            seed: default_seed(),
        }
    }
}
