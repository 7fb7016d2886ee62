// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::model::ScenarioFile;

/// Run basic semantic validation against a loaded scenario.
///
/// This checks:
/// - `matrix_size >= 1`
/// - `iterations >= 1`
/// - `max_streams >= 1`
///
/// `ops_per_iteration` may be zero: an iteration that only re-runs the
/// partition is a valid scenario.
pub fn validate_scenario(scenario: &ScenarioFile) -> Result<()> {
    if scenario.workload.matrix_size == 0 {
        return Err(anyhow!("[workload].matrix_size must be >= 1 (got 0)"));
    }
    if scenario.incremental.iterations == 0 {
        return Err(anyhow!("[incremental].iterations must be >= 1 (got 0)"));
    }
    if scenario.incremental.max_streams == 0 {
        return Err(anyhow!("[incremental].max_streams must be >= 1 (got 0)"));
    }
    Ok(())
}
