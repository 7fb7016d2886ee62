// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::model::ScenarioFile;
use crate::config::validate::validate_scenario;

/// Load a scenario file from a given path and return the raw
/// `ScenarioFile`.
///
/// This only performs TOML deserialization; it does **not** perform
/// semantic validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ScenarioFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading scenario file at {:?}", path))?;

    let scenario: ScenarioFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML scenario from {:?}", path))?;

    Ok(scenario)
}

/// Load a scenario file from path and run basic validation.
///
/// This is the recommended entry point for the rest of the
/// application: reads TOML, applies defaults (handled by `serde` +
/// `Default` impls), and rejects zero values where the library would
/// fail with a configuration error anyway.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ScenarioFile> {
    let scenario = load_from_path(&path)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}
