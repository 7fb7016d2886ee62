// src/commands/incre.rs

//! Incremental churn benchmark: stream-partitioned runs interleaved
//! with random structural edits, with the stream count bouncing
//! between 1 and `max_streams`.

use std::path::Path;

use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::commands::bench::load_checked;
use crate::config::{self, ScenarioFile};

/// Fully-resolved parameters for one incremental run.
#[derive(Debug, Clone, Copy)]
pub struct IncreParams {
    pub matrix_size: usize,
    pub num_incre_ops: usize,
    pub iterations: usize,
    pub max_streams: usize,
    pub seed: u64,
}

/// Merge the optional scenario file with CLI overrides. Flags win over
/// the file; the file's defaults fill whatever is left.
pub fn resolve_params(
    config_path: Option<&Path>,
    num_incre_ops: Option<usize>,
    matrix_size: Option<usize>,
    iterations: Option<usize>,
    max_streams: Option<usize>,
    seed: Option<u64>,
) -> Result<IncreParams> {
    let scenario = match config_path {
        Some(path) => config::load_and_validate(path)?,
        None => ScenarioFile::default(),
    };

    let params = IncreParams {
        matrix_size: matrix_size.unwrap_or(scenario.workload.matrix_size),
        num_incre_ops: num_incre_ops.unwrap_or(scenario.incremental.ops_per_iteration),
        iterations: iterations.unwrap_or(scenario.incremental.iterations),
        max_streams: max_streams.unwrap_or(scenario.incremental.max_streams),
        seed: seed.unwrap_or(scenario.incremental.seed),
    };

    if params.matrix_size == 0 {
        bail!("--matrix-size must be >= 1");
    }
    if params.iterations == 0 {
        bail!("--iterations must be >= 1");
    }
    if params.max_streams == 0 {
        bail!("--max-streams must be >= 1");
    }
    Ok(params)
}

pub async fn run(circuit: &Path, params: IncreParams) -> Result<()> {
    let mut graph = load_checked(circuit)?;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let max_streams = params.max_streams as i64;
    let mut num_streams = max_streams;
    let mut dir: i64 = -1;

    for iteration in 0..params.iterations {
        graph
            .run_stream_partition(params.matrix_size, num_streams as usize)
            .await?;

        let n = params.num_incre_ops;
        graph.remove_random_nodes(n, &mut rng);
        graph.remove_random_edges(n, &mut rng);
        let added = graph.add_random_edges(n, &mut rng);
        graph.add_random_nodes(n, &mut rng, "incre");

        if graph.has_cycle() {
            bail!("graph became cyclic after iteration {iteration}");
        }

        debug!(
            iteration,
            num_streams,
            edges_added = added,
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "incremental iteration complete"
        );

        // Bounce the stream count between 1 and max_streams.
        num_streams += dir;
        if num_streams <= 1 {
            num_streams = 1;
            dir = 1;
        } else if num_streams >= max_streams {
            num_streams = max_streams;
            dir = -1;
        }
    }

    println!(
        "total_runtime_stream_partition: {} ms",
        graph.run_totals().stream_partition().as_millis()
    );
    Ok(())
}
