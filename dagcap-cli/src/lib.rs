// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

use anyhow::Result;

use crate::cli::{CliArgs, Command};

/// High-level entry point used by `main.rs`: dispatch the parsed
/// subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Baseline {
            circuit,
            matrix_size,
        } => commands::bench::baseline(&circuit, matrix_size).await,

        Command::Cluster {
            circuit,
            matrix_size,
            partition_size,
        } => commands::bench::cluster(&circuit, matrix_size, partition_size).await,

        Command::Streams {
            circuit,
            matrix_size,
            num_streams,
        } => commands::bench::streams(&circuit, matrix_size, num_streams).await,

        Command::Semaphore {
            circuit,
            matrix_size,
            num_semaphore,
        } => commands::bench::semaphore(&circuit, matrix_size, num_semaphore).await,

        Command::Incre {
            circuit,
            num_incre_ops,
            config,
            matrix_size,
            iterations,
            max_streams,
            seed,
        } => {
            let params = commands::incre::resolve_params(
                config.as_deref(),
                num_incre_ops,
                matrix_size,
                iterations,
                max_streams,
                seed,
            )?;
            commands::incre::run(&circuit, params).await
        }
    }
}
