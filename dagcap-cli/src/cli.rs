// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `dagcap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagcap",
    version,
    about = "Run circuit task DAGs under cluster, stream, or semaphore parallelism caps.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGCAP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Execute the graph as loaded, with unrestricted parallelism.
    Baseline {
        /// Circuit DAG file.
        #[arg(value_name = "CIRCUIT")]
        circuit: PathBuf,

        /// Side length of the per-task matrix-multiply payload.
        #[arg(long, default_value_t = 8)]
        matrix_size: usize,
    },

    /// Cluster the graph with C-PASTA, then execute the cluster DAG.
    Cluster {
        #[arg(value_name = "CIRCUIT")]
        circuit: PathBuf,

        #[arg(long, default_value_t = 8)]
        matrix_size: usize,

        /// Maximum number of nodes fused into one cluster.
        #[arg(long, value_name = "K")]
        partition_size: usize,
    },

    /// Reshape the graph into S streams and execute the reshaped
    /// adjacency.
    Streams {
        #[arg(value_name = "CIRCUIT")]
        circuit: PathBuf,

        #[arg(long, default_value_t = 8)]
        matrix_size: usize,

        /// Number of concurrent chains to allow.
        #[arg(long, value_name = "S")]
        num_streams: usize,
    },

    /// Execute the original graph under a counting semaphore.
    Semaphore {
        #[arg(value_name = "CIRCUIT")]
        circuit: PathBuf,

        #[arg(long, default_value_t = 8)]
        matrix_size: usize,

        /// Semaphore capacity: at most K tasks execute at once.
        #[arg(long, value_name = "K")]
        num_semaphore: usize,
    },

    /// Incremental churn benchmark: stream-partitioned runs
    /// interleaved with random graph edits.
    Incre {
        #[arg(value_name = "CIRCUIT")]
        circuit: PathBuf,

        /// Nodes/edges removed and added per iteration. Overrides
        /// `[incremental].ops_per_iteration`.
        #[arg(long, value_name = "N")]
        num_incre_ops: Option<usize>,

        /// Optional TOML scenario file providing the values below.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Overrides `[workload].matrix_size`.
        #[arg(long)]
        matrix_size: Option<usize>,

        /// Overrides `[incremental].iterations`.
        #[arg(long)]
        iterations: Option<usize>,

        /// Overrides `[incremental].max_streams`.
        #[arg(long)]
        max_streams: Option<usize>,

        /// Overrides `[incremental].seed`.
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
