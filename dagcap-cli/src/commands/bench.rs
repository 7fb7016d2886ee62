// src/commands/bench.rs

//! One-shot benchmark commands: load a circuit, check it, run it under
//! the selected parallelism cap, print the measurements.

use std::path::Path;

use anyhow::{bail, Context, Result};
use dagcap::Graph;

/// Load a circuit, print its size, and refuse cyclic inputs.
pub fn load_checked(circuit: &Path) -> Result<Graph> {
    let graph = Graph::from_file(circuit)
        .with_context(|| format!("loading circuit {}", circuit.display()))?;

    println!("benchmark: {}", circuit.display());
    println!("num_nodes: {}", graph.num_nodes());
    println!("num_edges: {}", graph.num_edges());

    if graph.has_cycle() {
        bail!("input graph has a cycle");
    }
    Ok(graph)
}

/// Execute the graph with its original edges and no cap.
pub async fn baseline(circuit: &Path, matrix_size: usize) -> Result<()> {
    let mut graph = load_checked(circuit)?;
    let stats = graph.run_before_partition(matrix_size).await?;
    println!("runtime_before_partition: {} ms", stats.elapsed.as_millis());
    println!("peak_parallelism: {}", stats.peak_parallelism);
    Ok(())
}

/// Cluster with C-PASTA and execute at cluster granularity.
pub async fn cluster(circuit: &Path, matrix_size: usize, partition_size: usize) -> Result<()> {
    let mut graph = load_checked(circuit)?;
    graph.set_partition_size(partition_size);
    graph.partition_c_pasta()?;

    {
        let dag = graph
            .cluster_dag()
            .context("cluster DAG missing after partition")?;
        if dag.has_cycle() {
            bail!("cluster DAG has a cycle");
        }
        println!("num_clusters: {}", dag.num_clusters());
        println!("num_cluster_edges: {}", dag.num_edges());
    }

    let stats = graph.run_after_partition(matrix_size).await?;
    println!("runtime_after_partition: {} us", stats.elapsed.as_micros());
    Ok(())
}

/// Reshape into `num_streams` chains and execute the reshaped graph.
pub async fn streams(circuit: &Path, matrix_size: usize, num_streams: usize) -> Result<()> {
    let mut graph = load_checked(circuit)?;
    let stats = graph.run_stream_partition(matrix_size, num_streams).await?;
    println!("runtime_stream_partition: {} ms", stats.elapsed.as_millis());
    println!("peak_parallelism: {}", stats.peak_parallelism);
    Ok(())
}

/// Execute the original graph gated by a semaphore of capacity
/// `num_semaphore`.
pub async fn semaphore(circuit: &Path, matrix_size: usize, num_semaphore: usize) -> Result<()> {
    let mut graph = load_checked(circuit)?;
    let stats = graph.run_semaphore(matrix_size, num_semaphore).await?;
    println!("runtime_semaphore: {} ms", stats.elapsed.as_millis());
    println!("peak_parallelism: {}", stats.peak_parallelism);
    Ok(())
}
