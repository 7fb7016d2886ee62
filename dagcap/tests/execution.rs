use std::time::Duration;

use dagcap::{Graph, GraphError, NodeId};

fn diamond() -> (Graph, [NodeId; 4]) {
    let mut graph = Graph::new();
    let a = graph.insert_node("A");
    let b = graph.insert_node("B");
    let c = graph.insert_node("C");
    let d = graph.insert_node("D");
    graph.insert_edge(a, c);
    graph.insert_edge(a, d);
    graph.insert_edge(b, d);
    (graph, [a, b, c, d])
}

fn parallel(n: usize) -> Graph {
    let mut graph = Graph::new();
    for i in 0..n {
        graph.insert_node(format!("p{i}"));
    }
    graph
}

#[tokio::test(flavor = "multi_thread")]
async fn baseline_run_completes_and_accumulates() {
    let (mut graph, _) = diamond();

    let stats = graph.run_before_partition(8).await.unwrap();
    assert!(stats.peak_parallelism >= 1);
    assert_eq!(graph.run_totals().before_partition(), stats.elapsed);

    let again = graph.run_before_partition(8).await.unwrap();
    assert_eq!(
        graph.run_totals().before_partition(),
        stats.elapsed + again.elapsed
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_graph_runs_instantly() {
    let mut graph = Graph::new();
    let stats = graph.run_before_partition(8).await.unwrap();
    assert_eq!(stats.elapsed, Duration::ZERO);
    assert_eq!(stats.peak_parallelism, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn semaphore_caps_concurrent_payloads() {
    // 16 independent tasks, each a decently sized multiply, so without
    // the cap they would overlap freely.
    let mut graph = parallel(16);

    let stats = graph.run_semaphore(96, 2).await.unwrap();
    assert!(
        stats.peak_parallelism <= 2,
        "observed {} concurrent payloads with 2 permits",
        stats.peak_parallelism
    );
    assert!(graph.run_totals().semaphore() > Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
async fn semaphore_with_zero_permits_is_a_config_error() {
    let (mut graph, _) = diamond();
    assert!(matches!(
        graph.run_semaphore(8, 0).await,
        Err(GraphError::Config(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn cluster_run_requires_a_partition() {
    let (mut graph, _) = diamond();
    assert!(matches!(
        graph.run_after_partition(8).await,
        Err(GraphError::Config(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn cluster_run_executes_the_cluster_dag() {
    let mut graph = Graph::new();
    let nodes: Vec<NodeId> = (0..40).map(|i| graph.insert_node(format!("n{i}"))).collect();
    for pair in nodes.windows(2) {
        graph.insert_edge(pair[0], pair[1]);
    }
    graph.set_partition_size(10);
    graph.partition_c_pasta().unwrap();

    let stats = graph.run_after_partition(8).await.unwrap();
    // A serialized cluster chain cannot overlap.
    assert_eq!(stats.peak_parallelism, 1);
    assert!(graph.run_totals().after_partition() > Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_run_partitions_then_executes() {
    let mut graph = parallel(12);

    let stats = graph.run_stream_partition(96, 3).await.unwrap();
    assert!(graph.shares_topo_order_with_original());
    // Twelve independent payloads reshaped into three chains never
    // exceed three in flight.
    assert!(
        stats.peak_parallelism <= 3,
        "observed {} concurrent payloads with 3 streams",
        stats.peak_parallelism
    );
    assert!(graph.run_totals().stream_partition() > Duration::ZERO);
}

#[tokio::test(flavor = "multi_thread")]
async fn stream_run_rejects_zero_streams() {
    let (mut graph, _) = diamond();
    assert!(matches!(
        graph.run_stream_partition(8, 0).await,
        Err(GraphError::Config(_))
    ));
}
