// src/exec/runner.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info};

use crate::errors::{GraphError, Result};
use crate::exec::payload;
use crate::graph::Graph;

/// Outcome of a single execution run.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    /// Wall-clock time from first dispatch to last completion.
    pub elapsed: Duration,
    /// Highest number of payloads observed executing simultaneously.
    pub peak_parallelism: usize,
}

/// Accumulated wall-clock time per execution mode, summed across every
/// run since the graph was created.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunTotals {
    before_partition: Duration,
    after_partition: Duration,
    semaphore: Duration,
    stream_partition: Duration,
}

impl RunTotals {
    pub fn before_partition(&self) -> Duration {
        self.before_partition
    }

    pub fn after_partition(&self) -> Duration {
        self.after_partition
    }

    pub fn semaphore(&self) -> Duration {
        self.semaphore
    }

    pub fn stream_partition(&self) -> Duration {
        self.stream_partition
    }
}

impl Graph {
    /// Execute the graph with the original dependency edges.
    pub async fn run_before_partition(&mut self, matrix_size: usize) -> Result<RunStats> {
        let tasks = self.primary_task_graph();
        let stats = tasks.execute(matrix_size, None).await?;
        self.totals.before_partition += stats.elapsed;
        info!(mode = "before_partition", elapsed = ?stats.elapsed, "run finished");
        Ok(stats)
    }

    /// Execute the cluster DAG produced by
    /// [`partition_c_pasta`](Graph::partition_c_pasta): one task per
    /// cluster, running the payload once per member.
    pub async fn run_after_partition(&mut self, matrix_size: usize) -> Result<RunStats> {
        let Some(clusters) = self.clusters.as_ref() else {
            return Err(GraphError::Config(
                "no cluster partition available; run partition_c_pasta first".into(),
            ));
        };

        let n = clusters.num_clusters();
        let mut tasks = TaskGraph::with_len(n);
        for c in 0..n {
            tasks.reps[c] = clusters.members(c).len();
            tasks.indegree[c] = clusters.fanins(c).count();
            tasks.dependents[c] = clusters.fanouts(c).collect();
        }

        let stats = tasks.execute(matrix_size, None).await?;
        self.totals.after_partition += stats.elapsed;
        info!(mode = "after_partition", elapsed = ?stats.elapsed, "run finished");
        Ok(stats)
    }

    /// Execute the original edges with every task additionally gated on
    /// a counting semaphore of capacity `permits`, the baseline
    /// parallelism cap the partitioners are measured against.
    pub async fn run_semaphore(&mut self, matrix_size: usize, permits: usize) -> Result<RunStats> {
        if permits == 0 {
            return Err(GraphError::Config(
                "semaphore capacity must be at least 1".into(),
            ));
        }
        let tasks = self.primary_task_graph();
        let stats = tasks.execute(matrix_size, Some(permits)).await?;
        self.totals.semaphore += stats.elapsed;
        info!(mode = "semaphore", permits, elapsed = ?stats.elapsed, "run finished");
        Ok(stats)
    }

    /// Reshape into `num_streams` chains (see
    /// [`partition_stream`](Graph::partition_stream)) and execute the
    /// reshaped adjacency.
    pub async fn run_stream_partition(
        &mut self,
        matrix_size: usize,
        num_streams: usize,
    ) -> Result<RunStats> {
        self.partition_stream(num_streams)?;
        let tasks = self.reshaped_task_graph();
        let stats = tasks.execute(matrix_size, None).await?;
        self.totals.stream_partition += stats.elapsed;
        info!(
            mode = "stream_partition",
            num_streams,
            elapsed = ?stats.elapsed,
            "run finished"
        );
        Ok(stats)
    }

    /// Accumulated runtime totals per execution mode.
    pub fn run_totals(&self) -> RunTotals {
        self.totals
    }

    fn primary_task_graph(&self) -> TaskGraph {
        let mut index_of = vec![usize::MAX; self.node_slot_capacity()];
        let slots: Vec<u32> = self.node_slots().collect();
        for (i, &slot) in slots.iter().enumerate() {
            index_of[slot as usize] = i;
        }

        let mut tasks = TaskGraph::with_len(slots.len());
        for (i, &slot) in slots.iter().enumerate() {
            tasks.indegree[i] = self.node_data(slot).in_len;
            for e in self.out_edge_slots(slot) {
                let succ = self.edge_data(e).to.index as usize;
                tasks.dependents[i].push(index_of[succ]);
            }
        }
        tasks
    }

    fn reshaped_task_graph(&self) -> TaskGraph {
        let mut index_of = vec![usize::MAX; self.node_slot_capacity()];
        let slots: Vec<u32> = self.node_slots().collect();
        for (i, &slot) in slots.iter().enumerate() {
            index_of[slot as usize] = i;
        }

        let mut tasks = TaskGraph::with_len(slots.len());
        for (i, &slot) in slots.iter().enumerate() {
            let node = self.node_data(slot);
            tasks.indegree[i] = node.reshaped_in.len();
            for succ in &node.reshaped_out {
                tasks.dependents[i].push(index_of[succ.index as usize]);
            }
        }
        tasks
    }
}

/// Dense snapshot of whichever dependency view a run executes. Taken
/// up front so the event loop below never touches the graph.
struct TaskGraph {
    /// Payload repetitions per task; cluster tasks run one per member.
    reps: Vec<usize>,
    dependents: Vec<Vec<usize>>,
    indegree: Vec<usize>,
}

impl TaskGraph {
    fn with_len(n: usize) -> Self {
        Self {
            reps: vec![1; n],
            dependents: vec![Vec::new(); n],
            indegree: vec![0; n],
        }
    }

    fn len(&self) -> usize {
        self.reps.len()
    }

    /// Event loop: dispatch every ready task, collect completions over
    /// the channel, release dependents as their last dependency
    /// finishes. The runtime contract (a task starts only after all
    /// predecessors completed, and with a permit in semaphore mode) is
    /// enforced here by the indegree counters and the semaphore.
    async fn execute(&self, matrix_size: usize, permits: Option<usize>) -> Result<RunStats> {
        let n = self.len();
        if n == 0 {
            return Ok(RunStats {
                elapsed: Duration::ZERO,
                peak_parallelism: 0,
            });
        }

        let semaphore = permits.map(|p| Arc::new(Semaphore::new(p)));
        let gauge = Arc::new(Gauge::default());
        let (tx, mut rx) = mpsc::channel::<TaskDone>(n);
        let mut indegree = self.indegree.clone();

        let started = Instant::now();
        for (i, deg) in indegree.iter().enumerate() {
            if *deg == 0 {
                self.dispatch(i, matrix_size, &tx, &semaphore, &gauge);
            }
        }

        let mut remaining = n;
        while remaining > 0 {
            let Some(done) = rx.recv().await else {
                return Err(GraphError::InvariantViolation(
                    "executor channel closed before all tasks completed".into(),
                ));
            };
            let TaskDone::Completed(done) = done else {
                return Err(GraphError::InvariantViolation(
                    "a task panicked; aborting the run".into(),
                ));
            };
            remaining -= 1;
            for &succ in &self.dependents[done] {
                indegree[succ] -= 1;
                if indegree[succ] == 0 {
                    self.dispatch(succ, matrix_size, &tx, &semaphore, &gauge);
                }
            }
        }

        Ok(RunStats {
            elapsed: started.elapsed(),
            peak_parallelism: gauge.peak.load(Ordering::Acquire),
        })
    }

    fn dispatch(
        &self,
        idx: usize,
        matrix_size: usize,
        tx: &mpsc::Sender<TaskDone>,
        semaphore: &Option<Arc<Semaphore>>,
        gauge: &Arc<Gauge>,
    ) {
        let reps = self.reps[idx];
        let tx = tx.clone();
        let semaphore = semaphore.clone();
        let gauge = Arc::clone(gauge);

        tokio::spawn(async move {
            // In semaphore mode the permit is held for the whole
            // payload: at most `permits` tasks execute at once.
            let _permit = match semaphore {
                Some(s) => match s.acquire_owned().await {
                    Ok(p) => Some(p),
                    Err(_) => return,
                },
                None => None,
            };

            let joined = tokio::task::spawn_blocking(move || {
                gauge.enter();
                for _ in 0..reps {
                    payload::matrix_multiply(matrix_size);
                }
                gauge.exit();
            })
            .await;

            let msg = match joined {
                Ok(()) => TaskDone::Completed(idx),
                Err(e) => {
                    error!(task = idx, error = %e, "task payload panicked");
                    TaskDone::Panicked
                }
            };
            let _ = tx.send(msg).await;
        });
    }
}

enum TaskDone {
    Completed(usize),
    Panicked,
}

/// Concurrency gauge wrapped around the payload so a run can report the
/// parallelism it actually reached.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::AcqRel);
    }
}
