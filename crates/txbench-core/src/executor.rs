//! Synchronized multi-worker executor.
//!
//! A run goes through five phases:
//!
//! 1. The coordinator renders every worker's iterations up front. Template
//!    errors abort the run here, before any thread exists.
//! 2. The coordinator closes the [`StartGate`] and spawns one thread per
//!    worker.
//! 3. Each worker opens its own connection and signals arrival. A worker
//!    that cannot connect still signals arrival and contributes no samples.
//! 4. Once every worker has arrived, the coordinator opens the gate. With a
//!    start timeout configured, it gives up after that long and reports the
//!    workers that never arrived.
//! 5. Workers run their iterations, timing each one, and hand their samples
//!    back through `join`.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::RwLockWriteGuard;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Connection};
use crate::error::{BenchError, BenchResult};
use crate::gate::StartGate;
use crate::properties::Properties;
use crate::statistics::{Category, Statistics, WorkerSamples};
use crate::workload::Workload;

/// Rendered queries of one worker: `count` iterations, each a list of
/// statements.
type Iterations = Vec<Vec<String>>;

/// Executor tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// How often the coordinator checks the arrival counter (default: 100ms).
    pub poll_interval: Duration,

    /// Upper bound on the wait for workers to arrive (default: 60s).
    /// `None` waits until every worker has arrived.
    pub start_timeout: Option<Duration>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            start_timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// Runs a [`Workload`] against a [`Backend`].
pub struct Executor {
    backend: Arc<dyn Backend>,
    options: ExecutorOptions,
}

impl Executor {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_options(backend, ExecutorOptions::default())
    }

    pub fn with_options(backend: Arc<dyn Backend>, options: ExecutorOptions) -> Self {
        Self { backend, options }
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Run the workload and collect per-worker samples.
    ///
    /// Only configuration problems fail the run: invalid workload, template
    /// errors, workers missing the start gate, or a panicked worker.
    /// Connection and statement failures show up as error samples.
    pub fn execute(&self, workload: &Workload, properties: &Properties) -> BenchResult<Statistics> {
        workload.validate()?;
        let threads = workload.threads();

        info!(
            workload = %workload.name(),
            backend = %self.backend.name(),
            threads,
            count = workload.count(),
            "starting benchmark"
        );

        let mut rendered = Vec::with_capacity(threads);
        for _ in 0..threads {
            rendered.push(workload.render_all()?);
        }
        debug!(threads, "rendered iterations for all workers");

        let gate = Arc::new(StartGate::new(threads));
        let properties = Arc::new(properties.clone());

        let hold = gate.close();
        let mut handles = Vec::with_capacity(threads);
        for (index, iterations) in rendered.into_iter().enumerate() {
            match spawn_worker(index, &gate, &self.backend, &properties, iterations) {
                Ok(handle) => handles.push((index, handle)),
                Err(e) => {
                    abort_start(&gate, hold, handles)?;
                    return Err(BenchError::internal(format!(
                        "failed to spawn worker {index}: {e}"
                    )));
                }
            }
        }

        let ready = gate.wait_for_arrivals(self.options.poll_interval, self.options.start_timeout);
        if let Err(missing) = ready {
            warn!(?missing, "workers did not reach the start gate, aborting run");
            // Workers that never arrived are left detached; they exit as soon
            // as they reach the aborted gate.
            let arrived = handles
                .into_iter()
                .filter(|(index, _)| !missing.contains(index));
            abort_start(&gate, hold, arrived)?;
            return Err(BenchError::StartTimeout { missing });
        }

        info!(threads, "all workers ready, opening start gate");
        let started = Instant::now();
        drop(hold);

        let workers = join_all(handles)?;
        let wall_time = started.elapsed();

        let statistics =
            Statistics::new(workload.name(), threads, workers).with_wall_time(wall_time);
        info!(
            success = statistics.count(Category::Success, None),
            error = statistics.count(Category::Error, None),
            elapsed_ms = wall_time.as_millis() as u64,
            "benchmark finished"
        );
        Ok(statistics)
    }
}

fn spawn_worker(
    index: usize,
    gate: &Arc<StartGate>,
    backend: &Arc<dyn Backend>,
    properties: &Arc<Properties>,
    iterations: Iterations,
) -> io::Result<JoinHandle<WorkerSamples>> {
    let worker_gate = Arc::clone(gate);
    let backend = Arc::clone(backend);
    let properties = Arc::clone(properties);
    thread::Builder::new()
        .name(format!("txbench-worker-{index}"))
        .spawn(move || {
            run_worker(index, &worker_gate, backend.as_ref(), &properties, iterations)
        })
}

/// Abort the run, open the gate and join `handles`. Workers waiting at the
/// gate leave without running their loop.
fn abort_start(
    gate: &StartGate,
    hold: RwLockWriteGuard<'_, ()>,
    handles: impl IntoIterator<Item = (usize, JoinHandle<WorkerSamples>)>,
) -> BenchResult<Vec<WorkerSamples>> {
    gate.abort();
    drop(hold);
    join_all(handles)
}

fn join_all(
    handles: impl IntoIterator<Item = (usize, JoinHandle<WorkerSamples>)>,
) -> BenchResult<Vec<WorkerSamples>> {
    let mut workers = Vec::new();
    for (worker, handle) in handles {
        let samples = handle
            .join()
            .map_err(|_| BenchError::WorkerPanicked { worker })?;
        workers.push(samples);
    }
    Ok(workers)
}

fn run_worker(
    index: usize,
    gate: &StartGate,
    backend: &dyn Backend,
    properties: &Properties,
    iterations: Iterations,
) -> WorkerSamples {
    let mut ticket = gate.ticket(index);

    let mut connection = match backend.connect(properties) {
        Ok(connection) => connection,
        Err(e) => {
            warn!(worker = index, error = %e, "worker failed to connect");
            return WorkerSamples::new();
        }
    };
    debug!(worker = index, "worker connected");

    let Some(_hold) = ticket.arrive() else {
        debug!(worker = index, "run aborted before start");
        return WorkerSamples::new();
    };

    let mut samples = WorkerSamples::with_capacity(iterations.len());
    for queries in &iterations {
        let started = Instant::now();
        let outcome = run_iteration(connection.as_mut(), queries);
        let elapsed = started.elapsed();
        match outcome {
            Ok(()) => samples.record_success(elapsed),
            Err(e) => {
                debug!(worker = index, error = %e, "iteration failed");
                samples.record_error(elapsed);
            }
        }
    }

    debug!(
        worker = index,
        success = samples.success().len(),
        error = samples.error().len(),
        "worker finished"
    );
    samples
}

/// Execute statements in order, stopping at the first failure.
fn run_iteration(connection: &mut dyn Connection, queries: &[String]) -> BenchResult<()> {
    queries.iter().try_for_each(|query| connection.execute(query))
}
