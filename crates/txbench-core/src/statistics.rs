//! Latency statistics over per-worker samples.
//!
//! [`Statistics`] keeps every sample it was built from and derives each metric
//! on demand, so repeated queries always agree with each other. Every metric
//! is defined for the empty case and returns zero there.

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

/// Sample category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Success,
    Error,
    /// Success and error samples combined.
    Whole,
}

/// Elapsed times recorded by one worker, split by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSamples {
    success: Vec<Duration>,
    error: Vec<Duration>,
}

impl WorkerSamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            success: Vec::with_capacity(capacity),
            error: Vec::new(),
        }
    }

    pub fn from_parts(success: Vec<Duration>, error: Vec<Duration>) -> Self {
        Self { success, error }
    }

    /// Record a successful iteration, truncated to microseconds.
    pub fn record_success(&mut self, elapsed: Duration) {
        self.success.push(truncate_to_micros(elapsed));
    }

    /// Record a failed iteration, truncated to microseconds.
    pub fn record_error(&mut self, elapsed: Duration) {
        self.error.push(truncate_to_micros(elapsed));
    }

    pub fn success(&self) -> &[Duration] {
        &self.success
    }

    pub fn error(&self) -> &[Duration] {
        &self.error
    }

    pub fn len(&self) -> usize {
        self.success.len() + self.error.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn extend_into(&self, category: Category, out: &mut Vec<Duration>) {
        match category {
            Category::Success => out.extend_from_slice(&self.success),
            Category::Error => out.extend_from_slice(&self.error),
            Category::Whole => {
                out.extend_from_slice(&self.success);
                out.extend_from_slice(&self.error);
            }
        }
    }
}

fn truncate_to_micros(elapsed: Duration) -> Duration {
    Duration::from_micros(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX))
}

/// Result of one benchmark run.
#[derive(Debug, Clone)]
pub struct Statistics {
    name: String,
    threads: usize,
    workers: Vec<WorkerSamples>,
    wall_time: Duration,
}

impl Statistics {
    pub fn new(name: impl Into<String>, threads: usize, workers: Vec<WorkerSamples>) -> Self {
        Self {
            name: name.into(),
            threads,
            workers,
            wall_time: Duration::ZERO,
        }
    }

    /// Attach the wall-clock duration of the timed phase.
    pub fn with_wall_time(mut self, wall_time: Duration) -> Self {
        self.wall_time = wall_time;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn workers(&self) -> &[WorkerSamples] {
        &self.workers
    }

    pub fn wall_time(&self) -> Duration {
        self.wall_time
    }

    /// Samples of `category`, for one worker or (with `None`) all of them.
    ///
    /// An out-of-range worker index yields no samples.
    pub fn samples(&self, category: Category, worker: Option<usize>) -> Vec<Duration> {
        let mut samples = Vec::new();
        match worker {
            Some(index) => {
                if let Some(worker) = self.workers.get(index) {
                    worker.extend_into(category, &mut samples);
                }
            }
            None => {
                for worker in &self.workers {
                    worker.extend_into(category, &mut samples);
                }
            }
        }
        samples
    }

    pub fn count(&self, category: Category, worker: Option<usize>) -> usize {
        match worker {
            Some(index) => self.workers.get(index).map_or(0, |w| match category {
                Category::Success => w.success.len(),
                Category::Error => w.error.len(),
                Category::Whole => w.len(),
            }),
            None => (0..self.workers.len())
                .map(|index| self.count(category, Some(index)))
                .sum(),
        }
    }

    /// Sum of all sample durations.
    pub fn total(&self, category: Category, worker: Option<usize>) -> Duration {
        self.samples(category, worker).iter().sum()
    }

    /// Mean duration (integer microseconds), zero when there are no samples.
    pub fn average(&self, category: Category, worker: Option<usize>) -> Duration {
        let samples = self.samples(category, worker);
        if samples.is_empty() {
            return Duration::ZERO;
        }
        let total_us: u128 = samples.iter().map(Duration::as_micros).sum();
        micros(total_us / samples.len() as u128)
    }

    pub fn max(&self, category: Category, worker: Option<usize>) -> Duration {
        self.samples(category, worker)
            .into_iter()
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn min(&self, category: Category, worker: Option<usize>) -> Duration {
        self.samples(category, worker)
            .into_iter()
            .min()
            .unwrap_or(Duration::ZERO)
    }

    /// Sample at index `len / 2` after sorting (upper median for even counts).
    pub fn median(&self, category: Category, worker: Option<usize>) -> Duration {
        let mut samples = self.samples(category, worker);
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.sort_unstable();
        samples[samples.len() / 2]
    }

    /// Sample at index `floor(len * p)` after sorting, clamped to the last one.
    pub fn percentile(&self, category: Category, worker: Option<usize>, p: f64) -> Duration {
        let mut samples = self.samples(category, worker);
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.sort_unstable();
        let index = ((samples.len() as f64) * p) as usize;
        samples[index.min(samples.len() - 1)]
    }

    /// Iterations per second over the timed phase; zero if no wall time was recorded.
    pub fn throughput(&self, category: Category) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.count(category, None) as f64 / secs
    }

    /// Snapshot of every derived metric.
    pub fn summary(&self) -> Summary {
        Summary {
            name: self.name.clone(),
            threads: self.threads,
            unit: "us",
            elapsed_us: as_micros(self.wall_time),
            count: CountSummary {
                whole: self.count(Category::Whole, None),
                success: self.count(Category::Success, None),
                error: self.count(Category::Error, None),
            },
            average: self.metric(|c| self.average(c, None)),
            max: self.metric(|c| self.max(c, None)),
            min: self.metric(|c| self.min(c, None)),
            median: self.metric(|c| self.median(c, None)),
            p95: self.metric(|c| self.percentile(c, None, 0.95)),
            p99: self.metric(|c| self.percentile(c, None, 0.99)),
            throughput: ThroughputSummary {
                whole: self.throughput(Category::Whole),
                success: self.throughput(Category::Success),
            },
            workers: (0..self.workers.len())
                .map(|index| WorkerSummary {
                    worker: index,
                    success: self.count(Category::Success, Some(index)),
                    error: self.count(Category::Error, Some(index)),
                    average_us: as_micros(self.average(Category::Whole, Some(index))),
                })
                .collect(),
        }
    }

    fn metric(&self, f: impl Fn(Category) -> Duration) -> MetricSummary {
        MetricSummary {
            whole: as_micros(f(Category::Whole)),
            success: as_micros(f(Category::Success)),
            error: as_micros(f(Category::Error)),
        }
    }

    /// Render the report in the requested format.
    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.to_string(),
            ReportFormat::Json => {
                let mut json = serde_json::to_string_pretty(&self.summary())
                    .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
                json.push('\n');
                json
            }
        }
    }

    /// Write the report to `out`.
    pub fn write_report<W: Write>(&self, out: &mut W, format: ReportFormat) -> std::io::Result<()> {
        out.write_all(self.render(format).as_bytes())?;
        out.flush()
    }
}

fn micros(us: u128) -> Duration {
    Duration::from_micros(u64::try_from(us).unwrap_or(u64::MAX))
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary();
        writeln!(f, "name: {}", s.name)?;
        writeln!(f, "threads: {}", s.threads)?;
        writeln!(f, "count:")?;
        writeln!(f, "  whole: {}", s.count.whole)?;
        writeln!(f, "  success: {}", s.count.success)?;
        writeln!(f, "  error: {}", s.count.error)?;
        writeln!(f, "statistics:")?;
        writeln!(f, "  unit: {}", s.unit)?;
        for (label, metric) in [
            ("average", &s.average),
            ("max", &s.max),
            ("min", &s.min),
            ("median", &s.median),
            ("p95", &s.p95),
            ("p99", &s.p99),
        ] {
            writeln!(f, "  {label}:")?;
            writeln!(f, "    whole: {}", metric.whole)?;
            writeln!(f, "    success: {}", metric.success)?;
            writeln!(f, "    error: {}", metric.error)?;
        }
        writeln!(f, "elapsed: {}", s.elapsed_us)?;
        writeln!(f, "throughput:")?;
        writeln!(f, "  unit: iterations/s")?;
        writeln!(f, "  whole: {:.2}", s.throughput.whole)?;
        writeln!(f, "  success: {:.2}", s.throughput.success)
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Indented `key: value` text.
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown report format `{other}` (expected text or json)")),
        }
    }
}

/// Serializable view of a [`Statistics`] report. Durations are microseconds.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub name: String,
    pub threads: usize,
    pub unit: &'static str,
    pub elapsed_us: u64,
    pub count: CountSummary,
    pub average: MetricSummary,
    pub max: MetricSummary,
    pub min: MetricSummary,
    pub median: MetricSummary,
    pub p95: MetricSummary,
    pub p99: MetricSummary,
    pub throughput: ThroughputSummary,
    pub workers: Vec<WorkerSummary>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CountSummary {
    pub whole: usize,
    pub success: usize,
    pub error: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSummary {
    pub whole: u64,
    pub success: u64,
    pub error: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ThroughputSummary {
    pub whole: f64,
    pub success: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WorkerSummary {
    pub worker: usize,
    pub success: usize,
    pub error: usize,
    pub average_us: u64,
}
