//! Job metrics collection and reporting.
//!
//! The metrics module tracks what a job actually did: how many input items
//! were mapped, how many pairs landed in the intermediate store, how the
//! pairs spread across partitions, and how long each phase took. Counters
//! are derived from the store after the map barrier rather than incremented
//! on the emit hot path, so enabling metrics adds no lock traffic to `emit`.
//!
//! Attach a [`JobMetrics`] to a [`Runner`](crate::Runner) with
//! `with_metrics`, keep a clone, and inspect it once `run` returns:
//!
//! ```no_run
//! use ironreduce::metrics::JobMetrics;
//! use ironreduce::{Emitter, Runner, ValueReader};
//!
//! # fn main() -> anyhow::Result<()> {
//! let metrics = JobMetrics::new();
//! let runner = Runner::new(2, 2).with_metrics(metrics.clone());
//!
//! let inputs = vec!["a b a".to_string()];
//! runner.run(
//!     &inputs,
//!     |emitter: &Emitter<'_>, line: &str| {
//!         for word in line.split_whitespace() {
//!             emitter.emit(word, "1");
//!         }
//!     },
//!     |key: &str, values: &ValueReader<'_>, _partition: usize| {
//!         while values.get_next(key).is_some() {}
//!     },
//! )?;
//!
//! metrics.print();
//! metrics.save_to_file("job_metrics.json")?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Interface for user-defined metrics registered alongside the built-ins.
pub trait Metric: Send + Sync {
    /// Metric name, used as the JSON key (e.g. `bytes_read`).
    fn name(&self) -> &str;

    /// Current value as a JSON value.
    fn value(&self) -> Value;

    /// Optional one-line description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }
}

#[derive(Default)]
struct JobMetricsInner {
    counters: BTreeMap<String, u64>,
    phases: Vec<(String, Duration)>,
    partition_pairs: Vec<u64>,
    custom: Vec<Box<dyn Metric>>,
    started: Option<Instant>,
    finished: Option<Instant>,
}

/// Thread-safe collector for one job's execution statistics.
///
/// Cloning is cheap and clones share state, so keep one clone to read after
/// handing another to the runner. A collector may be reused across jobs;
/// counters and timings are overwritten by the next run.
#[derive(Clone, Default)]
pub struct JobMetrics {
    inner: Arc<Mutex<JobMetricsInner>>,
}

impl JobMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the job as started. Called by the runner before the map phase.
    pub fn record_job_start(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.started = Some(Instant::now());
        inner.finished = None;
        inner.phases.clear();
    }

    /// Mark the job as finished. Called by the runner after the reduce join.
    pub fn record_job_end(&self) {
        self.inner.lock().unwrap().finished = Some(Instant::now());
    }

    /// Wall time between job start and end, if both were recorded.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.inner.lock().unwrap();
        match (inner.started, inner.finished) {
            (Some(started), Some(finished)) => Some(finished.duration_since(started)),
            _ => None,
        }
    }

    /// Record how long a phase (`"map"`, `"reduce"`) took.
    pub fn record_phase(&self, name: &str, elapsed: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.phases.retain(|(n, _)| n != name);
        inner.phases.push((name.to_string(), elapsed));
    }

    /// Duration of a recorded phase, by name.
    #[must_use]
    pub fn phase(&self, name: &str) -> Option<Duration> {
        self.inner
            .lock()
            .unwrap()
            .phases
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| *d)
    }

    /// Set a named counter, replacing any previous value.
    pub fn set_counter(&self, name: &str, value: u64) {
        self.inner
            .lock()
            .unwrap()
            .counters
            .insert(name.to_string(), value);
    }

    /// Add to a named counter, creating it at zero if absent.
    pub fn increment_counter(&self, name: &str, by: u64) {
        *self
            .inner
            .lock()
            .unwrap()
            .counters
            .entry(name.to_string())
            .or_insert(0) += by;
    }

    /// Read a named counter.
    #[must_use]
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.inner.lock().unwrap().counters.get(name).copied()
    }

    /// Record the per-partition pair counts observed after the map barrier.
    pub fn record_partition_sizes(&self, pairs_per_partition: &[usize]) {
        self.inner.lock().unwrap().partition_pairs =
            pairs_per_partition.iter().map(|&n| n as u64).collect();
    }

    /// Summary statistics over the recorded partition sizes, if any.
    #[must_use]
    pub fn partition_stats(&self) -> Option<PartitionStats> {
        let inner = self.inner.lock().unwrap();
        PartitionStats::from_sizes(&inner.partition_pairs)
    }

    /// Register a user-defined metric to be included in reports.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.inner.lock().unwrap().custom.push(metric);
    }

    /// All recorded metrics as one JSON object.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_json(&self) -> Value {
        let inner = self.inner.lock().unwrap();
        let mut root = serde_json::Map::new();

        for (name, value) in &inner.counters {
            root.insert(name.clone(), json!(value));
        }
        for (name, elapsed) in &inner.phases {
            root.insert(format!("{name}_phase_ms"), json!(elapsed.as_millis() as u64));
        }
        if let Some(stats) = PartitionStats::from_sizes(&inner.partition_pairs) {
            root.insert(
                "partition_pairs".to_string(),
                json!({
                    "min": stats.min,
                    "max": stats.max,
                    "mean": stats.mean,
                }),
            );
        }
        if let (Some(started), Some(finished)) = (inner.started, inner.finished) {
            let elapsed = finished.duration_since(started);
            root.insert("execution_time_ms".to_string(), json!(elapsed.as_millis() as u64));
        }
        for metric in &inner.custom {
            let mut entry = serde_json::Map::new();
            entry.insert("value".to_string(), metric.value());
            if let Some(description) = metric.description() {
                entry.insert("description".to_string(), json!(description));
            }
            root.insert(metric.name().to_string(), Value::Object(entry));
        }
        Value::Object(root)
    }

    /// Print a human-readable report to stdout.
    pub fn print(&self) {
        println!("\n========== Job Metrics ==========");
        if let Some(elapsed) = self.elapsed() {
            println!(
                "Execution Time: {:.3}s ({} ms)",
                elapsed.as_secs_f64(),
                elapsed.as_millis()
            );
            println!("---------------------------------");
        }

        let inner = self.inner.lock().unwrap();
        for (name, value) in &inner.counters {
            println!("{name}: {value}");
        }
        for (name, elapsed) in &inner.phases {
            println!("{name} phase: {elapsed:?}");
        }
        if let Some(stats) = PartitionStats::from_sizes(&inner.partition_pairs) {
            println!(
                "partition pairs: min {} / max {} / mean {:.1}",
                stats.min, stats.max, stats.mean
            );
        }
        for metric in &inner.custom {
            match metric.description() {
                Some(description) => {
                    println!("{}: {} ({description})", metric.name(), metric.value());
                }
                None => println!("{}: {}", metric.name(), metric.value()),
            }
        }
        drop(inner);
        println!("=================================\n");
    }

    /// Save all metrics to a JSON file.
    ///
    /// # Errors
    /// Fails if the file cannot be created or written.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}

/// Distribution summary of pairs across partitions, a quick read on
/// partitioner skew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionStats {
    pub partitions: usize,
    pub total_pairs: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

impl PartitionStats {
    #[allow(clippy::cast_precision_loss)]
    fn from_sizes(sizes: &[u64]) -> Option<Self> {
        if sizes.is_empty() {
            return None;
        }
        let total: u64 = sizes.iter().sum();
        Some(Self {
            partitions: sizes.len(),
            total_pairs: total,
            min: *sizes.iter().min().expect("non-empty"),
            max: *sizes.iter().max().expect("non-empty"),
            mean: total as f64 / sizes.len() as f64,
        })
    }
}
