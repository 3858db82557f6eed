// src/runner.rs

//! The coordinator: worker pools, the phase barrier, and the job entry points.
//!
//! A job runs in two strictly ordered phases:
//! 1. **Map** — `num_mappers` worker threads, worker `j` processing input
//!    indices `j, j + M, j + 2M, …` (round-robin dealing, deterministic for a
//!    given input count and worker count). Workers publish pairs through
//!    [`Emitter`] and are joined as a hard barrier.
//! 2. **Reduce** — `num_reducers` worker threads, worker `j` owning partition
//!    `j` outright. Each walks its partition's keys in ascending order and
//!    invokes the reducer once per distinct key with a [`ValueReader`].
//!
//! Every emit happens-before every reducer invocation (the barrier), and the
//! store is created and dropped inside a single `run` call; nothing persists
//! across jobs.

use crate::partition::{PartitionFn, default_hash_partition};
use crate::store::{Emitter, Store, ValueReader};
use anyhow::{Context, Result, bail};
use log::debug;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::JobMetrics;

/// Job configuration: worker counts, the partitioner, and (optionally) a
/// metrics collector.
///
/// The partition count always equals `num_reducers`; that one-to-one
/// relationship is what lets reducers read their partition without locks.
/// `num_mappers` and `num_reducers` are independent and must each be at
/// least 1.
///
/// ```
/// use ironreduce::Runner;
///
/// let runner = Runner::new(4, 2);
/// assert_eq!(runner.num_reducers, 2);
/// ```
pub struct Runner {
    /// Number of mapper workers (M).
    pub num_mappers: usize,
    /// Number of reducer workers, and therefore partitions (R = P).
    pub num_reducers: usize,
    partitioner: Arc<PartitionFn>,
    #[cfg(feature = "metrics")]
    metrics: Option<JobMetrics>,
}

impl Default for Runner {
    /// One mapper and one reducer per available CPU, DJB2 partitioning.
    fn default() -> Self {
        let workers = num_cpus::get().max(1);
        Self::new(workers, workers)
    }
}

impl Runner {
    /// A runner with the given worker counts and the default DJB2
    /// partitioner.
    #[must_use]
    pub fn new(num_mappers: usize, num_reducers: usize) -> Self {
        Self {
            num_mappers,
            num_reducers,
            partitioner: Arc::new(default_hash_partition),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Replace the partitioner.
    ///
    /// The callback must return an index in `0..num_partitions` for every
    /// key; see [`PartitionFn`].
    #[must_use]
    pub fn with_partitioner(
        mut self,
        partitioner: impl Fn(&str, usize) -> usize + Send + Sync + 'static,
    ) -> Self {
        self.partitioner = Arc::new(partitioner);
        self
    }

    /// Attach a metrics collector. Keep a clone to inspect it after `run`.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, metrics: JobMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Execute one full map/shuffle/reduce job over `inputs` and return when
    /// both phases have completed.
    ///
    /// Each input item is handed to the mapper callback exactly once. With
    /// zero inputs no mapper call occurs and the reducers observe empty
    /// partitions. The intermediate store is fresh for this call and is
    /// dropped before returning, on success and error paths alike.
    ///
    /// # Errors
    /// Fails if a worker count is zero, if a worker thread cannot be
    /// spawned, or if a user callback panics. A panicking callback fails the
    /// whole job; the phase's remaining workers are still joined first.
    pub fn run<M, R>(&self, inputs: &[String], map_fn: M, reduce_fn: R) -> Result<()>
    where
        M: Fn(&Emitter<'_>, &str) + Sync,
        R: Fn(&str, &ValueReader<'_>, usize) + Sync,
    {
        if self.num_mappers == 0 {
            bail!("num_mappers must be at least 1");
        }
        if self.num_reducers == 0 {
            bail!("num_reducers must be at least 1");
        }

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_job_start();
        }

        let mut store = Store::new(self.num_reducers);
        debug!(
            "job start: {} inputs, {} mappers, {} reducers",
            inputs.len(),
            self.num_mappers,
            self.num_reducers
        );

        let map_started = Instant::now();
        self.run_map_phase(&store, inputs, &map_fn)?;
        let map_elapsed = map_started.elapsed();
        debug!(
            "map phase done in {map_elapsed:?}: {} pairs, {} distinct keys",
            store.partition_pair_counts().iter().sum::<usize>(),
            store.distinct_key_count()
        );

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            let per_partition = store.partition_pair_counts();
            metrics.record_phase("map", map_elapsed);
            metrics.set_counter("input_items", inputs.len() as u64);
            metrics.set_counter("pairs_emitted", per_partition.iter().sum::<usize>() as u64);
            metrics.set_counter("distinct_keys", store.distinct_key_count() as u64);
            metrics.set_counter("partitions", self.num_reducers as u64);
            metrics.record_partition_sizes(&per_partition);
        }

        let reduce_started = Instant::now();
        let reduce_result = run_reduce_phase(&mut store, &reduce_fn);
        let reduce_elapsed = reduce_started.elapsed();
        debug!("reduce phase done in {reduce_elapsed:?}");

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_phase("reduce", reduce_elapsed);
            metrics.record_job_end();
        }

        drop(store);
        reduce_result
    }

    /// Spawn the mapper pool, deal inputs round-robin, and join all workers.
    fn run_map_phase<M>(&self, store: &Store, inputs: &[String], map_fn: &M) -> Result<()>
    where
        M: Fn(&Emitter<'_>, &str) + Sync,
    {
        let stride = self.num_mappers;
        thread::scope(|scope| -> Result<()> {
            let mut workers = Vec::with_capacity(stride);
            for worker in 0..stride {
                let emitter = Emitter::new(store, Arc::clone(&self.partitioner));
                let handle = thread::Builder::new()
                    .name(format!("mapper-{worker}"))
                    .spawn_scoped(scope, move || {
                        for input in inputs.iter().skip(worker).step_by(stride) {
                            map_fn(&emitter, input.as_str());
                        }
                    })
                    .with_context(|| format!("failed to spawn mapper worker {worker}"))?;
                workers.push(handle);
            }
            join_pool(workers, "mapper")
        })
    }
}

/// Spawn one reducer per partition and join all workers.
///
/// Exclusive access to the store proves the map barrier has passed, so each
/// worker walks its partition without taking the partition mutex.
fn run_reduce_phase<R>(store: &mut Store, reduce_fn: &R) -> Result<()>
where
    R: Fn(&str, &ValueReader<'_>, usize) + Sync,
{
    thread::scope(|scope| -> Result<()> {
        let mut workers = Vec::new();
        for (partition, entries) in store.partitions_mut().into_iter().enumerate() {
            let handle = thread::Builder::new()
                .name(format!("reducer-{partition}"))
                .spawn_scoped(scope, move || {
                    let reader = ValueReader::new(entries, partition);
                    for key in reader.keys() {
                        reduce_fn(key, &reader, partition);
                    }
                })
                .with_context(|| format!("failed to spawn reducer worker {partition}"))?;
            workers.push(handle);
        }
        join_pool(workers, "reducer")
    })
}

/// Join every worker in the pool, then report the first panic (if any) as a
/// job error. Joining all handles before returning keeps the enclosing scope
/// from re-raising the panic.
fn join_pool(workers: Vec<thread::ScopedJoinHandle<'_, ()>>, role: &str) -> Result<()> {
    let mut first_panic = None;
    for (worker, handle) in workers.into_iter().enumerate() {
        if handle.join().is_err() && first_panic.is_none() {
            first_panic = Some(worker);
        }
    }
    match first_panic {
        Some(worker) => bail!("{role} worker {worker} panicked"),
        None => Ok(()),
    }
}

/// Run a full job over an argv-shaped input vector.
///
/// `argv[0]` is ignored (conventionally the program name); `argv[1..]` are
/// the input items, typically file paths. This mirrors the classic
/// `mr_run(argc, argv, …)` entry point; [`Runner`] offers the same pipeline
/// with builder-style configuration.
///
/// # Errors
/// Fails if `argv` is empty, a worker count is zero, a worker cannot be
/// spawned, or a user callback panics.
pub fn run<M, R>(
    argv: &[String],
    map_fn: M,
    num_mappers: usize,
    reduce_fn: R,
    num_reducers: usize,
    partitioner: impl Fn(&str, usize) -> usize + Send + Sync + 'static,
) -> Result<()>
where
    M: Fn(&Emitter<'_>, &str) + Sync,
    R: Fn(&str, &ValueReader<'_>, usize) + Sync,
{
    if argv.is_empty() {
        bail!("argv must contain at least the program name");
    }
    Runner::new(num_mappers, num_reducers)
        .with_partitioner(partitioner)
        .run(&argv[1..], map_fn, reduce_fn)
}
