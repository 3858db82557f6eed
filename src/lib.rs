//! # Ironreduce
//!
//! A **shared-memory MapReduce execution engine** for Rust. Ironreduce takes a
//! user-supplied mapping function, a reducing function, and a partitioner,
//! runs them in parallel over a list of input items, and delivers each
//! distinct key — together with its accumulated values — to exactly one
//! reducer invocation.
//!
//! It is an in-process realization of the two-phase Map/Shuffle/Reduce
//! pattern: a teaching-scale engine with real concurrency, not a distributed
//! system.
//!
//! ## Key Features
//!
//! - **Two-phase worker pools** - M mapper threads, a hard join barrier, then
//!   one reducer thread per partition
//! - **Always-sorted intermediate store** - keys and values are kept in byte
//!   order at insertion time, so the reduce phase is a single linear walk
//! - **Lock-striped emit path** - one mutex per partition bounds contention
//!   among concurrent mappers
//! - **Lock-free reduce reads** - each reducer owns its partition outright
//! - **Pluggable partitioning** - bit-exact DJB2 by default, any
//!   `Fn(&str, usize) -> usize` accepted
//! - **Metrics** - per-phase timings, pair/key counters, and partition skew
//!   stats (feature: `metrics`, enabled by default)
//! - **Testing utilities** - collector reducers, assertions, and temp-file
//!   input fixtures in the [`testing`] module
//!
//! ## Quick Start
//!
//! Input items are opaque strings; conventionally they are file paths, but
//! the engine never opens them — only the mapper does. Here the inputs are
//! the data itself:
//!
//! ```
//! use ironreduce::{Emitter, Runner, ValueReader};
//! use std::sync::Mutex;
//!
//! # fn main() -> anyhow::Result<()> {
//! let counts = Mutex::new(Vec::new());
//! let inputs: Vec<String> = vec!["the quick brown the".into(), "quick the".into()];
//!
//! Runner::new(2, 2).run(
//!     &inputs,
//!     |emitter: &Emitter<'_>, line: &str| {
//!         for word in line.split_whitespace() {
//!             emitter.emit(word, "1");
//!         }
//!     },
//!     |key: &str, values: &ValueReader<'_>, _partition: usize| {
//!         let mut n = 0;
//!         while values.get_next(key).is_some() {
//!             n += 1;
//!         }
//!         counts.lock().unwrap().push((key.to_string(), n));
//!     },
//! )?;
//!
//! let mut counts = counts.into_inner().unwrap();
//! counts.sort();
//! assert_eq!(
//!     counts,
//!     vec![
//!         ("brown".to_string(), 1),
//!         ("quick".to_string(), 2),
//!         ("the".to_string(), 3),
//!     ]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### `Runner`
//!
//! A [`Runner`] holds the job configuration: `num_mappers`, `num_reducers`
//! (which is also the partition count), the partitioner, and optionally a
//! metrics collector. `Runner::run` executes one complete job; every call
//! builds a fresh intermediate store and tears it down before returning.
//! The free function [`run`] offers the same pipeline with the classic
//! argv-shaped calling convention (index 0 ignored).
//!
//! ### `Emitter`
//!
//! The write handle passed to mapper callbacks. [`Emitter::emit`] hashes the
//! key to a partition, takes that partition's lock, and inserts the pair at
//! its sorted rank. Both strings are copied before `emit` returns.
//!
//! ### `ValueReader`
//!
//! The read handle passed to reducer callbacks, bound to the reducer's own
//! partition. Keys arrive in ascending byte-lexicographic order, once each;
//! [`ValueReader::get_next`] pops that key's values in ascending order and
//! returns `None` on exhaustion (or immediately for a key that was never
//! emitted).
//!
//! ### Partitions
//!
//! Every emitted key is routed by `partitioner(key, P)` where
//! `P == num_reducers`. The default is [`default_hash_partition`], the DJB2
//! hash (`h = h * 33 + byte`, seed 5381, wrapping u64), bit-exact with the
//! classic C formulation so partition assignments reproduce across
//! implementations.
//!
//! ## Guarantees
//!
//! - Every emit happens-before every reducer invocation (hard barrier
//!   between phases).
//! - Each emitted pair is delivered exactly once, in its key's partition.
//! - Within a partition, keys are delivered in strictly ascending byte
//!   order; within a key, values arrive in ascending byte order with
//!   duplicates retained. Across partitions there is no ordering.
//! - The reducer runs at most once per `(partition, key)` pair.
//!
//! There is no cancellation and no tolerance of failing user callbacks: a
//! panicking mapper or reducer fails the whole job.
//!
//! ## Word Count Over Files
//!
//! The [`testing`] module ships the classic fixtures:
//!
//! ```no_run
//! use ironreduce::testing::*;
//! use ironreduce::{default_hash_partition, run};
//!
//! # fn main() -> anyhow::Result<()> {
//! let (_dir, argv) = write_input_files(&["a b a c b a", "b c"])?;
//! let sink = OutputSink::new();
//! run(&argv, tokenizing_mapper, 2, sink.reducer(), 2, default_hash_partition)?;
//! assert_counts(&sink.take_rows(), &[("a", 3), ("b", 3), ("c", 2)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`runner`] - the coordinator: worker pools, barrier, entry points
//! - [`store`] - the partitioned intermediate store and the
//!   [`Emitter`]/[`ValueReader`] handles
//! - [`partition`] - the partitioner contract and the default DJB2 hash
//! - [`metrics`] - job metrics collection and reporting (feature: `metrics`)
//! - [`testing`] - collector reducers, assertions, and input fixtures

pub mod partition;
pub mod runner;
pub mod store;
pub mod testing;

#[cfg(feature = "metrics")]
pub mod metrics;

// General re-exports
pub use partition::{PartitionFn, default_hash_partition};
pub use runner::{Runner, run};
pub use store::{Emitter, Store, ValueReader};

// Gated re-exports
#[cfg(feature = "metrics")]
pub use metrics::JobMetrics;
