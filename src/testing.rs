//! Testing utilities for ironreduce jobs.
//!
//! This module ships the pieces needed to write idiomatic Rust tests against
//! the engine:
//!
//! - **[`OutputSink`]**: a thread-safe collector reducer. It drains every
//!   value for each delivered key and records a [`ReducedRow`], preserving
//!   per-partition delivery order so ordering guarantees can be asserted.
//! - **Assertions**: compare collected rows against expected word counts or
//!   expected per-key value sequences, with detailed panic messages.
//! - **Fixtures**: write a temp-file input corpus shaped like an argv, plus
//!   the classic word-count pair of [`tokenizing_mapper`] and
//!   [`counting_reducer`].
//!
//! ```no_run
//! use ironreduce::testing::*;
//! use ironreduce::{default_hash_partition, run};
//!
//! # fn main() -> anyhow::Result<()> {
//! let (_dir, argv) = write_input_files(&["a b a c b a"])?;
//! let sink = OutputSink::new();
//! run(&argv, tokenizing_mapper, 1, sink.reducer(), 2, default_hash_partition)?;
//! assert_counts(&sink.take_rows(), &[("a", 3), ("b", 2), ("c", 1)]);
//! # Ok(())
//! # }
//! ```

use crate::store::{Emitter, ValueReader};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One reducer invocation as observed by an [`OutputSink`]: the partition it
/// ran in, the key it was handed, and every value drained for that key, in
/// delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducedRow {
    pub partition: usize,
    pub key: String,
    pub values: Vec<String>,
}

/// A collector whose [`reducer`](OutputSink::reducer) records every reduce
/// invocation.
///
/// Rows are appended in delivery order; rows of a single partition keep the
/// order the reducer worker delivered them in, while rows from different
/// partitions may interleave.
#[derive(Default)]
pub struct OutputSink {
    rows: Arc<Mutex<Vec<ReducedRow>>>,
}

impl OutputSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reducer callback that drains `get_next` for each delivered key and
    /// records the result in this sink.
    pub fn reducer(&self) -> impl Fn(&str, &ValueReader<'_>, usize) + Sync {
        let rows = Arc::clone(&self.rows);
        move |key, reader, _partition| {
            let mut values = Vec::new();
            while let Some(value) = reader.get_next(key) {
                values.push(value.to_string());
            }
            rows.lock().unwrap().push(ReducedRow {
                partition: reader.partition(),
                key: key.to_string(),
                values,
            });
        }
    }

    /// Take every recorded row, leaving the sink empty.
    #[must_use]
    pub fn take_rows(&self) -> Vec<ReducedRow> {
        std::mem::take(&mut *self.rows.lock().unwrap())
    }

    /// Take every recorded row, sorted by `(partition, key)` for
    /// order-independent comparisons.
    #[must_use]
    pub fn take_sorted_rows(&self) -> Vec<ReducedRow> {
        let mut rows = self.take_rows();
        rows.sort_by(|a, b| (a.partition, &a.key).cmp(&(b.partition, &b.key)));
        rows
    }
}

/// Collapse rows to `(key, value_count)` pairs, sorted by key.
#[must_use]
pub fn value_counts(rows: &[ReducedRow]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = rows
        .iter()
        .map(|row| (row.key.clone(), row.values.len()))
        .collect();
    counts.sort();
    counts
}

/// Assert that the rows carry exactly the expected per-key value counts
/// (the word-count shape), irrespective of key order across partitions.
///
/// # Panics
/// Panics with both collections if the counts differ.
pub fn assert_counts(rows: &[ReducedRow], expected: &[(&str, usize)]) {
    let actual = value_counts(rows);
    let mut expected: Vec<(String, usize)> = expected
        .iter()
        .map(|(key, count)| ((*key).to_string(), *count))
        .collect();
    expected.sort();
    assert_eq!(
        actual, expected,
        "per-key value counts mismatch:\n  Expected: {expected:?}\n  Actual:   {actual:?}"
    );
}

/// Assert that `key` was delivered exactly once, with exactly `expected`
/// values in order.
///
/// # Panics
/// Panics if the key is missing, delivered more than once, or its values
/// differ from `expected`.
pub fn assert_key_values(rows: &[ReducedRow], key: &str, expected: &[&str]) {
    let matches: Vec<&ReducedRow> = rows.iter().filter(|row| row.key == key).collect();
    assert_eq!(
        matches.len(),
        1,
        "key {key:?} delivered {} times, expected exactly once:\n  Rows: {rows:?}",
        matches.len()
    );
    let actual: Vec<&str> = matches[0].values.iter().map(String::as_str).collect();
    assert_eq!(
        actual, expected,
        "values for key {key:?} mismatch:\n  Expected: {expected:?}\n  Actual:   {actual:?}"
    );
}

/// Write one temp file per entry of `contents` and return an argv-shaped
/// vector (placeholder program name at index 0, file paths after it).
///
/// The returned [`TempDir`] owns the files; keep it alive for the duration
/// of the job.
///
/// # Errors
/// Fails if the temp directory or a file cannot be created.
pub fn write_input_files(contents: &[&str]) -> Result<(TempDir, Vec<String>)> {
    let dir = tempfile::tempdir()?;
    let mut argv = vec!["ironreduce-test".to_string()];
    for (index, text) in contents.iter().enumerate() {
        let path = dir.path().join(format!("input-{index}.txt"));
        fs::write(&path, text)?;
        argv.push(path.to_string_lossy().into_owned());
    }
    Ok((dir, argv))
}

/// The classic word-count mapper: treat the input item as a file path, read
/// it, and emit `(token, "1")` for every whitespace-separated token.
///
/// # Panics
/// Panics (failing the job) if the input file cannot be read.
pub fn tokenizing_mapper(emitter: &Emitter<'_>, input: &str) {
    let text = fs::read_to_string(input).expect("readable input file");
    for token in text.split_whitespace() {
        emitter.emit(token, "1");
    }
}

/// The classic word-count reducer: drain every value for `key` and print
/// `key: count` to stdout.
///
/// Pairs with [`tokenizing_mapper`] to reproduce the canonical word-count
/// job end to end. Output lines from different partitions may interleave.
pub fn counting_reducer(key: &str, values: &ValueReader<'_>, _partition: usize) {
    let mut count = 0u64;
    while values.get_next(key).is_some() {
        count += 1;
    }
    println!("{key}: {count}");
}

/// Sample lines for word-count style tests.
#[must_use]
pub fn word_count_corpus() -> Vec<&'static str> {
    vec![
        "hello world",
        "hello rust",
        "world of data",
        "rust programming",
        "hello data world",
    ]
}
