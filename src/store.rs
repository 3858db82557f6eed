//! The partitioned intermediate store and the handles user callbacks see.
//!
//! This module defines:
//! - [`Store`]: `P` independent partitions, each a mutex-guarded, always-sorted
//!   sequence of key entries. Mappers insert into it concurrently; reducers
//!   later walk it without locks.
//! - [`Emitter`]: the write handle passed to mapper callbacks. `emit` hashes
//!   the key to a partition, takes that partition's lock, and performs a
//!   rank insert.
//! - [`ValueReader`]: the read handle passed to reducer callbacks. It is bound
//!   to a single partition and pops values through each key's cursor.
//!
//! # Ordering
//! Keys within a partition, and values within a key, are kept ascending under
//! byte-lexicographic order *at insertion time*. The reduce phase is therefore
//! a single linear walk with no post-barrier sort step. Duplicate values are
//! retained; keys are unique per partition.
//!
//! # Phases
//! The store is written only during the map phase and read only during the
//! reduce phase; the runner's join barrier separates the two. Read cursors are
//! initialized when an entry is created and are meaningful only after the
//! barrier, so inserts never touch them. During reduce each partition has
//! exactly one reader, which is why [`ValueReader`] needs no locking (and,
//! via its interior `Cell`, is not `Sync`).

use crate::partition::PartitionFn;
use std::cell::Cell;
use std::sync::{Arc, Mutex};

/// One distinct key within a partition: the owned key bytes, the sorted
/// multi-set of emitted values, and the read cursor.
pub(crate) struct KeyEntry {
    key: Box<str>,
    values: Vec<Box<str>>,
    /// Index of the next unread value. Only the reduce-phase reader moves it.
    cursor: Cell<usize>,
}

impl KeyEntry {
    fn new(key: &str, first_value: &str) -> Self {
        Self {
            key: key.into(),
            values: vec![first_value.into()],
            cursor: Cell::new(0),
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// Insert `value` at its rank, after any equal values already present.
    fn push_value(&mut self, value: &str) {
        let rank = self
            .values
            .partition_point(|v| v.as_bytes() <= value.as_bytes());
        self.values.insert(rank, value.into());
    }

    fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Pop the value under the cursor, if any, and advance. Once exhausted,
    /// stays exhausted.
    fn next_value(&self) -> Option<&str> {
        let at = self.cursor.get();
        let value: &str = self.values.get(at)?;
        self.cursor.set(at + 1);
        Some(value)
    }
}

#[derive(Default)]
struct Shard {
    entries: Mutex<Vec<KeyEntry>>,
}

/// The intermediate store: an array of `P` partitions, each with its own
/// mutex and sorted key sequence.
///
/// A store lives for exactly one job. The runner creates it before spawning
/// mappers, hands write access to mapper workers through [`Emitter`], hands
/// each partition to one reducer worker through [`ValueReader`], and drops
/// the whole thing once the reducers have been joined.
pub struct Store {
    shards: Box<[Shard]>,
}

impl Store {
    /// Create an empty store with `num_partitions` partitions.
    ///
    /// # Panics
    /// Panics if `num_partitions` is zero.
    #[must_use]
    pub fn new(num_partitions: usize) -> Self {
        assert!(num_partitions >= 1, "store requires at least one partition");
        Self {
            shards: (0..num_partitions).map(|_| Shard::default()).collect(),
        }
    }

    #[must_use]
    pub fn num_partitions(&self) -> usize {
        self.shards.len()
    }

    /// Insert one `(key, value)` pair into `partition`, copying both strings
    /// into store-owned memory.
    ///
    /// Takes the partition's mutex for the duration of the insert. The key is
    /// placed at (or merged into) its rank among the partition's keys; the
    /// value is placed at its rank among the key's values, keeping both
    /// sequences ascending by byte order.
    ///
    /// # Panics
    /// Panics if `partition` is out of range.
    pub fn insert(&self, partition: usize, key: &str, value: &str) {
        let mut entries = self.shards[partition].entries.lock().unwrap();
        match entries.binary_search_by(|e| e.key.as_bytes().cmp(key.as_bytes())) {
            Ok(found) => entries[found].push_value(value),
            Err(rank) => entries.insert(rank, KeyEntry::new(key, value)),
        }
    }

    /// Borrow one partition for single-threaded reading.
    ///
    /// This is the sequential counterpart of what the reducer pool does: it
    /// requires exclusive access to the whole store, which guarantees the
    /// map phase is over and no other reader exists.
    pub fn reader(&mut self, partition: usize) -> ValueReader<'_> {
        let entries = self.shards[partition].entries.get_mut().unwrap();
        ValueReader::new(entries, partition)
    }

    /// Exclusive access to every partition at once, for the reducer pool.
    /// Callable only after the map barrier, when no emitter borrow is live.
    pub(crate) fn partitions_mut(&mut self) -> Vec<&mut Vec<KeyEntry>> {
        self.shards
            .iter_mut()
            .map(|shard| shard.entries.get_mut().unwrap())
            .collect()
    }

    /// Number of distinct keys across all partitions.
    #[must_use]
    pub fn distinct_key_count(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.entries.lock().unwrap().len())
            .sum()
    }

    /// Total stored pairs per partition, in partition order.
    #[must_use]
    pub fn partition_pair_counts(&self) -> Vec<usize> {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .entries
                    .lock()
                    .unwrap()
                    .iter()
                    .map(KeyEntry::value_count)
                    .sum()
            })
            .collect()
    }
}

/// Write handle given to mapper callbacks.
///
/// `emit` may be called from any mapper worker, any number of times. Both
/// strings are copied before `emit` returns, so callers may reuse their
/// buffers. Two concurrent emits to the same partition are linearized by
/// that partition's mutex; their final positions are determined by sort
/// order, not arrival order.
pub struct Emitter<'a> {
    store: &'a Store,
    partitioner: Arc<PartitionFn>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(store: &'a Store, partitioner: Arc<PartitionFn>) -> Self {
        Self { store, partitioner }
    }

    /// Publish one `(key, value)` pair into the store.
    ///
    /// The partition is chosen by the job's partitioner. A partitioner that
    /// returns an index `>= num_partitions` violates its contract; the emit
    /// panics rather than landing the pair in a foreign partition.
    pub fn emit(&self, key: &str, value: &str) {
        let num_partitions = self.store.num_partitions();
        let partition = (self.partitioner)(key, num_partitions);
        debug_assert!(
            partition < num_partitions,
            "partitioner returned {partition} for {num_partitions} partitions"
        );
        self.store.insert(partition, key, value);
    }
}

/// Read handle given to reducer callbacks, bound to one partition.
///
/// Exactly one reader exists per partition during the reduce phase, so no
/// locking happens here; the per-key cursors live in `Cell`s, which also
/// keeps the handle from being shared across threads.
pub struct ValueReader<'a> {
    entries: &'a [KeyEntry],
    partition: usize,
}

impl<'a> ValueReader<'a> {
    pub(crate) fn new(entries: &'a [KeyEntry], partition: usize) -> Self {
        Self { entries, partition }
    }

    /// Index of the partition this reader walks.
    #[must_use]
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// The partition's distinct keys in ascending byte-lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &'a str> {
        self.entries.iter().map(KeyEntry::key)
    }

    /// Return the next unread value for `key` and advance its cursor.
    ///
    /// Values come back in ascending byte order. Returns `None` once the key
    /// is exhausted (and keeps returning `None`), or immediately if `key` was
    /// never emitted into this partition. Looking up a missing key does not
    /// disturb any other key's cursor.
    pub fn get_next(&self, key: &str) -> Option<&'a str> {
        let found = self
            .entries
            .binary_search_by(|e| e.key.as_bytes().cmp(key.as_bytes()))
            .ok()?;
        self.entries[found].next_value()
    }
}
