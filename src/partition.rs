//! Key partitioning.
//!
//! A partitioner decides which of the `P` intermediate partitions an emitted
//! key belongs to. It must be a pure function of the key bytes and the
//! partition count, and must return an index strictly less than
//! `num_partitions`. Every emit of the same key routes to the same partition,
//! which is what lets each reducer own one partition outright.

/// Type of partitioner callbacks accepted by the [`Runner`](crate::Runner).
///
/// The returned index must be in `0..num_partitions`; anything else is a
/// contract violation and fails the job.
pub type PartitionFn = dyn Fn(&str, usize) -> usize + Send + Sync;

/// The default partitioner: the DJB2 string hash, reduced modulo the
/// partition count.
///
/// The recurrence is `h = h * 33 + byte` with seed `5381`, computed in
/// wrapping unsigned 64-bit arithmetic over the key's bytes. The hash is
/// bit-exact with the widely used C formulation, so partition assignments
/// are reproducible across implementations.
///
/// `num_partitions` must be at least 1.
///
/// ```
/// use ironreduce::default_hash_partition;
///
/// assert_eq!(default_hash_partition("", 1), 0);
/// assert!(default_hash_partition("quick", 4) < 4);
/// ```
#[must_use]
pub fn default_hash_partition(key: &str, num_partitions: usize) -> usize {
    let mut hash: u64 = 5381;
    for byte in key.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u64::from(byte));
    }
    (hash % num_partitions as u64) as usize
}
