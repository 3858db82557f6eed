use ironreduce::default_hash_partition;

#[test]
fn empty_key_single_partition_is_zero() {
    assert_eq!(default_hash_partition("", 1), 0);
}

#[test]
fn empty_key_hash_is_the_seed() {
    assert_eq!(default_hash_partition("", 1 << 32), 5381);
}

#[test]
fn abc_matches_the_reference_value() {
    assert_eq!(default_hash_partition("abc", 1 << 32), 193_485_963);
}

#[test]
fn recurrence_is_bit_exact() {
    let by_hand = ((5381u64 * 33 + u64::from(b'a')) * 33 + u64::from(b'b')) * 33 + u64::from(b'c');
    assert_eq!(
        default_hash_partition("abc", 1 << 32) as u64,
        by_hand % (1u64 << 32)
    );
}

#[test]
fn results_stay_in_range() {
    for partitions in [1usize, 2, 3, 7, 16, 1024] {
        for key in ["", "a", "abc", "the quick brown fox", "k\0v", "日本語"] {
            assert!(default_hash_partition(key, partitions) < partitions);
        }
    }
}

#[test]
fn same_key_always_lands_in_the_same_partition() {
    for key in ["x", "yy", "zzz", "word"] {
        let first = default_hash_partition(key, 8);
        for _ in 0..10 {
            assert_eq!(default_hash_partition(key, 8), first);
        }
    }
}

#[test]
fn long_keys_wrap_without_panicking() {
    let key = "x".repeat(1000);
    assert!(default_hash_partition(&key, 13) < 13);
}
