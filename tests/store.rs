use ironreduce::Store;

#[test]
fn keys_are_kept_sorted_and_unique() {
    let mut store = Store::new(1);
    for key in ["m", "a", "z", "m", "b"] {
        store.insert(0, key, "v");
    }
    let reader = store.reader(0);
    let keys: Vec<&str> = reader.keys().collect();
    assert_eq!(keys, vec!["a", "b", "m", "z"]);
}

#[test]
fn key_order_is_byte_lexicographic() {
    let mut store = Store::new(1);
    for key in ["b", "B", "a~", "a"] {
        store.insert(0, key, "v");
    }
    let reader = store.reader(0);
    let keys: Vec<&str> = reader.keys().collect();
    // 'B' (0x42) sorts before 'a' (0x61); '~' (0x7e) after any further letter
    assert_eq!(keys, vec!["B", "a", "a~", "b"]);
}

#[test]
fn embedded_nul_bytes_order_like_any_byte() {
    let mut store = Store::new(1);
    store.insert(0, "a\0b", "v1");
    store.insert(0, "a", "v2");
    let reader = store.reader(0);
    let keys: Vec<&str> = reader.keys().collect();
    assert_eq!(keys, vec!["a", "a\0b"]);
}

#[test]
fn values_come_back_sorted_with_duplicates_retained() {
    let mut store = Store::new(1);
    for value in ["v3", "v1", "v2", "v1"] {
        store.insert(0, "k", value);
    }
    let reader = store.reader(0);
    assert_eq!(reader.get_next("k"), Some("v1"));
    assert_eq!(reader.get_next("k"), Some("v1"));
    assert_eq!(reader.get_next("k"), Some("v2"));
    assert_eq!(reader.get_next("k"), Some("v3"));
    assert_eq!(reader.get_next("k"), None);
    // exhaustion is terminal
    assert_eq!(reader.get_next("k"), None);
}

#[test]
fn unknown_key_returns_none_without_disturbing_cursors() {
    let mut store = Store::new(1);
    store.insert(0, "k", "v1");
    store.insert(0, "k", "v2");
    let reader = store.reader(0);
    assert_eq!(reader.get_next("k"), Some("v1"));
    assert_eq!(reader.get_next("missing"), None);
    assert_eq!(reader.get_next("k"), Some("v2"));
    assert_eq!(reader.get_next("missing"), None);
}

#[test]
fn pairs_land_only_in_their_partition() {
    let mut store = Store::new(3);
    store.insert(2, "k", "v");
    assert_eq!(store.partition_pair_counts(), vec![0, 0, 1]);
    assert_eq!(store.distinct_key_count(), 1);
    assert_eq!(store.reader(0).keys().count(), 0);
    assert_eq!(store.reader(1).keys().count(), 0);
    assert_eq!(store.reader(2).get_next("k"), Some("v"));
}

#[test]
fn concurrent_inserts_all_land() {
    let mut store = Store::new(2);
    std::thread::scope(|scope| {
        for thread in 0..4 {
            let store = &store;
            scope.spawn(move || {
                for i in 0..100 {
                    let key = format!("key-{}", i % 10);
                    let value = format!("v{thread}-{i:03}");
                    store.insert(i % 2, &key, &value);
                }
            });
        }
    });
    let total: usize = store.partition_pair_counts().iter().sum();
    assert_eq!(total, 400);
    // every key's values are sorted regardless of arrival interleaving
    for partition in 0..2 {
        let reader = store.reader(partition);
        let keys: Vec<String> = reader.keys().map(str::to_string).collect();
        for key in keys {
            let mut previous = String::new();
            while let Some(value) = reader.get_next(&key) {
                assert!(value >= previous.as_str());
                previous = value.to_string();
            }
        }
    }
}

#[test]
#[should_panic(expected = "at least one partition")]
fn zero_partition_store_is_refused() {
    let _ = Store::new(0);
}
