//! The classic word count, run over file arguments:
//!
//! ```text
//! cargo run --example wordcount -- input-a.txt input-b.txt
//! ```
//!
//! Each mapper reads one file at a time and emits `(token, "1")` per
//! whitespace-separated token; each reducer drains a key's values and prints
//! the total. Output lines from different partitions may interleave, but
//! within one partition keys print in ascending order.

use anyhow::Result;
use ironreduce::{Emitter, ValueReader, default_hash_partition, run};
use std::env;
use std::fs;

fn map(emitter: &Emitter<'_>, path: &str) {
    let text = fs::read_to_string(path).expect("readable input file");
    for token in text.split_whitespace() {
        emitter.emit(token, "1");
    }
}

fn reduce(key: &str, values: &ValueReader<'_>, _partition: usize) {
    let mut count = 0u64;
    while values.get_next(key).is_some() {
        count += 1;
    }
    println!("{key}: {count}");
}

fn main() -> Result<()> {
    env_logger::init();
    let argv: Vec<String> = env::args().collect();
    run(&argv, map, 2, reduce, 2, default_hash_partition)
}
