//! Gauge Example Benchmarks
//!
//! This example demonstrates gauge features and serves as a template for
//! creating your own benchmark suite.
//!
//! Run with:
//!   cargo run --example benchmarks                         # Run all benchmarks
//!   cargo run --example benchmarks -- --duration 100ms     # Shorter target
//!   cargo run --example benchmarks -- --format json        # JSON report
//!   cargo run --example benchmarks -- list                 # List benchmarks
//!   cargo run --example benchmarks -- hashmap              # Only names matching /hashmap/

use gauge::prelude::*;
use std::collections::HashMap;
use std::hint::black_box;

fn main() -> anyhow::Result<()> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let mut session = Session::new();

    // ========================================================================
    // Basic Benchmarks
    // ========================================================================

    session.register(
        "addition",
        Work::sync(|t| {
            let (x, y) = (42u64, 17u64);
            t.iter(|| black_box(black_box(x) + black_box(y)));
        }),
    )?;

    let data: Vec<i64> = (0..1000).collect();
    session.register(
        "vector_sum",
        Work::sync(move |t| t.iter(|| black_box(data.iter().sum::<i64>()))),
    )?;

    // ========================================================================
    // Setup outside the timer
    // ========================================================================

    session.register(
        "hashmap_lookup",
        Work::sync(|t| {
            t.stop_timer();
            let map: HashMap<u64, u64> = (0..10_000).map(|i| (i, i * 2)).collect();
            t.start_timer();
            t.iter(|| black_box(map.get(&black_box(4_242))));
        }),
    )?;

    // ========================================================================
    // Throughput
    // ========================================================================

    let src = vec![7u8; 64 * 1024];
    session.register(
        "memcpy_64k",
        Work::sync(move |t| {
            let mut dst = vec![0u8; src.len()];
            t.reset_timer();
            t.set_bytes(src.len() as u64);
            t.iter(|| {
                dst.copy_from_slice(black_box(&src));
                black_box(&dst);
            });
        }),
    )?;

    // ========================================================================
    // Asynchronous completion
    // ========================================================================

    session.register(
        "tokio_spawn",
        Work::asynchronous(move |_, done| {
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(done);
            });
        }),
    )?;

    // ========================================================================
    // Failure is isolated to one benchmark
    // ========================================================================

    session.register(
        "out_of_bounds",
        Work::sync(|t| {
            let v: Vec<u8> = Vec::new();
            t.iter(|| black_box(v[black_box(3)]));
        }),
    )?;

    gauge::run_with_completions(session, rx)
}
