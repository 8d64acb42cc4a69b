//! Criterion micro-benchmarks for arena allocation, scoped reuse and array growth.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use keel_arena::{Arena, LinearAllocator};
use keel_bench::block_sizes;
use keel_collections::Array;
use keel_core::{system, MAX_ALIGN};

const ARENA_BYTES: usize = 4 * 1024 * 1024;

/// Benchmark: 10K mixed-size bump allocations, then reset.
fn bench_arena_alloc_10k(c: &mut Criterion) {
    let sizes = block_sizes(10_000, 42);
    let mut arena = Arena::new(ARENA_BYTES, system()).unwrap();
    c.bench_function("arena_alloc_10k", |b| {
        b.iter(|| {
            for &size in &sizes {
                black_box(arena.alloc(size, MAX_ALIGN));
            }
            arena.reset();
        });
    });
}

/// Benchmark: the same 10K requests served by the system heap.
fn bench_system_alloc_10k(c: &mut Criterion) {
    let sizes = block_sizes(10_000, 42);
    let mut blocks = Vec::with_capacity(sizes.len());
    c.bench_function("system_alloc_10k", |b| {
        b.iter(|| {
            for &size in &sizes {
                blocks.push(system().alloc(size, MAX_ALIGN));
            }
            for block in blocks.drain(..) {
                // SAFETY: every block came from the system allocator above.
                unsafe { system().free(block) };
            }
        });
    });
}

/// Benchmark: open a linear scope, grow an array to 10K elements, close it.
fn bench_scoped_array_10k(c: &mut Criterion) {
    let arena = Arena::new(ARENA_BYTES, system()).unwrap();
    c.bench_function("scoped_array_10k", |b| {
        b.iter(|| {
            let scope = LinearAllocator::new(&arena);
            let mut array = Array::<u64>::new_in(&scope);
            array.append_values(0..10_000).unwrap();
            black_box(array.len());
        });
    });
}

/// Benchmark: grow an array to 10K elements on the system heap.
fn bench_system_array_10k(c: &mut Criterion) {
    c.bench_function("system_array_10k", |b| {
        b.iter(|| {
            let mut array = Array::<u64>::new();
            array.append_values(0..10_000).unwrap();
            black_box(array.len());
        });
    });
}

criterion_group!(
    benches,
    bench_arena_alloc_10k,
    bench_system_alloc_10k,
    bench_scoped_array_10k,
    bench_system_array_10k
);
criterion_main!(benches);
