//! Criterion micro-benchmarks for owner construction, transfer, and release.

use std::hint::black_box;
use std::ptr::NonNull;

use criterion::{criterion_group, criterion_main, Criterion};
use custody::{make_array, make_array_for_overwrite, make_owner, UniqueOwner};
use custody_bench::{churn_resets, move_chain, Payload};
use custody_test_utils::{counted_owner, ReleaseCounter};

/// Benchmark: Box a payload into an owner and drop it.
fn bench_make_and_drop(c: &mut Criterion) {
    c.bench_function("make_and_drop", |b| {
        b.iter(|| {
            let owner = make_owner(Payload::new(black_box(7)));
            black_box(owner.checksum());
        });
    });
}

/// Benchmark: Same lifecycle through a closure deleter and a counted deleter.
fn bench_custom_deleters(c: &mut Criterion) {
    c.bench_function("closure_deleter", |b| {
        b.iter(|| {
            let free = |p: NonNull<Payload>| drop(unsafe { Box::from_raw(p.as_ptr()) });
            let ptr = NonNull::from(Box::leak(Box::new(Payload::new(1))));
            let owner = unsafe { UniqueOwner::with_deleter(Some(ptr), free) };
            black_box(owner.words[0]);
        });
    });

    let releases = ReleaseCounter::new();
    c.bench_function("counted_deleter", |b| {
        b.iter(|| {
            let owner = counted_owner(Payload::new(2), &releases);
            black_box(owner.words[0]);
        });
    });
}

/// Benchmark: Move one owner through 64 slots.
fn bench_move_chain(c: &mut Criterion) {
    c.bench_function("move_chain_64", |b| {
        b.iter(|| black_box(move_chain(black_box(5), 64)));
    });
}

/// Benchmark: Replace the held payload 1K times.
fn bench_reset_churn(c: &mut Criterion) {
    c.bench_function("reset_churn_1k", |b| {
        b.iter(|| black_box(churn_resets(black_box(1_000))));
    });
}

/// Benchmark: Default-initialised versus uninitialised 10K-element arrays.
fn bench_arrays(c: &mut Criterion) {
    c.bench_function("make_array_10k", |b| {
        b.iter(|| {
            let array = make_array::<f32>(black_box(10_000));
            black_box(array[0]);
        });
    });

    c.bench_function("make_array_for_overwrite_10k", |b| {
        b.iter(|| {
            let mut storage = make_array_for_overwrite::<f32>(black_box(10_000));
            for slot in storage.iter_mut() {
                slot.write(1.0);
            }
            let array = unsafe { storage.assume_init() };
            black_box(array[0]);
        });
    });
}

criterion_group!(
    benches,
    bench_make_and_drop,
    bench_custom_deleters,
    bench_move_chain,
    bench_reset_churn,
    bench_arrays
);
criterion_main!(benches);
