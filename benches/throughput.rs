//! Pull throughput for serial and parallel composition.
//!
//! Compares the three combinators end-to-end through the engine:
//! - serial append chains (inline, no workers)
//! - sequential bind chains (inline, no workers)
//! - parallel alternation (region + workers + queues)

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use braid::{pull, Stream};

fn drain_count(stream: Stream<u64>) -> usize {
    pull(stream).map(Result::unwrap).count()
}

fn bench_serial_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("serial_append");
    for size in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let stream = Stream::from_iter(0..size / 2).append(Stream::from_iter(size / 2..size));
                black_box(drain_count(stream))
            });
        });
    }
    group.finish();
}

fn bench_bind_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind_chain");
    for size in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let stream = Stream::from_iter(0..size).bind(|v| Stream::single(v * 2));
                black_box(drain_count(stream))
            });
        });
    }
    group.finish();
}

fn bench_parallel_alt(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_alt");
    for size in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let stream = Stream::from_iter(0..size / 2).alt(Stream::from_iter(size / 2..size));
                black_box(drain_count(stream))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_serial_append,
    bench_bind_chain,
    bench_parallel_alt
);
criterion_main!(benches);
