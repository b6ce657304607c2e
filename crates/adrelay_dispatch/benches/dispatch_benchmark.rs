//! Benchmark for dispatcher enqueue/tick cost.
//!
//! TARGET: idle tick well under a microsecond, so it can run every frame
//!
//! Run with: cargo bench --package adrelay_dispatch --bench dispatch_benchmark

#![allow(missing_docs)]

use adrelay_dispatch::{Dispatcher, OwnerThread};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::hint::black_box;
use std::thread;

fn foreign_owner() -> OwnerThread {
    let handle = thread::spawn(|| {});
    let id = handle.thread().id();
    handle.join().unwrap();
    OwnerThread::from_id(id)
}

fn bench_idle_tick(c: &mut Criterion) {
    let dispatcher = Dispatcher::new();
    c.bench_function("tick_idle", |b| b.iter(|| black_box(dispatcher.tick())));
}

fn bench_owner_inline(c: &mut Criterion) {
    let dispatcher = Dispatcher::new();
    c.bench_function("enqueue_inline", |b| {
        b.iter(|| dispatcher.enqueue(|| {
            black_box(1_u64);
        }));
    });
}

fn bench_foreign_enqueue(c: &mut Criterion) {
    // Owner is a finished thread, so every enqueue from here takes the queued path.
    let mut group = c.benchmark_group("enqueue_queued");
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("1000_tasks", |b| {
        b.iter_batched(
            || Dispatcher::with_owner(foreign_owner()),
            |dispatcher| {
                for i in 0..1_000_u64 {
                    dispatcher.enqueue(move || {
                        black_box(i);
                    });
                }
                dispatcher
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_drain");
    group.throughput(Throughput::Elements(1_000));
    group.bench_function("1000_tasks", |b| {
        b.iter_batched(
            || {
                let dispatcher = Dispatcher::new();
                let producer = dispatcher.clone();
                thread::spawn(move || {
                    for i in 0..1_000_u64 {
                        producer.enqueue(move || {
                            black_box(i);
                        });
                    }
                })
                .join()
                .unwrap();
                dispatcher
            },
            |dispatcher| {
                while dispatcher.tick().ran_task() {}
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_idle_tick,
    bench_owner_inline,
    bench_foreign_enqueue,
    bench_drain
);
criterion_main!(benches);
