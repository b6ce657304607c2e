//! Integration tests for the dispatcher's delivery guarantees.
//!
//! Run with: cargo test --package adrelay_dispatch --test dispatch_properties_test

use adrelay_dispatch::{Dispatcher, Task, TickOutcome};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_n_tasks_run_once_in_enqueue_order() {
    for n in [0_usize, 1, 2, 17, 256] {
        let dispatcher = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::with_capacity(n)));

        let producer = dispatcher.clone();
        let sink = Arc::clone(&order);
        thread::spawn(move || {
            for i in 0..n {
                let sink = Arc::clone(&sink);
                producer.enqueue(move || sink.lock().push(i));
            }
        })
        .join()
        .unwrap();

        for _ in 0..n {
            assert_eq!(dispatcher.tick(), TickOutcome::Executed);
        }
        assert_eq!(dispatcher.tick(), TickOutcome::Idle);

        let order = order.lock();
        assert_eq!(*order, (0..n).collect::<Vec<_>>());
    }
}

#[test]
fn test_owner_enqueue_completes_before_return() {
    let dispatcher = Dispatcher::new();
    let counter = Arc::new(AtomicUsize::new(0));

    for expected in 1..=5 {
        let c = Arc::clone(&counter);
        dispatcher.enqueue(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), expected);
        assert_eq!(dispatcher.pending(), 0);
    }

    assert_eq!(dispatcher.tick(), TickOutcome::Idle);
    assert_eq!(dispatcher.stats().queued, 0);
}

#[test]
fn test_faults_interleaved_with_good_tasks() {
    let dispatcher = Dispatcher::new();
    let ran = Arc::new(Mutex::new(Vec::new()));

    let producer = dispatcher.clone();
    let sink = Arc::clone(&ran);
    thread::spawn(move || {
        for i in 0..10_u32 {
            if i % 3 == 0 {
                producer.enqueue_task(Task::new(move || panic!("task {i}")).labeled("faulty"));
            } else {
                let sink = Arc::clone(&sink);
                producer.enqueue(move || sink.lock().push(i));
            }
        }
    })
    .join()
    .unwrap();

    let mut faults = 0;
    while !dispatcher.is_empty() {
        match dispatcher.tick() {
            TickOutcome::Faulted(fault) => {
                assert_eq!(fault.label(), "faulty");
                faults += 1;
            }
            TickOutcome::Executed => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(faults, 4);
    assert_eq!(*ran.lock(), vec![1, 2, 4, 5, 7, 8]);
    assert_eq!(dispatcher.stats().faulted, 4);
}

#[test]
fn test_concurrent_producers_no_loss_no_duplicates() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 500;
    const RUNS: usize = 10;

    for _ in 0..RUNS {
        let dispatcher = Dispatcher::new();
        let seen = Arc::new(Mutex::new(Vec::with_capacity(PRODUCERS * PER_PRODUCER)));
        let barrier = Arc::new(Barrier::new(PRODUCERS));

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let producer = dispatcher.clone();
                let seen = Arc::clone(&seen);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for m in 0..PER_PRODUCER {
                        let seen = Arc::clone(&seen);
                        producer.enqueue(move || seen.lock().push((p, m)));
                    }
                })
            })
            .collect();

        // Drain while producers are still pushing.
        let mut executed = 0;
        while executed < PRODUCERS * PER_PRODUCER {
            if dispatcher.tick().ran_task() {
                executed += 1;
            } else {
                thread::yield_now();
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(dispatcher.tick(), TickOutcome::Idle);

        let seen = seen.lock();
        assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
        let unique: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(unique.len(), PRODUCERS * PER_PRODUCER);

        // FIFO per producer.
        for p in 0..PRODUCERS {
            let from_p: Vec<_> = seen.iter().filter(|(q, _)| *q == p).map(|(_, m)| *m).collect();
            assert_eq!(from_p, (0..PER_PRODUCER).collect::<Vec<_>>());
        }

        let stats = dispatcher.stats();
        assert_eq!(stats.queued as usize, PRODUCERS * PER_PRODUCER);
        assert_eq!(stats.executed as usize, PRODUCERS * PER_PRODUCER);
    }
}

#[test]
fn test_foreign_enqueue_waits_for_running_task() {
    let dispatcher = Dispatcher::new();
    let started = Arc::new(Barrier::new(2));
    let finished = Arc::new(AtomicBool::new(false));

    let producer = dispatcher.clone();
    let (gate, done) = (Arc::clone(&started), Arc::clone(&finished));
    let handle = thread::spawn(move || {
        producer.enqueue(move || {
            gate.wait();
            thread::sleep(Duration::from_millis(50));
            done.store(true, Ordering::SeqCst);
        });
        // Runs on the owner thread during the tick below.
        started.wait();
        producer.enqueue(|| {});
        finished.load(Ordering::SeqCst)
    });

    // Wait for the first enqueue to land before ticking.
    while dispatcher.pending() == 0 {
        thread::yield_now();
    }
    assert_eq!(dispatcher.tick(), TickOutcome::Executed);

    let task_done_before_enqueue_returned = handle.join().unwrap();
    assert!(task_done_before_enqueue_returned);
    assert_eq!(dispatcher.pending(), 1);
}

#[test]
fn test_empty_tick_is_cheap() {
    let dispatcher = Dispatcher::new();
    let start = Instant::now();
    for _ in 0..100_000 {
        assert_eq!(dispatcher.tick(), TickOutcome::Idle);
    }
    let elapsed = start.elapsed();

    println!("100k idle ticks: {elapsed:?}");
    assert!(elapsed.as_secs() < 5, "idle ticks too slow: {elapsed:?}");
}

#[test]
fn test_dropping_dispatcher_discards_pending() {
    let dispatcher = Dispatcher::new();
    let ran = Arc::new(AtomicUsize::new(0));

    let producer = dispatcher.clone();
    let counter = Arc::clone(&ran);
    thread::spawn(move || {
        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            producer.enqueue(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
    })
    .join()
    .unwrap();

    assert_eq!(dispatcher.pending(), 3);
    drop(dispatcher);

    assert_eq!(ran.load(Ordering::SeqCst), 0);
    // The queued closures were the only other owners of the counter.
    assert_eq!(Arc::strong_count(&ran), 1);
}
