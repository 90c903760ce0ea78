//! Worker pool lifecycle and job execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use parking_lot::Mutex;
use transcoda_lib::concurrency::{WorkerPool, WorkerPoolConfig};

#[test]
fn test_all_jobs_run_before_shutdown_returns() {
    let pool = WorkerPool::new(WorkerPoolConfig::new(4).with_queue_capacity(1)).unwrap();
    let sum = Arc::new(AtomicU64::new(0));
    for i in 1..=100 {
        let sum = Arc::clone(&sum);
        pool.enqueue(Box::new(move || {
            sum.fetch_add(i, Ordering::SeqCst);
        }))
        .unwrap();
    }
    pool.shutdown();

    assert_eq!(sum.load(Ordering::SeqCst), 5050);
    assert_eq!(pool.stats().jobs_executed, 100);
}

#[test]
fn test_jobs_run_on_named_worker_threads() {
    let pool = WorkerPool::new(WorkerPoolConfig::new(2)).unwrap();
    let names = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..10 {
        let names = Arc::clone(&names);
        pool.enqueue(Box::new(move || {
            names.lock().push(thread::current().name().map(str::to_string));
        }))
        .unwrap();
    }
    pool.shutdown();

    let names = names.lock();
    assert_eq!(names.len(), 10);
    assert!(names.iter().all(|n| n.as_deref().is_some_and(|n| n.starts_with("transcoda-worker-"))));
}

#[test]
fn test_enqueue_from_many_producers() {
    let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::new(3)).unwrap());
    let count = Arc::new(AtomicU64::new(0));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let (pool, count) = (Arc::clone(&pool), Arc::clone(&count));
            thread::spawn(move || {
                for _ in 0..50 {
                    let count = Arc::clone(&count);
                    pool.enqueue(Box::new(move || {
                        count.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }
    pool.shutdown();

    assert_eq!(count.load(Ordering::SeqCst), 200);
}
