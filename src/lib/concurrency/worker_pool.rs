//! Bounded job queue drained by a fixed set of worker threads.
//!
//! Producers call [`WorkerPool::enqueue`], which blocks while the queue holds
//! `queue_capacity` jobs that no worker has started yet. Workers take jobs in FIFO
//! order and run them outside any lock. A job that panics is caught at the job
//! boundary and logged; the worker thread survives and moves on.
//!
//! A pool configured with zero threads runs every job inline on the enqueuing
//! thread, which gives a deterministic single-threaded mode with identical
//! ordering and failure semantics.

use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};
use log::{debug, error};
use parking_lot::Mutex;

use super::extract_panic_message;
use crate::errors::{PipelineError, Result};
use crate::validation::validate_positive;

/// A unit of executable work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Default number of jobs that may wait in the queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 2;

/// Worker pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Number of worker threads; zero runs jobs inline on the caller.
    pub threads: usize,
    /// Maximum number of queued, not yet started jobs.
    pub queue_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        let threads = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self { threads, queue_capacity: DEFAULT_QUEUE_CAPACITY }
    }
}

impl WorkerPoolConfig {
    /// A config with `threads` workers and the default queue capacity.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        Self { threads, queue_capacity: DEFAULT_QUEUE_CAPACITY }
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// # Errors
    ///
    /// Returns an error if `queue_capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.queue_capacity, "queue-capacity")
    }
}

/// Snapshot of the pool's job counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPoolStats {
    /// Number of worker threads (zero in inline mode).
    pub threads: usize,
    /// Jobs that ran to completion or panicked.
    pub jobs_executed: u64,
    /// Jobs that panicked.
    pub jobs_panicked: u64,
    /// Jobs queued but not yet picked up by a worker.
    pub queued: usize,
}

#[derive(Debug, Default)]
struct JobCounters {
    executed: AtomicU64,
    panicked: AtomicU64,
}

impl JobCounters {
    fn run(&self, job: Job) {
        if let Err(panic_info) = catch_unwind(AssertUnwindSafe(job)) {
            self.panicked.fetch_add(1, Ordering::Relaxed);
            error!(
                "Job panicked on {}: {}",
                thread::current().name().unwrap_or("caller"),
                extract_panic_message(panic_info.as_ref())
            );
        }
        self.executed.fetch_add(1, Ordering::Relaxed);
    }
}

/// A fixed-size pool of worker threads fed through a bounded FIFO queue.
///
/// The pool is meant to be shared (`Arc<WorkerPool>`) by every stage that runs on
/// it. Dropping the last handle shuts the pool down, finishing all queued jobs.
pub struct WorkerPool {
    config: WorkerPoolConfig,
    /// `None` in inline mode and after shutdown.
    sender: Mutex<Option<Sender<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<JobCounters>,
    shut_down: AtomicBool,
}

impl WorkerPool {
    /// Validate `config` and spawn the worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or a thread cannot be spawned.
    pub fn new(config: WorkerPoolConfig) -> Result<Self> {
        config.validate()?;
        let counters = Arc::new(JobCounters::default());

        if config.threads == 0 {
            debug!("Worker pool running jobs inline");
            return Ok(Self {
                config,
                sender: Mutex::new(None),
                handles: Mutex::new(Vec::new()),
                counters,
                shut_down: AtomicBool::new(false),
            });
        }

        let (tx, rx) = bounded::<Job>(config.queue_capacity);
        let handles = spawn_workers(config.threads, &rx, &counters)?;
        debug!(
            "Started worker pool with {} threads and queue capacity {}",
            config.threads, config.queue_capacity
        );

        Ok(Self {
            config,
            sender: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
            counters,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Queue `job` for execution, blocking while the queue is full.
    ///
    /// In inline mode the job runs before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::PoolShutDown`] once [`shutdown`](Self::shutdown) was called.
    pub fn enqueue(&self, job: Job) -> Result<()> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(PipelineError::PoolShutDown);
        }
        if self.is_inline() {
            self.counters.run(job);
            return Ok(());
        }

        // Clone the sender so a blocked send does not hold the lock.
        let sender = self.sender.lock().clone().ok_or(PipelineError::PoolShutDown)?;
        sender.send(job).map_err(|_| PipelineError::PoolShutDown)
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.config.threads
    }

    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.config.threads == 0
    }

    #[must_use]
    pub fn stats(&self) -> WorkerPoolStats {
        WorkerPoolStats {
            threads: self.config.threads,
            jobs_executed: self.counters.executed.load(Ordering::Relaxed),
            jobs_panicked: self.counters.panicked.load(Ordering::Relaxed),
            queued: self.sender.lock().as_ref().map_or(0, Sender::len),
        }
    }

    /// Stop accepting jobs, let the workers finish every queued job, and join them.
    ///
    /// Calling this more than once is harmless. When called from one of the pool's
    /// own workers, that worker is not joined.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        // Workers exit once the queue is empty and every sender is gone.
        drop(self.sender.lock().take());

        let handles = std::mem::take(&mut *self.handles.lock());
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                error!("Worker thread exited abnormally");
            }
        }

        let stats = self.stats();
        debug!(
            "Worker pool shut down: {} jobs executed, {} panicked",
            stats.jobs_executed, stats.jobs_panicked
        );
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_workers(
    threads: usize,
    rx: &Receiver<Job>,
    counters: &Arc<JobCounters>,
) -> Result<Vec<JoinHandle<()>>> {
    (0..threads)
        .map(|thread_id| {
            let rx = rx.clone();
            let counters = Arc::clone(counters);
            thread::Builder::new()
                .name(format!("transcoda-worker-{thread_id}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        counters.run(job);
                    }
                })
                .map_err(PipelineError::from)
        })
        .collect()
}
