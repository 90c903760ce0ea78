//! Order-preserving parallel stage.
//!
//! [`OrderedStage`] runs an expensive, stateful [`Processor`] on a shared
//! [`WorkerPool`] while keeping the stage's observable behavior identical to running
//! a single instance sequentially:
//!
//! 1. [`submit`](OrderedStage::submit) numbers each unit (0, 1, 2, ...) and queues a job.
//! 2. A worker borrows an instance from the stage's [`ProcessorPool`], processes the
//!    unit outside any lock, returns the instance and stores the outputs in a
//!    [`ReorderBuffer`] under the unit's sequence number.
//! 3. [`retrieve`](OrderedStage::retrieve) releases the contiguous prefix of finished
//!    sequence numbers, so outputs always surface in submission order.
//!
//! Submitting an end-of-stream unit switches the stage to draining: from then on
//! `retrieve` blocks until every outstanding result, including the end-of-stream
//! output, has been released.
//!
//! # Failures
//!
//! A unit whose processing fails (error, panic, or no instance could be built) is
//! logged and completes with no outputs. It still occupies its sequence number, so
//! the ordering of the remaining units is unaffected. If the failed unit was the
//! end-of-stream unit, an end-of-stream unit of the same width is emitted in its place
//! so downstream stages still terminate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use transcoda_lib::concurrency::{OrderedStage, StageConfig, WorkerPool, WorkerPoolConfig};
//! use transcoda_lib::media::{Data, Meta, StreamId, WorkUnit};
//! use transcoda_lib::processors::InvertProcessor;
//!
//! # fn main() -> anyhow::Result<()> {
//! let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::new(4))?);
//! let mut stage = OrderedStage::new(StageConfig::new("invert"), pool, || Ok(InvertProcessor::new()));
//!
//! for frame in 0..8u64 {
//!     let data = Data::cpu(StreamId(0), vec![frame as u8; 16], Meta::frame(frame));
//!     stage.submit(WorkUnit::single(data))?;
//!     for _unit in stage.retrieve() { /* hand downstream */ }
//! }
//! stage.submit(WorkUnit::end_of_stream(1))?;
//! let rest = stage.retrieve();
//! assert!(rest.last().is_some_and(WorkUnit::is_end_of_stream));
//! # Ok(())
//! # }
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex};

use super::extract_panic_message;
use super::processor_pool::ProcessorPool;
use super::worker_pool::WorkerPool;
use crate::errors::{PipelineError, Result};
use crate::logging::format_count;
use crate::media::{StorageType, WorkUnit};
use crate::processor::Processor;
use crate::reorder_buffer::ReorderBuffer;

/// Per-stage settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
    /// Name used in log messages and errors.
    pub name: String,
    /// Storage type reported by the stage's own [`Processor`] implementation.
    pub preferred_storage: StorageType,
}

impl StageConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), preferred_storage: StorageType::Cpu }
    }

    #[must_use]
    pub fn with_preferred_storage(mut self, preferred_storage: StorageType) -> Self {
        self.preferred_storage = preferred_storage;
        self
    }
}

/// Snapshot of a stage's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Units submitted (sequence numbers assigned).
    pub submitted: u64,
    /// Jobs that have finished, released or not.
    pub completed: u64,
    /// Sequence numbers released to the caller.
    pub released: u64,
    /// Output units handed to the caller.
    pub outputs: u64,
    /// Jobs that failed and completed with no outputs.
    pub failed: u64,
    /// Finished results waiting behind an unfinished earlier sequence number.
    pub buffered: usize,
    /// Processor instances built.
    pub processors_created: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageState {
    Streaming,
    Draining,
}

/// Results guarded by one lock so "check, then wait" is atomic with completion.
struct Completion {
    results: ReorderBuffer<Vec<WorkUnit>>,
    completed: u64,
}

/// State shared between the stage and the jobs it queued.
struct StageShared<P> {
    name: String,
    processors: ProcessorPool<P>,
    completion: Mutex<Completion>,
    result_available: Condvar,
    failed: AtomicU64,
}

impl<P: Processor> StageShared<P> {
    /// Body of every job: process `unit`, then publish the outputs under `seq`.
    fn run(&self, seq: u64, unit: &WorkUnit) {
        let outputs = match self.process_unit(seq, unit) {
            Some(outputs) => outputs,
            None => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                if unit.is_end_of_stream() {
                    vec![unit.end_of_stream_like()]
                } else {
                    Vec::new()
                }
            }
        };

        let mut completion = self.completion.lock();
        completion.results.insert(seq, outputs);
        completion.completed += 1;
        self.result_available.notify_all();
    }

    /// Returns `None` when the unit failed; failures are logged here.
    fn process_unit(&self, seq: u64, unit: &WorkUnit) -> Option<Vec<WorkUnit>> {
        // A panicking factory must still leave this sequence number filled.
        let mut processor = match catch_unwind(AssertUnwindSafe(|| self.processors.lend())) {
            Ok(Ok(processor)) => processor,
            Ok(Err(e)) => {
                error!("{}: no processor for sequence {seq}: {e}", self.name);
                return None;
            }
            Err(panic_info) => {
                error!(
                    "{}: processor factory panicked for sequence {seq}: {}",
                    self.name,
                    extract_panic_message(panic_info.as_ref())
                );
                return None;
            }
        };

        match catch_unwind(AssertUnwindSafe(|| processor.process(unit))) {
            Ok(Ok(outputs)) => {
                self.processors.restore(processor);
                Some(outputs)
            }
            Ok(Err(e)) => {
                self.processors.restore(processor);
                warn!("{}: processing sequence {seq} failed: {e:#}", self.name);
                None
            }
            Err(panic_info) => {
                // The instance may be half-updated; let it drop instead of reusing it.
                error!(
                    "{}: processor panicked on sequence {seq}: {}",
                    self.name,
                    extract_panic_message(panic_info.as_ref())
                );
                None
            }
        }
    }
}

/// Parallelizes one stateful processor while preserving submission order.
///
/// `submit` and `retrieve` take `&mut self`: a stage has a single upstream caller
/// that also drains it, as in a sequential pipeline. The worker pool may be shared
/// with other stages.
pub struct OrderedStage<P: Processor + 'static> {
    shared: Arc<StageShared<P>>,
    pool: Arc<WorkerPool>,
    state: StageState,
    /// Sequence number for the next submitted unit.
    next_seq: u64,
    outputs: u64,
    preferred_storage: StorageType,
}

impl<P: Processor + 'static> OrderedStage<P> {
    /// Create a stage running instances built by `factory` on `pool`.
    ///
    /// No instance is built until the first job needs one.
    pub fn new<F>(config: StageConfig, pool: Arc<WorkerPool>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<P> + Send + Sync + 'static,
    {
        let shared = StageShared {
            name: config.name,
            processors: ProcessorPool::new(Box::new(factory)),
            completion: Mutex::new(Completion { results: ReorderBuffer::new(), completed: 0 }),
            result_available: Condvar::new(),
            failed: AtomicU64::new(0),
        };
        Self {
            shared: Arc::new(shared),
            pool,
            state: StageState::Streaming,
            next_seq: 0,
            outputs: 0,
            preferred_storage: config.preferred_storage,
        }
    }

    /// Queue `unit` for processing, blocking while the pool's queue is full.
    ///
    /// An end-of-stream unit switches the stage to draining before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SubmitAfterEndOfStream`] if an end-of-stream unit was
    /// already submitted, or [`PipelineError::PoolShutDown`] if the pool is shut down.
    /// In both cases no sequence number is consumed.
    pub fn submit(&mut self, unit: WorkUnit) -> Result<()> {
        if self.state == StageState::Draining {
            return Err(PipelineError::SubmitAfterEndOfStream {
                stage: self.shared.name.clone(),
                sequence: self.next_seq,
            });
        }

        let seq = self.next_seq;
        let end_of_stream = unit.is_end_of_stream();
        let shared = Arc::clone(&self.shared);
        self.pool.enqueue(Box::new(move || shared.run(seq, &unit)))?;
        self.next_seq += 1;

        if end_of_stream {
            debug!("{}: end of stream at sequence {seq}, draining", self.shared.name);
            self.state = StageState::Draining;
        }
        Ok(())
    }

    /// Release finished outputs in submission order.
    ///
    /// While streaming this never blocks and returns whatever contiguous prefix is
    /// ready (possibly nothing). While draining it blocks until every submitted unit
    /// has been released; afterwards it returns an empty vector immediately.
    pub fn retrieve(&mut self) -> Vec<WorkUnit> {
        let mut released = Vec::new();
        let mut completion = self.shared.completion.lock();

        match self.state {
            StageState::Streaming => {
                completion.results.drain_ready().for_each(|outputs| released.extend(outputs));
            }
            StageState::Draining => {
                while completion.results.next_seq() < self.next_seq {
                    if !completion.results.can_pop() {
                        self.shared.result_available.wait(&mut completion);
                        continue;
                    }
                    completion.results.drain_ready().for_each(|outputs| released.extend(outputs));
                }
            }
        }
        drop(completion);

        self.outputs += released.len() as u64;
        released
    }

    /// Units submitted but not yet released.
    #[must_use]
    pub fn in_flight(&self) -> u64 {
        self.next_seq - self.shared.completion.lock().results.next_seq()
    }

    /// True once an end-of-stream unit was submitted.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.state == StageState::Draining
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    #[must_use]
    pub fn stats(&self) -> StageStats {
        let (completed, released, buffered) = {
            let completion = self.shared.completion.lock();
            (completion.completed, completion.results.next_seq(), completion.results.len())
        };
        StageStats {
            submitted: self.next_seq,
            completed,
            released,
            outputs: self.outputs,
            failed: self.shared.failed.load(Ordering::Relaxed),
            buffered,
            processors_created: self.shared.processors.created(),
        }
    }

    /// Log the stage's counters at info level.
    pub fn log_summary(&self) {
        let stats = self.stats();
        info!(
            "{}: {} units in, {} units out, {} failed, {} processor instance(s)",
            self.shared.name,
            format_count(stats.submitted),
            format_count(stats.outputs),
            format_count(stats.failed),
            stats.processors_created
        );
    }

    /// Block until every submitted job has finished, released or not.
    fn wait_for_jobs(&self) {
        let mut completion = self.shared.completion.lock();
        while completion.completed < self.next_seq {
            self.shared.result_available.wait(&mut completion);
        }
    }
}

impl<P: Processor + 'static> Processor for OrderedStage<P> {
    /// Submit `unit`, then release what is ready; after an end-of-stream unit the
    /// release blocks until every remaining output is flushed.
    ///
    /// When the submit fails nothing is released, so finished outputs stay
    /// available to a later `retrieve`.
    fn process(&mut self, unit: &WorkUnit) -> anyhow::Result<Vec<WorkUnit>> {
        self.submit(unit.clone())?;
        Ok(self.retrieve())
    }

    fn preferred_storage(&self) -> StorageType {
        self.preferred_storage
    }
}

impl<P: Processor + 'static> Drop for OrderedStage<P> {
    fn drop(&mut self) {
        self.wait_for_jobs();
    }
}
