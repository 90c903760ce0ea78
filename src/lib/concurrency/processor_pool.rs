//! Freelist of reusable, stateful processor instances.
//!
//! Constructing a processor (opening an encoder session, allocating scaler tables,
//! ...) can be expensive, so instances are lent to one job at a time and handed
//! back afterwards instead of being rebuilt per unit. When every instance is busy a
//! new one is built with the factory, so lending never waits for other jobs.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::errors::{PipelineError, Result};
use crate::processor::ProcessorFactory;

/// Lends processor instances to jobs, creating them on demand.
///
/// An instance is owned either by the freelist or by exactly one borrower, never
/// both. The freelist lock is only held to push or pop.
pub struct ProcessorPool<P> {
    factory: ProcessorFactory<P>,
    available: Mutex<Vec<P>>,
    created: AtomicU64,
}

impl<P> ProcessorPool<P> {
    #[must_use]
    pub fn new(factory: ProcessorFactory<P>) -> Self {
        Self { factory, available: Mutex::new(Vec::new()), created: AtomicU64::new(0) }
    }

    /// Take an idle instance, or build a new one if none is idle.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ProcessorCreation`] if the factory fails.
    pub fn lend(&self) -> Result<P> {
        if let Some(processor) = self.available.lock().pop() {
            return Ok(processor);
        }
        let processor = (self.factory)().map_err(|source| PipelineError::ProcessorCreation { source })?;
        self.created.fetch_add(1, Ordering::Relaxed);
        Ok(processor)
    }

    /// Hand a lent instance back to the freelist.
    pub fn restore(&self, processor: P) {
        self.available.lock().push(processor);
    }

    /// Number of idle instances.
    #[must_use]
    pub fn available(&self) -> usize {
        self.available.lock().len()
    }

    /// Number of instances built so far.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }
}
