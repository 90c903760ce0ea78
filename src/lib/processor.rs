//! The processor abstraction every pipeline stage implements.
//!
//! A [`Processor`] consumes one [`WorkUnit`] and returns zero or more output units.
//! Encoders, for instance, may return nothing for a while and then several units at
//! once (or only after end of stream). When a stream ends, a processor must emit an
//! end-of-stream unit of its own so downstream stages see the end as well.

use anyhow::Result;

use crate::media::{StorageType, WorkUnit};

/// A stateful transformation of work units.
///
/// Implementations are driven by a single thread at a time; parallel execution
/// is achieved by running several instances, see
/// [`OrderedStage`](crate::concurrency::OrderedStage).
pub trait Processor: Send {
    /// Process one unit, returning the units it produces (possibly none).
    ///
    /// # Errors
    ///
    /// Any error is a per-unit failure; callers decide whether the stream continues.
    fn process(&mut self, unit: &WorkUnit) -> Result<Vec<WorkUnit>>;

    /// The storage backend this processor prefers its input in.
    fn preferred_storage(&self) -> StorageType {
        StorageType::Cpu
    }
}

impl<P: Processor + ?Sized> Processor for Box<P> {
    fn process(&mut self, unit: &WorkUnit) -> Result<Vec<WorkUnit>> {
        (**self).process(unit)
    }

    fn preferred_storage(&self) -> StorageType {
        (**self).preferred_storage()
    }
}

/// Builds fresh processor instances on demand.
pub type ProcessorFactory<P> = Box<dyn Fn() -> Result<P> + Send + Sync>;
