//! Order-preserving parallel execution of a single pipeline stage.
//!
//! # Architecture
//!
//! ```text
//!  caller ──submit(unit)──▶ OrderedStage ──job(seq, unit)──▶ WorkerPool (bounded queue)
//!                              ▲                                   │
//!                              │                                   ▼
//!  caller ◀──retrieve()──── ReorderBuffer ◀──complete(seq)──── worker thread
//!                                                                  │  lend / restore
//!                                                                  ▼
//!                                                            ProcessorPool
//! ```
//!
//! - [`WorkerPool`]: fixed worker threads draining a bounded FIFO of jobs. Producers
//!   block when the queue is full; a pool may be shared by several stages.
//! - [`ProcessorPool`]: freelist of stateful [`Processor`](crate::processor::Processor)
//!   instances, lent to one job at a time and created on demand.
//! - [`OrderedStage`]: numbers submitted units, runs them on the pool, and releases
//!   results strictly in submission order.
//!
//! Each shared structure has its own lock; processors always run outside every lock.

pub mod ordered_stage;
pub mod processor_pool;
pub mod worker_pool;

pub use ordered_stage::{OrderedStage, StageConfig, StageStats};
pub use processor_pool::ProcessorPool;
pub use worker_pool::{Job, WorkerPool, WorkerPoolConfig, WorkerPoolStats};

/// Extract a human-readable message from a panic payload.
///
/// Handles the common `&str` and `String` payloads, with a fallback for other types.
#[must_use]
pub fn extract_panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
