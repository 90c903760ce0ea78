#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: counters are u64 while buffer lengths are usize
// - missing_*_doc: Documentation improvements tracked separately
// - needless_pass_by_value: Some APIs designed for ownership transfer
// - items_after_statements: Some test code uses late item declarations
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::items_after_statements,
    clippy::redundant_closure_for_method_calls,
    clippy::uninlined_format_args
)]

//! # transcoda - Order-Preserving Parallel Stages for Media Pipelines
//!
//! This library parallelizes expensive, stateful per-frame processors (encoders,
//! scalers, filters) across a worker pool while keeping the observable output order
//! identical to sequential processing.
//!
//! ## Overview
//!
//! ### Core Functionality
//!
//! - **[`media`]** - The unit of flow: per-view [`Data`](media::Data) bundled into
//!   [`WorkUnit`](media::WorkUnit)s, including end-of-stream markers
//! - **[`processor`]** - The [`Processor`](processor::Processor) trait every stage implements
//! - **[`concurrency`]** - Worker pool, processor freelist and the order-preserving
//!   [`OrderedStage`](concurrency::OrderedStage)
//! - **[`reorder_buffer`]** - Releases out-of-order completions in sequence order
//!
//! ### Utilities
//!
//! - **[`processors`]** - Ready-made processors (inversion filter, artificial delay)
//! - **[`validation`]** - Parameter validation with structured errors
//! - **[`progress`]** - Progress tracking and logging
//! - **[`logging`]** - Formatting helpers and operation timing
//! - **[`errors`]** - The library error type
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use transcoda_lib::concurrency::{OrderedStage, StageConfig, WorkerPool, WorkerPoolConfig};
//! use transcoda_lib::media::{Data, Meta, StreamId, WorkUnit};
//! use transcoda_lib::processor::Processor;
//! use transcoda_lib::processors::InvertProcessor;
//!
//! # fn main() -> anyhow::Result<()> {
//! let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::new(2))?);
//! let mut stage =
//!     OrderedStage::new(StageConfig::new("invert"), pool, || Ok(InvertProcessor::new()));
//!
//! // Used as a plain processor, the stage flushes everything on end of stream.
//! let mut out = Vec::new();
//! for frame in 0..4u64 {
//!     let unit = WorkUnit::single(Data::cpu(StreamId(0), vec![0u8; 8], Meta::frame(frame)));
//!     out.extend(stage.process(&unit)?);
//! }
//! out.extend(stage.process(&WorkUnit::end_of_stream(1))?);
//! assert_eq!(out.len(), 5);
//! # Ok(())
//! # }
//! ```

pub mod concurrency;
pub mod errors;
pub mod logging;
pub mod media;
pub mod processor;
pub mod processors;
pub mod progress;
pub mod reorder_buffer;
pub mod validation;

pub use errors::{PipelineError, Result};
