//! Integration tests for the transcoda library and binary.
//!
//! These tests drive whole stages across real worker threads, checking ordering,
//! end-of-stream handling, failure isolation and backpressure.

mod helpers;
mod test_ordered_stage;
mod test_simulate_command;
mod test_stage_concurrency;
mod test_worker_pool;
