//! CLI command implementations for transcoda.
//!
//! - [`simulate`] - Push synthetic frames through an order-preserving parallel stage

pub mod command;
pub mod common;
pub mod simulate;
