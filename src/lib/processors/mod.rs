//! Ready-made [`Processor`](crate::processor::Processor) implementations.
//!
//! - [`invert`] - a stateful filter that inverts CPU payloads
//! - [`delay`] - wraps another processor and sleeps before delegating

pub mod delay;
pub mod invert;

pub use delay::{Delay, DelayProcessor};
pub use invert::InvertProcessor;
