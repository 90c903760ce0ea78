//! Artificial latency in front of another processor.
//!
//! Used to simulate expensive filters (encoders, scalers) whose per-unit cost
//! varies, which is what makes out-of-order completion visible.

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::media::{StorageType, WorkUnit};
use crate::processor::Processor;

/// How long a [`DelayProcessor`] sleeps before each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    None,
    Fixed(Duration),
    /// Uniform in `min..=max`.
    Random { min: Duration, max: Duration },
}

impl Delay {
    /// Random delay between `min_ms` and `max_ms`; a single value when they are equal.
    #[must_use]
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        match (min_ms, max_ms) {
            (0, 0) => Delay::None,
            (min, max) if min >= max => Delay::Fixed(Duration::from_millis(min)),
            (min, max) => {
                Delay::Random { min: Duration::from_millis(min), max: Duration::from_millis(max) }
            }
        }
    }
}

/// Sleeps according to a [`Delay`], then delegates to the wrapped processor.
///
/// End-of-stream units are never delayed.
pub struct DelayProcessor<P> {
    inner: P,
    delay: Delay,
    rng: StdRng,
}

impl<P: Processor> DelayProcessor<P> {
    /// Wrap `inner`; `seed` drives random delays so runs are reproducible.
    #[must_use]
    pub fn new(inner: P, delay: Delay, seed: u64) -> Self {
        Self { inner, delay, rng: StdRng::seed_from_u64(seed) }
    }

    #[must_use]
    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn next_delay(&mut self) -> Duration {
        match self.delay {
            Delay::None => Duration::ZERO,
            Delay::Fixed(d) => d,
            Delay::Random { min, max } => {
                Duration::from_micros(self.rng.random_range(min.as_micros() as u64..=max.as_micros() as u64))
            }
        }
    }
}

impl<P: Processor> Processor for DelayProcessor<P> {
    fn process(&mut self, unit: &WorkUnit) -> anyhow::Result<Vec<WorkUnit>> {
        if !unit.is_end_of_stream() {
            let delay = self.next_delay();
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
        self.inner.process(unit)
    }

    fn preferred_storage(&self) -> StorageType {
        self.inner.preferred_storage()
    }
}
