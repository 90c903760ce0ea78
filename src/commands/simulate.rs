//! Push synthetic frames through an order-preserving parallel stage.
//!
//! Frames carry random payloads for one or more views. They run through an
//! [`OrderedStage`] wrapping an [`InvertProcessor`], optionally behind a random
//! per-frame delay, and every output is checked against its input: it must arrive
//! in submission order and carry the inverted payload.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Result, bail, ensure};
use bytes::Bytes;
use clap::Parser;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use transcoda_lib::concurrency::{OrderedStage, StageConfig, WorkerPool};
use transcoda_lib::logging::OperationTimer;
use transcoda_lib::media::{Data, Meta, StreamId, WorkUnit};
use transcoda_lib::processors::{Delay, DelayProcessor, InvertProcessor};
use transcoda_lib::progress::ProgressTracker;
use transcoda_lib::validation::{validate_min_max, validate_positive, validate_range};

use crate::commands::command::Command;
use crate::commands::common::{QueueOptions, ThreadingOptions, worker_pool_config};

/// Upper bound on views per frame.
const MAX_VIEWS: u32 = 64;

/// Simulate a transcoding stage and verify that output order matches input order.
#[derive(Debug, Parser)]
#[command(
    name = "simulate",
    about = "\x1b[38;5;166m[UTILITIES]\x1b[0m      \x1b[36mRun synthetic frames through a parallel stage\x1b[0m",
    long_about = r#"
Run synthetic frames through an order-preserving parallel stage.

Each frame holds one random payload per view. Frames are processed by a pool of
stateful inversion filters on worker threads; a random per-frame delay makes the
workers finish out of order. Outputs are checked to arrive in submission order with
the expected payloads, and the command fails if they do not.

Example usage:
  transcoda simulate --frames 10000 --threads 8
  transcoda simulate --frames 500 --views 2 --min-delay-ms 1 --max-delay-ms 20 --seed 7
  transcoda simulate --threads 0
"#
)]
pub struct Simulate {
    /// Number of frames to generate
    #[arg(short = 'n', long = "frames", default_value_t = 1000)]
    pub frames: u64,

    /// Views (elementary streams) per frame
    #[arg(short = 'v', long = "views", default_value_t = 1)]
    pub views: u32,

    /// Payload size per view in bytes
    #[arg(short = 's', long = "frame-size", default_value_t = 4096)]
    pub frame_size: usize,

    /// Minimum per-frame processing delay in milliseconds
    #[arg(long = "min-delay-ms", default_value_t = 0)]
    pub min_delay_ms: u64,

    /// Maximum per-frame processing delay in milliseconds
    #[arg(long = "max-delay-ms")]
    pub max_delay_ms: Option<u64>,

    /// Random seed for reproducibility
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Log progress every N frames
    #[arg(long = "progress-interval", default_value_t = 10_000)]
    pub progress_interval: u64,

    #[command(flatten)]
    pub threading: ThreadingOptions,

    #[command(flatten)]
    pub queue: QueueOptions,
}

impl Command for Simulate {
    fn execute(&self, command_line: &str) -> Result<()> {
        self.validate()?;
        debug!("Command line: {command_line}");

        let seed = self.seed.unwrap_or_else(|| rand::make_rng::<StdRng>().random());
        let delay = Delay::from_millis(self.min_delay_ms, self.max_delay_ms.unwrap_or(self.min_delay_ms));

        info!("Starting Simulate");
        info!("Frames: {} x {} view(s) of {} bytes", self.frames, self.views, self.frame_size);
        info!("Delay: {delay:?}");
        info!("Random seed: {seed}");
        info!("{}", self.threading.log_message());

        let timer = OperationTimer::new("Simulating frames");
        let pool = Arc::new(WorkerPool::new(worker_pool_config(&self.threading, &self.queue))?);
        let released = self.run(Arc::clone(&pool), delay, seed)?;

        let stats = pool.stats();
        info!(
            "Worker pool: {} thread(s), {} job(s) executed, {} panicked",
            stats.threads, stats.jobs_executed, stats.jobs_panicked
        );
        timer.log_completion(released);
        Ok(())
    }
}

impl Simulate {
    fn validate(&self) -> Result<()> {
        validate_range(self.views, 1, MAX_VIEWS, "views")?;
        validate_positive(self.frame_size, "frame-size")?;
        validate_min_max(self.min_delay_ms, self.max_delay_ms, "min-delay-ms", "max-delay-ms")?;
        self.queue.validate()
    }

    /// Drive the stage and return the number of verified frames.
    fn run(&self, pool: Arc<WorkerPool>, delay: Delay, seed: u64) -> Result<u64> {
        let instance_seed = AtomicU64::new(seed);
        let mut stage = OrderedStage::new(StageConfig::new("invert"), pool, move || {
            let seed = instance_seed.fetch_add(1, Ordering::Relaxed);
            Ok(DelayProcessor::new(InvertProcessor::new(), delay, seed))
        });

        let mut generator = FrameGenerator::new(seed, self.views, self.frame_size);
        let mut verifier = OrderVerifier::default();
        let progress = ProgressTracker::new("Verified frames").with_interval(self.progress_interval);

        for _ in 0..self.frames {
            let unit = generator.next_frame()?;
            verifier.expect(&unit);
            stage.submit(unit)?;
            let verified = verifier.check(stage.retrieve())?;
            progress.log_if_needed(verified);
        }

        stage.submit(WorkUnit::end_of_stream(self.views))?;
        let rest = stage.retrieve();
        let Some((last, outputs)) = rest.split_last() else {
            bail!("stage returned nothing after end of stream");
        };
        ensure!(last.is_end_of_stream(), "last output is not end of stream");
        let verified = verifier.check(outputs.to_vec())?;
        progress.log_if_needed(verified);
        progress.log_final();

        ensure!(
            verifier.pending() == 0,
            "{} frame(s) were never released by the stage",
            verifier.pending()
        );
        stage.log_summary();
        Ok(progress.count())
    }
}

/// Produces frames with random payloads, one per view.
struct FrameGenerator {
    rng: StdRng,
    views: u32,
    frame_size: usize,
    next_index: u64,
}

impl FrameGenerator {
    /// 25 frames per second.
    const FRAME_DURATION: Duration = Duration::from_millis(40);

    fn new(seed: u64, views: u32, frame_size: usize) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), views, frame_size, next_index: 0 }
    }

    fn next_frame(&mut self) -> Result<WorkUnit> {
        let index = self.next_index;
        self.next_index += 1;
        let meta = Meta {
            frame_index: index,
            presentation_time: Self::FRAME_DURATION * index as u32,
            duration: Self::FRAME_DURATION,
        };
        let views = (0..self.views)
            .map(|view| {
                let mut payload = vec![0u8; self.frame_size];
                self.rng.fill(payload.as_mut_slice());
                Data::cpu(StreamId(view), payload, meta)
            })
            .collect();
        Ok(WorkUnit::new(views)?)
    }
}

/// Checks released frames against the submitted ones, in order.
#[derive(Default)]
struct OrderVerifier {
    expected: VecDeque<(u64, Vec<Bytes>)>,
}

impl OrderVerifier {
    fn expect(&mut self, unit: &WorkUnit) {
        let payloads = unit.iter().filter_map(|data| data.to_cpu().ok()).collect();
        self.expected.push_back((unit.front().meta().frame_index, payloads));
    }

    /// Returns how many frames were verified.
    fn check(&mut self, released: Vec<WorkUnit>) -> Result<u64> {
        let count = released.len() as u64;
        for unit in released {
            let Some((index, payloads)) = self.expected.pop_front() else {
                bail!("stage released more frames than were submitted");
            };
            let actual = unit.front().meta().frame_index;
            ensure!(actual == index, "frame {actual} released where frame {index} was expected");
            ensure!(unit.len() == payloads.len(), "frame {index} has {} views", unit.len());
            for (data, input) in unit.iter().zip(&payloads) {
                let output = data.to_cpu()?;
                ensure!(
                    output.iter().zip(input.iter()).all(|(o, i)| *o == !*i),
                    "payload of frame {index} {} was not inverted",
                    data.stream_id()
                );
            }
        }
        Ok(count)
    }

    fn pending(&self) -> usize {
        self.expected.len()
    }
}
