//! Common CLI options shared across commands.
//!
//! These structures are composed into command structs using `#[command(flatten)]`.

use clap::Args;

use transcoda_lib::concurrency::WorkerPoolConfig;
use transcoda_lib::concurrency::worker_pool::DEFAULT_QUEUE_CAPACITY;
use transcoda_lib::validation::validate_positive;

/// Worker thread options.
///
/// # Examples
///
/// ```bash
/// transcoda simulate --threads 8
/// # Processes up to 8 frames concurrently
/// transcoda simulate --threads 0
/// # Runs every job on the submitting thread
/// ```
#[derive(Debug, Clone, Default, Args)]
pub struct ThreadingOptions {
    /// Number of worker threads.
    ///
    /// Defaults to the number of available CPUs. Zero runs every job inline on the
    /// submitting thread.
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,
}

impl ThreadingOptions {
    /// Creates threading options with exactly `threads` workers.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        Self { threads: Some(threads) }
    }

    /// Worker count to use, falling back to the available parallelism.
    #[must_use]
    pub fn num_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| WorkerPoolConfig::default().threads)
    }

    /// Returns a log-friendly description of the threading mode.
    #[must_use]
    pub fn log_message(&self) -> String {
        match self.num_threads() {
            0 => "Inline processing (no worker threads)".to_string(),
            1 => "Using 1 worker thread".to_string(),
            n => format!("Using {n} worker threads"),
        }
    }
}

/// Job queue options.
#[derive(Debug, Clone, Args)]
pub struct QueueOptions {
    /// Maximum number of jobs waiting for a worker before submission blocks.
    #[arg(long = "queue-capacity", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_QUEUE_CAPACITY }
    }
}

impl QueueOptions {
    /// # Errors
    ///
    /// Returns an error if the capacity is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_positive(self.queue_capacity, "queue-capacity")?;
        Ok(())
    }
}

/// Builds the worker pool configuration from the CLI options.
#[must_use]
pub fn worker_pool_config(threading: &ThreadingOptions, queue: &QueueOptions) -> WorkerPoolConfig {
    WorkerPoolConfig::new(threading.num_threads()).with_queue_capacity(queue.queue_capacity)
}
