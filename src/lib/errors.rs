//! Custom error types for transcoda operations.

use thiserror::Error;

use crate::media::StorageType;

/// Result type alias for transcoda operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for transcoda operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// A work unit violated the all-or-nothing end-of-stream rule, or was empty
    #[error("Invalid work unit: {reason}")]
    InvalidWorkUnit {
        /// Explanation of the problem
        reason: String,
    },

    /// A unit was submitted to a stage that already received its end-of-stream unit
    #[error("Stage '{stage}' already received end of stream; cannot submit sequence {sequence}")]
    SubmitAfterEndOfStream {
        /// Name of the stage
        stage: String,
        /// The sequence number the unit would have received
        sequence: u64,
    },

    /// A job was offered to a worker pool that has been shut down
    #[error("Worker pool has been shut down")]
    PoolShutDown,

    /// The processor factory failed to construct a new instance
    #[error("Failed to create processor instance: {source}")]
    ProcessorCreation {
        /// The underlying factory error
        #[source]
        source: anyhow::Error,
    },

    /// Data was stored on a backend the operation cannot read
    #[error("Unsupported storage {actual:?} (expected {expected:?})")]
    UnsupportedStorage {
        /// The storage the data actually lives in
        actual: StorageType,
        /// The storage the operation needs
        expected: StorageType,
    },

    /// I/O failure (e.g. a worker thread could not be spawned)
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
