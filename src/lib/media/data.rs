//! Per-view data items and the storage backends they live in.
//!
//! A [`Data`] is one view (one elementary stream) of a frame or segment at a single
//! time instant. Its payload may live on different backends (contiguous memory,
//! scattered memory chunks, a byte range of a file), or it may be an end-of-stream
//! marker that carries no payload at all.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use crate::errors::{PipelineError, Result};

/// Identifies one elementary stream (one view) within a [`WorkUnit`](super::WorkUnit).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub u32);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// The backend a [`Data`] payload is stored in, without the payload itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageType {
    /// No payload.
    #[default]
    Empty,
    /// Contiguous in-memory bytes.
    Cpu,
    /// An ordered list of in-memory chunks.
    Fragmented,
    /// A byte range of a file on disk.
    File,
    /// Not stored anywhere; signals end of stream.
    EndOfStream,
}

/// Payload of a [`Data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Storage {
    /// No payload.
    #[default]
    Empty,
    /// Contiguous in-memory bytes.
    Cpu(Bytes),
    /// An ordered list of in-memory chunks, logically concatenated.
    Fragmented(Vec<Bytes>),
    /// A byte range of a file on disk.
    File {
        /// Path of the file
        path: PathBuf,
        /// Offset of the first byte
        offset: u64,
        /// Number of bytes
        len: u64,
    },
    /// End-of-stream marker.
    EndOfStream,
}

impl Storage {
    /// The backend this payload lives in.
    #[must_use]
    pub fn storage_type(&self) -> StorageType {
        match self {
            Storage::Empty => StorageType::Empty,
            Storage::Cpu(_) => StorageType::Cpu,
            Storage::Fragmented(_) => StorageType::Fragmented,
            Storage::File { .. } => StorageType::File,
            Storage::EndOfStream => StorageType::EndOfStream,
        }
    }
}

/// Timing metadata attached to every [`Data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Meta {
    /// Index of the frame (or segment) within its stream.
    pub frame_index: u64,
    /// Presentation time of the frame.
    pub presentation_time: Duration,
    /// Display duration of the frame.
    pub duration: Duration,
}

impl Meta {
    /// Metadata for the given frame index with zero timing.
    #[must_use]
    pub fn frame(frame_index: u64) -> Self {
        Self { frame_index, ..Self::default() }
    }
}

/// One view of a frame at a single time instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    stream_id: StreamId,
    storage: Storage,
    meta: Meta,
}

impl Data {
    /// Create a data item for `stream_id` with the given storage and metadata.
    #[must_use]
    pub fn new(stream_id: StreamId, storage: Storage, meta: Meta) -> Self {
        Self { stream_id, storage, meta }
    }

    /// Convenience constructor for contiguous in-memory payloads.
    #[must_use]
    pub fn cpu(stream_id: StreamId, payload: impl Into<Bytes>, meta: Meta) -> Self {
        Self::new(stream_id, Storage::Cpu(payload.into()), meta)
    }

    /// An end-of-stream marker for `stream_id`.
    #[must_use]
    pub fn end_of_stream(stream_id: StreamId) -> Self {
        Self::new(stream_id, Storage::EndOfStream, Meta::default())
    }

    #[must_use]
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Replace the metadata, keeping stream and payload.
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn storage_type(&self) -> StorageType {
        self.storage.storage_type()
    }

    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self.storage, Storage::EndOfStream)
    }

    /// Number of payload bytes, regardless of backend.
    #[must_use]
    pub fn payload_len(&self) -> u64 {
        match &self.storage {
            Storage::Empty | Storage::EndOfStream => 0,
            Storage::Cpu(bytes) => bytes.len() as u64,
            Storage::Fragmented(chunks) => chunks.iter().map(|c| c.len() as u64).sum(),
            Storage::File { len, .. } => *len,
        }
    }

    /// Returns the payload as contiguous in-memory bytes.
    ///
    /// `Cpu` payloads are returned without copying; `Fragmented` payloads are
    /// concatenated. `Empty` yields an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnsupportedStorage`] for file-backed data and
    /// end-of-stream markers.
    pub fn to_cpu(&self) -> Result<Bytes> {
        match &self.storage {
            Storage::Empty => Ok(Bytes::new()),
            Storage::Cpu(bytes) => Ok(bytes.clone()),
            Storage::Fragmented(chunks) => {
                let mut joined = BytesMut::with_capacity(self.payload_len() as usize);
                for chunk in chunks {
                    joined.extend_from_slice(chunk);
                }
                Ok(joined.freeze())
            }
            other => Err(PipelineError::UnsupportedStorage {
                actual: other.storage_type(),
                expected: StorageType::Cpu,
            }),
        }
    }
}
