//! Bundles of per-view data for a single time instant.

use std::ops::Index;

use super::data::{Data, StreamId};
use crate::errors::{PipelineError, Result};

/// All views of one frame (or segment) at a single time instant.
///
/// A work unit is atomically either "data" or "end of stream": every contained
/// [`Data`] is an end-of-stream marker, or none is. A work unit is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnit {
    views: Vec<Data>,
    end_of_stream: bool,
}

impl WorkUnit {
    /// Build a work unit from its views.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidWorkUnit`] if `views` is empty or mixes
    /// end-of-stream markers with payload-carrying data.
    pub fn new(views: Vec<Data>) -> Result<Self> {
        let Some(first) = views.first() else {
            return Err(PipelineError::InvalidWorkUnit {
                reason: "a work unit needs at least one view".to_string(),
            });
        };
        let end_of_stream = first.is_end_of_stream();
        if let Some(odd) = views.iter().find(|v| v.is_end_of_stream() != end_of_stream) {
            return Err(PipelineError::InvalidWorkUnit {
                reason: format!(
                    "{} is {}end-of-stream while {} is {}",
                    odd.stream_id(),
                    if end_of_stream { "not " } else { "" },
                    first.stream_id(),
                    if end_of_stream { "end-of-stream" } else { "data" },
                ),
            });
        }
        Ok(Self { views, end_of_stream })
    }

    /// A work unit holding a single view.
    #[must_use]
    pub fn single(data: Data) -> Self {
        let end_of_stream = data.is_end_of_stream();
        Self { views: vec![data], end_of_stream }
    }

    /// An end-of-stream unit with one marker for each of `num_views` streams.
    ///
    /// `num_views` of zero is treated as one.
    #[must_use]
    pub fn end_of_stream(num_views: u32) -> Self {
        Self::end_of_stream_for((0..num_views.max(1)).map(StreamId))
    }

    /// An end-of-stream unit with one marker for each of `streams`.
    ///
    /// An empty iterator yields a single marker for `StreamId(0)`.
    #[must_use]
    pub fn end_of_stream_for(streams: impl IntoIterator<Item = StreamId>) -> Self {
        let mut views: Vec<Data> = streams.into_iter().map(Data::end_of_stream).collect();
        if views.is_empty() {
            views.push(Data::end_of_stream(StreamId(0)));
        }
        Self { views, end_of_stream: true }
    }

    /// The end-of-stream unit matching this unit's streams.
    #[must_use]
    pub fn end_of_stream_like(&self) -> Self {
        Self::end_of_stream_for(self.views.iter().map(Data::stream_id))
    }

    /// Append a view.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidWorkUnit`] if the view's end-of-stream state
    /// differs from the views already present.
    pub fn push(&mut self, data: Data) -> Result<()> {
        if data.is_end_of_stream() != self.end_of_stream {
            return Err(PipelineError::InvalidWorkUnit {
                reason: format!("{} does not match the unit's end-of-stream state", data.stream_id()),
            });
        }
        self.views.push(data);
        Ok(())
    }

    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Number of views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// The first view added.
    #[must_use]
    pub fn front(&self) -> &Data {
        &self.views[0]
    }

    /// Look up the view belonging to `stream_id`.
    #[must_use]
    pub fn by_stream(&self, stream_id: StreamId) -> Option<&Data> {
        self.views.iter().find(|v| v.stream_id() == stream_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Data> {
        self.views.iter()
    }

    /// Consume the unit, returning its views.
    #[must_use]
    pub fn into_views(self) -> Vec<Data> {
        self.views
    }

    /// Total payload bytes over all views.
    #[must_use]
    pub fn payload_len(&self) -> u64 {
        self.views.iter().map(Data::payload_len).sum()
    }
}

impl Index<usize> for WorkUnit {
    type Output = Data;

    fn index(&self, index: usize) -> &Data {
        &self.views[index]
    }
}

impl<'a> IntoIterator for &'a WorkUnit {
    type Item = &'a Data;
    type IntoIter = std::slice::Iter<'a, Data>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.iter()
    }
}
