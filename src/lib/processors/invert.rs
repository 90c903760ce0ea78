//! Bitwise inversion filter.

use bytes::Bytes;

use crate::media::{Data, Meta, Storage, WorkUnit};
use crate::processor::Processor;

/// Inverts every byte of every view and stamps an output counter into the metadata.
///
/// Each instance keeps its own counter of units processed; the counter is
/// written to [`Meta::frame_index`] of the outputs only when `renumber` is set,
/// otherwise the input frame index is kept. Non-CPU storages are materialized
/// with [`Data::to_cpu`] first. End-of-stream units pass through unchanged.
#[derive(Debug, Default)]
pub struct InvertProcessor {
    renumber: bool,
    processed: u64,
}

impl InvertProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp this instance's running count as the output frame index.
    #[must_use]
    pub fn renumbering() -> Self {
        Self { renumber: true, processed: 0 }
    }

    /// Units this instance has processed.
    #[must_use]
    pub fn processed(&self) -> u64 {
        self.processed
    }

    fn invert_view(&self, data: &Data) -> anyhow::Result<Data> {
        let inverted: Vec<u8> = data.to_cpu()?.iter().map(|b| !b).collect();
        let meta = if self.renumber {
            Meta { frame_index: self.processed, ..*data.meta() }
        } else {
            *data.meta()
        };
        Ok(Data::new(data.stream_id(), Storage::Cpu(Bytes::from(inverted)), meta))
    }
}

impl Processor for InvertProcessor {
    fn process(&mut self, unit: &WorkUnit) -> anyhow::Result<Vec<WorkUnit>> {
        if unit.is_end_of_stream() {
            return Ok(vec![unit.clone()]);
        }
        let views = unit.iter().map(|data| self.invert_view(data)).collect::<anyhow::Result<Vec<_>>>()?;
        self.processed += 1;
        Ok(vec![WorkUnit::new(views)?])
    }
}
