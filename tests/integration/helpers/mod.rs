//! Helper utilities for integration tests.

pub mod processors;

pub use processors::*;

use std::sync::Arc;

use transcoda_lib::concurrency::{OrderedStage, StageConfig, WorkerPool, WorkerPoolConfig};
use transcoda_lib::media::{Data, Meta, StreamId, WorkUnit};
use transcoda_lib::processor::Processor;

/// A single-view frame whose payload is the little-endian frame index.
pub fn frame(index: u64) -> WorkUnit {
    WorkUnit::single(Data::cpu(StreamId(0), index.to_le_bytes().to_vec(), Meta::frame(index)))
}

/// A frame with `views` views, each carrying `[index, view]`.
pub fn multi_view_frame(index: u64, views: u32) -> WorkUnit {
    let views = (0..views)
        .map(|v| Data::cpu(StreamId(v), vec![index as u8, v as u8], Meta::frame(index)))
        .collect();
    WorkUnit::new(views).expect("views share end-of-stream state")
}

/// Frame indices of the non end-of-stream units, in order.
pub fn frame_indices(units: &[WorkUnit]) -> Vec<u64> {
    units.iter().filter(|u| !u.is_end_of_stream()).map(|u| u.front().meta().frame_index).collect()
}

/// A shared pool with `threads` workers and the given queue capacity.
pub fn pool(threads: usize, queue_capacity: usize) -> Arc<WorkerPool> {
    let config = WorkerPoolConfig::new(threads).with_queue_capacity(queue_capacity);
    Arc::new(WorkerPool::new(config).expect("valid pool config"))
}

/// A stage named `test` on its own pool.
pub fn stage<P, F>(threads: usize, queue_capacity: usize, factory: F) -> OrderedStage<P>
where
    P: Processor + 'static,
    F: Fn() -> anyhow::Result<P> + Send + Sync + 'static,
{
    OrderedStage::new(StageConfig::new("test"), pool(threads, queue_capacity), factory)
}

/// Submit every unit (retrieving after each submit), then end of stream, and
/// return everything released.
pub fn run_to_completion<P: Processor + 'static>(
    stage: &mut OrderedStage<P>,
    units: impl IntoIterator<Item = WorkUnit>,
) -> Vec<WorkUnit> {
    let mut released = Vec::new();
    for unit in units {
        stage.submit(unit).expect("submit while streaming");
        released.extend(stage.retrieve());
    }
    stage.submit(WorkUnit::end_of_stream(1)).expect("submit end of stream");
    released.extend(stage.retrieve());
    released
}
