//! Media data model: per-view [`Data`] items bundled into [`WorkUnit`]s.

pub mod data;
pub mod work_unit;

pub use data::{Data, Meta, Storage, StorageType, StreamId};
pub use work_unit::WorkUnit;
