pub mod item;
pub mod snapshot;

pub use item::{Item, RawEntry, PLACEHOLDER_TITLE};
pub use snapshot::SnapshotRecord;
