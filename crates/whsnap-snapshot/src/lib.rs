pub mod delta;
pub mod error;
pub mod snapshot;

pub use delta::{compute_delta, write_delta, ChangedRecord, DeltaSet, FieldDiff};
pub use error::SnapshotError;
pub use snapshot::{publish, read_snapshot, write_snapshot, RunSummary, SnapshotPaths, SnapshotRow};
