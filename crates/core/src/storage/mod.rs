pub mod snapshots;

pub use snapshots::{DryRunSink, SnapshotSink, SnapshotWriter, WriteError};
