pub mod diff;
pub mod snapshot;

pub use diff::{read_diff, DiffError, DiffRecord, DiffSink, DiffWriter};
pub use snapshot::{load_private_snapshot, SnapshotError};
