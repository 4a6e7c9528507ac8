//! Backup snapshot validation.
//!
//! A restore is a destructive full replace, so the uploaded JSON must look
//! like a snapshot of this system before it is accepted.

pub mod error;
pub mod snapshot;

pub use error::BackupError;
pub use snapshot::{Snapshot, SnapshotTree, ValidatedSnapshot, validate_snapshot};
