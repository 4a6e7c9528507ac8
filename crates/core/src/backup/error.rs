//! Backup error types.

use thiserror::Error;

/// Snapshot validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackupError {
    /// Top level is not a JSON object.
    #[error("Snapshot must be a JSON object")]
    NotAnObject,

    /// None of the known collections is present.
    #[error("Snapshot contains none of the known collections")]
    NoKnownCollections,

    /// A collection is not an object of documents.
    #[error("Collection '{0}' must be an object of documents")]
    MalformedCollection(String),

    /// The local store section is not an object.
    #[error("Local store section must be a JSON object")]
    MalformedLocal,

    /// A local value does not have the shape its readers expect.
    #[error("Local value '{key}' is unreadable: {reason}")]
    MalformedLocalValue {
        /// Local store key.
        key: String,
        /// Decode failure.
        reason: String,
    },
}
