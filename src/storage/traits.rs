//! Storage traits and error types
//!
//! This module defines the trait interface for snapshot backends and
//! associated error types.

use thiserror::Error;

/// Errors that can occur during snapshot operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to remove snapshot {path}: {source}")]
    Remove {
        path: String,
        source: std::io::Error,
    },

    #[error("Corrupt snapshot {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for snapshot backends holding one value of type `T`
///
/// A snapshot is owned by exactly one pipeline run at a time.
pub trait SnapshotStore<T> {
    /// Loads the snapshot, or `None` if none has been written
    fn load(&self) -> StorageResult<Option<T>>;

    /// Replaces the snapshot with `value`
    fn save(&self, value: &T) -> StorageResult<()>;

    /// Deletes the snapshot; deleting a missing snapshot is not an error
    fn remove(&self) -> StorageResult<()>;

    /// Human-readable location for log messages
    fn location(&self) -> String;
}
