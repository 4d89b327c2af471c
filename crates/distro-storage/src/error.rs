//! Storage error types

use distro_core::DistributionError;
use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Filesystem error while reading or writing a snapshot
    #[error("I/O error: {0}")]
    Io(String),

    /// Snapshot (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored value could not be decoded
    #[error("Corrupted value under key '{key}': {reason}")]
    Corrupted { key: String, reason: String },

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<StorageError> for DistributionError {
    fn from(e: StorageError) -> Self {
        DistributionError::StorageFailure(e.to_string())
    }
}
