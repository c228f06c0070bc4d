//! Error types for the storage layer

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Snapshot format version mismatch
    #[error("Unsupported snapshot format version: {version}, supported: {supported}")]
    UnsupportedVersion {
        /// Version found in the snapshot
        version: u32,
        /// Version supported by this build
        supported: u32,
    },

    /// Invalid or corrupted snapshot document
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot {
        /// Reason the snapshot was rejected
        reason: String,
    },

    /// I/O error encountered while reading or writing a snapshot
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },

    /// JSON (de)serialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        /// Source serde_json error
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Create an invalid-snapshot error
    pub fn invalid_snapshot(reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StorageError::invalid_snapshot("missing genome pairing");
        assert!(matches!(err, StorageError::InvalidSnapshot { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::UnsupportedVersion {
            version: 99,
            supported: 1,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Unsupported snapshot format version"));
    }
}
