//! Generic snapshot envelope and JSON codec.
//!
//! `hidra-storage` does not know the shape of a world's state — that belongs
//! to `hidra-engine`, which owns the neuron/synapse/event types. What this
//! module owns is the stable *envelope* around any serializable payload: a
//! format-version tag checked on load, and the JSON read/write plumbing.
//! This mirrors the teacher's split between a storage crate that defines
//! wire formats and a runtime crate that defines the data living inside them.

use std::io::{Read, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Current snapshot format version produced by this codec.
///
/// Bumped whenever the envelope shape itself changes (not the payload —
/// payload compatibility is the caller's concern).
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A versioned wrapper around an arbitrary serializable snapshot payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope<T> {
    /// Format version this envelope was written with.
    pub format_version: u32,
    /// The actual snapshot payload.
    pub payload: T,
}

impl<T> SnapshotEnvelope<T> {
    /// Wrap a payload at the current format version.
    pub fn new(payload: T) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            payload,
        }
    }
}

impl<T: Serialize> SnapshotEnvelope<T> {
    /// Serialize to a pretty-printed JSON string — the "single JSON document" contract.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the envelope to `path` as JSON.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = self.to_json()?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}

impl<T: DeserializeOwned> SnapshotEnvelope<T> {
    /// Parse an envelope from a JSON string, rejecting unsupported format versions.
    pub fn from_json(text: &str) -> Result<Self> {
        let envelope: Self = serde_json::from_str(text)?;
        if envelope.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                version: envelope.format_version,
                supported: SNAPSHOT_FORMAT_VERSION,
            });
        }
        Ok(envelope)
    }

    /// Read and parse an envelope from a JSON file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = std::fs::File::open(path)?;
        let mut text = String::new();
        file.read_to_string(&mut text)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Dummy {
        tick: u64,
        label: String,
    }

    #[test]
    fn round_trips_through_json() {
        let envelope = SnapshotEnvelope::new(Dummy {
            tick: 42,
            label: "hello".to_string(),
        });
        let text = envelope.to_json().expect("serialize");
        let restored: SnapshotEnvelope<Dummy> =
            SnapshotEnvelope::from_json(&text).expect("deserialize");
        assert_eq!(restored.payload, envelope.payload);
        assert_eq!(restored.format_version, SNAPSHOT_FORMAT_VERSION);
    }

    #[test]
    fn rejects_unsupported_version() {
        let text = r#"{"format_version": 999, "payload": {"tick": 1, "label": "x"}}"#;
        let result: Result<SnapshotEnvelope<Dummy>> = SnapshotEnvelope::from_json(text);
        assert!(matches!(
            result,
            Err(StorageError::UnsupportedVersion { version: 999, .. })
        ));
    }

    #[test]
    fn round_trip_through_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("hidra-snapshot-test-{}.json", std::process::id()));
        let envelope = SnapshotEnvelope::new(Dummy {
            tick: 7,
            label: "file".to_string(),
        });
        envelope.write_to_file(&path).expect("write");
        let restored: SnapshotEnvelope<Dummy> =
            SnapshotEnvelope::read_from_file(&path).expect("read");
        assert_eq!(restored.payload, envelope.payload);
        let _ = std::fs::remove_file(&path);
    }
}
