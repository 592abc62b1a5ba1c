//! # Snapshot Format
//!
//! Binary export/import of every aggregate in a store.
//!
//! Format: Header (5 bytes) + postcard-serialized `Vec<WorkflowAggregate>`.
//! - 4 bytes: Magic ("INCB")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, every
//! decoded aggregate must pass [`WorkflowAggregate::verify`], and ids must be
//! unique within one snapshot.

use crate::{StoreError, WorkflowAggregate, primitives};
use std::collections::BTreeSet;

/// Maximum accepted snapshot size (bytes).
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024; // 256 MB

/// Header length in bytes.
const HEADER_LEN: usize = 5;

/// The snapshot header precedes the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate magic and version.
    pub fn validate(&self) -> Result<(), StoreError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(StoreError::Serialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(StoreError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::Serialization("Header too short".to_string()));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize aggregates to snapshot bytes (header + payload).
pub fn snapshot_to_bytes(aggregates: &[WorkflowAggregate]) -> Result<Vec<u8>, StoreError> {
    let payload =
        postcard::to_stdvec(aggregates).map_err(|e| StoreError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize aggregates from snapshot bytes.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Vec<WorkflowAggregate>, StoreError> {
    if bytes.len() < HEADER_LEN {
        return Err(StoreError::Serialization(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(StoreError::Serialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    SnapshotHeader::from_bytes(bytes)?.validate()?;

    let aggregates: Vec<WorkflowAggregate> = postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| StoreError::Serialization(format!("Failed to decode snapshot: {}", e)))?;

    let mut seen = BTreeSet::new();
    for aggregate in &aggregates {
        aggregate.verify().map_err(StoreError::Serialization)?;
        if !seen.insert(aggregate.id()) {
            return Err(StoreError::Serialization(format!(
                "Duplicate assessment id in snapshot: {}",
                aggregate.id()
            )));
        }
    }
    Ok(aggregates)
}

/// BLAKE3 digest of snapshot bytes, hex encoded.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// TESTS
// =============================================================================
