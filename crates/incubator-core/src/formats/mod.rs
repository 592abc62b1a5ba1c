//! # Formats Module
//!
//! File formats for moving aggregates between stores. File I/O lives in
//! the app layer; everything here is a pure byte transformation.

pub mod snapshot;

pub use snapshot::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};

#[cfg(feature = "crypto-hash")]
pub use snapshot::snapshot_digest;
