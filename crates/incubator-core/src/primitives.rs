//! # Innate Primitives
//!
//! Hardcoded runtime constants for the assessment workflow.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Default upper bound for a score when the reviewer does not supply one.
pub const DEFAULT_MAX_SCORE: u32 = 100;

/// Maximum length of a score category label (bytes).
pub const MAX_CATEGORY_LENGTH: usize = 256;

/// Maximum length of free-text comments and transition notes (bytes).
pub const MAX_NOTES_LENGTH: usize = 65_536;

/// Maximum length of a single blocker reason (bytes).
pub const MAX_BLOCKER_LENGTH: usize = 1024;

/// Maximum number of open blockers on one assessment.
pub const MAX_BLOCKERS: usize = 64;

/// Magic bytes for the snapshot file header.
pub const MAGIC_BYTES: &[u8; 4] = b"INCB";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;
