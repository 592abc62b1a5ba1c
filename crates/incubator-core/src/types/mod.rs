//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the workflow engine:
//! - Identifiers (`AssessmentId`, `ActorId`)
//! - Identity supplied by the external auth provider (`Role`, `Actor`)
//! - Transition direction (`Direction`)
//! - Error types (`WorkflowError`, `StoreError`)
//!
//! Nothing here reads ambient state. Every caller identity and every
//! timestamp enters the engine as an explicit parameter.

use crate::system::StageKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Point in time used for audit stamps.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of an assessment (one startup passing through review).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

impl AssessmentId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a person acting on an assessment, as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ROLES & ACTORS
// =============================================================================

/// Closed set of portal roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Reviewer,
    Analyst,
    Viewer,
}

impl Role {
    /// All roles, in privilege order.
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Editor,
        Role::Reviewer,
        Role::Analyst,
        Role::Viewer,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Reviewer => "reviewer",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| WorkflowError::UnknownRole(s.to_string()))
    }
}

/// The identity (with its role) requesting a scoring or transition operation.
///
/// The engine trusts this value; credential verification happens upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: ActorId::new(id),
            name: name.into(),
            role,
        }
    }
}

// =============================================================================
// DIRECTION
// =============================================================================

/// Direction of a stage move. Moves are always to the adjacent stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("forward"),
            Direction::Backward => f.write_str("backward"),
        }
    }
}

impl FromStr for Direction {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "advance" | "next" => Ok(Direction::Forward),
            "backward" | "retreat" | "back" => Ok(Direction::Backward),
            _ => Err(WorkflowError::Validation {
                missing_fields: vec!["direction".to_string()],
            }),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Rejected workflow operations.
///
/// Every variant is an expected, user-facing outcome. A rejected operation
/// never leaves a partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// A required field is missing, empty, or out of range.
    #[error("Validation failed: {} required", missing_fields.join(", "))]
    Validation { missing_fields: Vec<String> },

    /// The actor may not act on the assessment's current stage.
    ///
    /// Unauthenticated callers and callers with the wrong role receive this
    /// same variant.
    #[error("Insufficient permission to act on stage '{stage}'")]
    Authorization { stage: StageKey },

    /// Forward move attempted from the last stage.
    #[error("Stage '{stage}' is terminal; no forward transition exists")]
    TerminalStage { stage: StageKey },

    /// Forward move attempted while blockers remain.
    #[error("Transition blocked: {}", blockers.join("; "))]
    BlockedTransition { blockers: Vec<String> },

    /// Backward move attempted from the first stage.
    #[error("Assessment is already at the first stage")]
    AlreadyAtFirstStage,

    /// The caller read a stale version of the aggregate.
    #[error("Version conflict: expected {expected}, current is {actual}")]
    Conflict { expected: u64, actual: u64 },

    /// A stage key string did not match any catalog entry.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// A role string did not match the closed role set.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A blocker to resolve was not present on the aggregate.
    #[error("Blocker not found: {0}")]
    BlockerNotFound(String),
}

impl WorkflowError {
    /// Stable machine-readable tag for each variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation { .. } => "validation",
            WorkflowError::Authorization { .. } => "authorization",
            WorkflowError::TerminalStage { .. } => "terminal_stage",
            WorkflowError::BlockedTransition { .. } => "blocked_transition",
            WorkflowError::AlreadyAtFirstStage => "already_at_first_stage",
            WorkflowError::Conflict { .. } => "conflict",
            WorkflowError::UnknownStage(_) => "unknown_stage",
            WorkflowError::UnknownRole(_) => "unknown_role",
            WorkflowError::BlockerNotFound(_) => "blocker_not_found",
        }
    }

    pub(crate) fn validation(fields: &[&str]) -> Self {
        WorkflowError::Validation {
            missing_fields: fields.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}

/// Failures at the persistence boundary.
///
/// These are not domain outcomes; they are kept apart from `WorkflowError`
/// so callers can tell "the request was rejected" from "the store broke".
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored bytes could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// `create` was called for an id that is already stored.
    #[error("Assessment already exists: {0}")]
    AlreadyExists(AssessmentId),
}

// =============================================================================
// TESTS
// =============================================================================
