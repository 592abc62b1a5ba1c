//! # incubator-core
//!
//! The assessment stage workflow engine - THE LOGIC.
//!
//! A startup assessment advances through five fixed review stages. This
//! crate decides who may act at each stage, requires a justification for
//! every move, keeps an append-only audit trail of transitions, and
//! accumulates independent scoring records.
//!
//! ## Components (leaves first)
//!
//! - `system` - stage catalog and authorization gate (static, stateless)
//! - `ledger` - append-only score entries
//! - `engine` - adjacent-only stage transitions
//! - `blockers` - explicit blocker management
//! - `aggregate` - the per-assessment record
//! - `storage` / `formats` - persistence adapters and snapshot files
//! - `pipeline` - load -> engine -> save -> notify
//!
//! ## Architectural Constraints
//!
//! - No async, no network, no logging: the app layer owns all of that
//! - No ambient identity or clock: actor and timestamp are parameters
//! - Integer arithmetic only
//! - Every rejected operation leaves the aggregate byte-for-byte unchanged

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod blockers;
pub mod engine;
pub mod formats;
pub mod ledger;
pub mod notify;
pub mod pipeline;
pub mod primitives;
pub mod storage;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    Actor, ActorId, AssessmentId, Direction, Role, StoreError, Timestamp, WorkflowError,
};

// =============================================================================
// RE-EXPORTS: Workflow
// =============================================================================

pub use aggregate::{StageHistoryEntry, WorkflowAggregate};
pub use blockers::BlockerBoard;
pub use engine::{TransitionEngine, TransitionRequest};
pub use ledger::{ScoreCandidate, ScoreEntry, ScoreSummary, ScoringLedger};
pub use notify::{NoopNotifier, Notifier};
pub use pipeline::{Outcome, Pipeline, PipelineError};
pub use system::{
    Access, AuthorizationGate, STAGE_COUNT, StageCatalog, StageDescriptor, StageKey,
};

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use formats::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
pub use storage::{AssessmentStore, MemoryStore, RedbStore, StorageBackend};
