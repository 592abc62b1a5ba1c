//! # Pipeline
//!
//! The service boundary of the engine. Each mutating call is one atomic
//! read-modify-write:
//!
//! ```text
//! load -> engine op on a working copy -> save -> notify
//! ```
//!
//! Validation always completes before the write, so a rejected request
//! leaves the stored aggregate untouched. Notifiers run only after a
//! successful save.

use crate::aggregate::{StageHistoryEntry, WorkflowAggregate};
use crate::blockers::BlockerBoard;
use crate::engine::{TransitionEngine, TransitionRequest};
use crate::formats::{snapshot_from_bytes, snapshot_to_bytes};
use crate::ledger::{ScoreCandidate, ScoreEntry, ScoringLedger};
use crate::notify::{NoopNotifier, Notifier};
use crate::storage::{AssessmentStore, StorageBackend};
use crate::{Actor, AssessmentId, StoreError, Timestamp, WorkflowError};
use thiserror::Error;

/// Errors surfaced by the pipeline.
///
/// Domain rejections and store failures stay distinct.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request was rejected by the workflow rules.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The persistence collaborator failed.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// No assessment with this id exists.
    #[error("Assessment not found: {0}")]
    NotFound(AssessmentId),
}

/// Result of a successful mutation: the saved aggregate and the record it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub aggregate: WorkflowAggregate,
    pub record: T,
}

/// Workflow service over a store and a notifier.
pub struct Pipeline<S: AssessmentStore = StorageBackend, N: Notifier = NoopNotifier> {
    store: S,
    notifier: N,
    clock: fn() -> Timestamp,
}

impl<S: AssessmentStore + std::fmt::Debug, N: Notifier> std::fmt::Debug for Pipeline<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S: AssessmentStore> Pipeline<S, NoopNotifier> {
    /// Pipeline without a notifier.
    #[must_use]
    pub fn with_store(store: S) -> Self {
        Self::new(store, NoopNotifier)
    }
}

impl<S: AssessmentStore, N: Notifier> Pipeline<S, N> {
    #[must_use]
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            clock: chrono::Utc::now,
        }
    }

    /// Replace the wall clock (tests, replays).
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Load an assessment.
    pub fn get(&self, id: &AssessmentId) -> Result<WorkflowAggregate, PipelineError> {
        self.store
            .load(id)?
            .ok_or_else(|| PipelineError::NotFound(id.clone()))
    }

    /// All assessments, ordered by id.
    pub fn list(&self) -> Result<Vec<WorkflowAggregate>, PipelineError> {
        Ok(self.store.list()?)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Enter a new assessment into the pipeline at the initial stage.
    pub fn open(
        &mut self,
        id: AssessmentId,
        startup_name: &str,
    ) -> Result<WorkflowAggregate, PipelineError> {
        let mut missing = Vec::new();
        if id.as_str().trim().is_empty() {
            missing.push("id".to_string());
        }
        if startup_name.trim().is_empty() {
            missing.push("startup_name".to_string());
        }
        if !missing.is_empty() {
            return Err(WorkflowError::Validation {
                missing_fields: missing,
            }
            .into());
        }

        let aggregate = WorkflowAggregate::new(id, startup_name.trim());
        self.store.create(&aggregate)?;
        Ok(aggregate)
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================
    //
    // The acting identity is optional: a missing actor is rejected by the
    // authorization gate at the same step as an actor with the wrong role.

    /// Append a score entry.
    pub fn add_score<'a>(
        &mut self,
        id: &AssessmentId,
        candidate: &ScoreCandidate,
        reviewer: impl Into<Option<&'a Actor>>,
        expected_version: u64,
    ) -> Result<Outcome<ScoreEntry>, PipelineError> {
        let reviewer = reviewer.into();
        let outcome = self.mutate(id, |aggregate, now| {
            ScoringLedger::add_score(aggregate, candidate, reviewer, expected_version, now)
        })?;
        self.notifier.on_score(&outcome.aggregate, &outcome.record);
        Ok(outcome)
    }

    /// Move an assessment one stage forward or backward.
    pub fn request_transition<'a>(
        &mut self,
        id: &AssessmentId,
        request: &TransitionRequest,
        actor: impl Into<Option<&'a Actor>>,
    ) -> Result<Outcome<StageHistoryEntry>, PipelineError> {
        let actor = actor.into();
        let outcome = self.mutate(id, |aggregate, now| {
            TransitionEngine::request_transition(aggregate, request, actor, now)
        })?;
        self.notifier
            .on_transition(&outcome.aggregate, &outcome.record);
        Ok(outcome)
    }

    /// Record a blocker.
    pub fn add_blocker<'a>(
        &mut self,
        id: &AssessmentId,
        reason: &str,
        actor: impl Into<Option<&'a Actor>>,
        expected_version: u64,
    ) -> Result<Outcome<String>, PipelineError> {
        let actor = actor.into();
        let outcome = self.mutate(id, |aggregate, _| {
            BlockerBoard::add_blocker(aggregate, reason, actor, expected_version)
        })?;
        self.notifier.on_blockers_changed(&outcome.aggregate);
        Ok(outcome)
    }

    /// Resolve a blocker.
    pub fn resolve_blocker<'a>(
        &mut self,
        id: &AssessmentId,
        reason: &str,
        actor: impl Into<Option<&'a Actor>>,
        expected_version: u64,
    ) -> Result<Outcome<String>, PipelineError> {
        let actor = actor.into();
        let outcome = self.mutate(id, |aggregate, _| {
            BlockerBoard::resolve_blocker(aggregate, reason, actor, expected_version)
        })?;
        self.notifier.on_blockers_changed(&outcome.aggregate);
        Ok(outcome)
    }

    fn mutate<T>(
        &mut self,
        id: &AssessmentId,
        op: impl FnOnce(&mut WorkflowAggregate, Timestamp) -> Result<T, WorkflowError>,
    ) -> Result<Outcome<T>, PipelineError> {
        let mut aggregate = self.get(id)?;
        let record = op(&mut aggregate, (self.clock)())?;
        self.store.save(&aggregate)?;
        Ok(Outcome { aggregate, record })
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Encode every stored aggregate as a snapshot file.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(snapshot_to_bytes(&self.store.list()?)?)
    }

    /// Save every aggregate from a snapshot, replacing same-id entries.
    ///
    /// The whole snapshot is decoded and verified (ids unique) before
    /// anything is saved, then written with [`AssessmentStore::save_all`]:
    /// one transaction on redb, all-or-nothing in memory.
    pub fn import_snapshot(&mut self, bytes: &[u8]) -> Result<usize, PipelineError> {
        let aggregates = snapshot_from_bytes(bytes)?;
        self.store.save_all(&aggregates)?;
        Ok(aggregates.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
