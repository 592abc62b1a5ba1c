//! # Workflow Aggregate
//!
//! The per-assessment record: current stage, progress, blockers, score
//! ledger and stage history. This is the unit handed to and from the
//! persistence store.
//!
//! Fields are private. Mutation happens only through the scoring ledger,
//! the transition engine and the blocker board, which validate first and
//! then call the crate-internal mutators below. Each successful mutation
//! bumps `version` by exactly one.

use crate::ledger::{ScoreEntry, ScoreSummary, ScoringLedger};
use crate::system::{StageCatalog, StageKey};
use crate::{ActorId, AssessmentId, Direction, Timestamp, WorkflowError};
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE HISTORY
// =============================================================================

/// Audit record of one stage transition.
///
/// `stage` is the stage being *left*, not the one entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub stage: StageKey,
    pub direction: Direction,
    pub completed_at: Timestamp,
    pub completed_by: ActorId,
    pub notes: String,
}

// =============================================================================
// AGGREGATE
// =============================================================================

/// One startup assessment moving through the review pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAggregate {
    id: AssessmentId,
    startup_name: String,
    current_stage: StageKey,
    overall_progress: u8,
    scores: Vec<ScoreEntry>,
    stage_history: Vec<StageHistoryEntry>,
    can_proceed: bool,
    blockers: Vec<String>,
    version: u64,
}

impl WorkflowAggregate {
    /// Create a fresh assessment at the initial stage.
    #[must_use]
    pub fn new(id: AssessmentId, startup_name: impl Into<String>) -> Self {
        let stage = StageCatalog::initial();
        Self {
            id,
            startup_name: startup_name.into(),
            current_stage: stage,
            overall_progress: StageCatalog::progress_for(stage),
            scores: Vec::new(),
            stage_history: Vec::new(),
            can_proceed: true,
            blockers: Vec::new(),
            version: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> &AssessmentId {
        &self.id
    }

    #[must_use]
    pub fn startup_name(&self) -> &str {
        &self.startup_name
    }

    #[must_use]
    pub fn current_stage(&self) -> StageKey {
        self.current_stage
    }

    /// Overall progress, 0-100.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.overall_progress
    }

    /// Human label of the current stage.
    #[must_use]
    pub fn stage_label(&self) -> &'static str {
        StageCatalog::descriptor(self.current_stage).label
    }

    /// Scores in insertion order.
    #[must_use]
    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    /// Transitions in the order they happened.
    #[must_use]
    pub fn stage_history(&self) -> &[StageHistoryEntry] {
        &self.stage_history
    }

    #[must_use]
    pub fn blockers(&self) -> &[String] {
        &self.blockers
    }

    /// True iff there are no blockers.
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        self.can_proceed
    }

    /// Optimistic-concurrency version. Starts at 0.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn score_summary(&self) -> ScoreSummary {
        ScoringLedger::summarize(&self.scores)
    }

    /// Check the structural invariants of a decoded aggregate.
    ///
    /// Used when loading from storage or importing snapshots, where the
    /// bytes did not pass through the engine.
    pub fn verify(&self) -> Result<(), String> {
        if self.can_proceed != self.blockers.is_empty() {
            return Err(format!(
                "{}: can_proceed={} disagrees with {} blockers",
                self.id,
                self.can_proceed,
                self.blockers.len()
            ));
        }
        let expected = StageCatalog::progress_for(self.current_stage);
        if self.overall_progress != expected {
            return Err(format!(
                "{}: progress {} does not match stage {} ({})",
                self.id, self.overall_progress, self.current_stage, expected
            ));
        }
        let mutations = (self.stage_history.len() as u64).saturating_add(self.scores.len() as u64);
        if self.version < mutations {
            return Err(format!(
                "{}: version {} is below {} recorded mutations",
                self.id, self.version, mutations
            ));
        }
        Ok(())
    }

    // =========================================================================
    // CRATE-INTERNAL MUTATORS (called after validation)
    // =========================================================================

    /// Reject the operation if the caller read a different version.
    pub(crate) fn ensure_version(&self, expected: u64) -> Result<(), WorkflowError> {
        if expected != self.version {
            return Err(WorkflowError::Conflict {
                expected,
                actual: self.version,
            });
        }
        Ok(())
    }

    pub(crate) fn push_score(&mut self, entry: ScoreEntry) {
        self.scores.push(entry);
        self.bump_version();
    }

    /// Record `entry` and move to `target`. Blockers are left untouched.
    pub(crate) fn apply_transition(&mut self, target: StageKey, entry: StageHistoryEntry) {
        self.stage_history.push(entry);
        self.current_stage = target;
        self.overall_progress = StageCatalog::progress_for(target);
        self.bump_version();
    }

    pub(crate) fn push_blocker(&mut self, reason: String) {
        self.blockers.push(reason);
        self.sync_can_proceed();
        self.bump_version();
    }

    pub(crate) fn remove_blocker(&mut self, position: usize) {
        self.blockers.remove(position);
        self.sync_can_proceed();
        self.bump_version();
    }

    fn sync_can_proceed(&mut self) {
        self.can_proceed = self.blockers.is_empty();
    }

    fn bump_version(&mut self) {
        self.version = self.version.saturating_add(1);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_aggregate_starts_at_initial_stage() {
        let aggregate = WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme Robotics");
        assert_eq!(aggregate.current_stage(), StageKey::InitialScreening);
        assert_eq!(aggregate.progress_percent(), 0);
        assert_eq!(aggregate.stage_label(), "Initial Screening");
        assert!(aggregate.can_proceed());
        assert!(aggregate.stage_history().is_empty());
        assert_eq!(aggregate.version(), 0);
        assert!(aggregate.verify().is_ok());
    }

    #[test]
    fn blockers_drive_can_proceed() {
        let mut aggregate = WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme");
        aggregate.push_blocker("Missing financial model".to_string());
        assert!(!aggregate.can_proceed());
        assert_eq!(aggregate.version(), 1);

        aggregate.remove_blocker(0);
        assert!(aggregate.can_proceed());
        assert_eq!(aggregate.version(), 2);
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let mut aggregate = WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme");
        aggregate.push_blocker("x".to_string());
        assert_eq!(
            aggregate.ensure_version(0),
            Err(WorkflowError::Conflict {
                expected: 0,
                actual: 1
            })
        );
        assert!(aggregate.ensure_version(1).is_ok());
    }

    #[test]
    fn verify_detects_inconsistent_progress() {
        let mut aggregate = WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme");
        aggregate.overall_progress = 40;
        assert!(aggregate.verify().is_err());
    }
}
