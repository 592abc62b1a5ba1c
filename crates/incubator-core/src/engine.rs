//! # Transition Engine
//!
//! State machine over the five catalog stages.
//!
//! Transitions only ever go to the immediately adjacent stage. Every
//! successful move appends exactly one [`StageHistoryEntry`] recording the
//! stage being left, sets the new current stage and recomputes progress.
//!
//! Blockers are read here, never cleared. A forward move with open
//! blockers is rejected; a backward move ignores them.

use crate::aggregate::{StageHistoryEntry, WorkflowAggregate};
use crate::ledger::non_empty;
use crate::primitives::MAX_NOTES_LENGTH;
use crate::system::{AuthorizationGate, StageCatalog, StageKey};
use crate::{Actor, Direction, Timestamp, WorkflowError};
use serde::{Deserialize, Serialize};

/// A requested stage move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub direction: Direction,
    /// Justification for the move. Required.
    pub notes: String,
    /// Version of the aggregate the caller based this request on.
    pub expected_version: u64,
}

impl TransitionRequest {
    #[must_use]
    pub fn forward(notes: impl Into<String>, expected_version: u64) -> Self {
        Self {
            direction: Direction::Forward,
            notes: notes.into(),
            expected_version,
        }
    }

    #[must_use]
    pub fn backward(notes: impl Into<String>, expected_version: u64) -> Self {
        Self {
            direction: Direction::Backward,
            notes: notes.into(),
            expected_version,
        }
    }
}

/// Validates and applies stage transitions.
pub struct TransitionEngine;

impl TransitionEngine {
    /// Decide where a request would move the aggregate, without mutating it.
    ///
    /// Preconditions, first failure wins:
    /// 1. `expected_version` matches ([`WorkflowError::Conflict`])
    /// 2. notes are non-empty ([`WorkflowError::Validation`])
    /// 3. the actor may act on the current stage ([`WorkflowError::Authorization`])
    /// 4. forward: stage is not terminal ([`WorkflowError::TerminalStage`]),
    ///    then no blockers remain ([`WorkflowError::BlockedTransition`])
    /// 5. backward: stage is not the first ([`WorkflowError::AlreadyAtFirstStage`])
    ///
    /// A missing actor fails step 3 exactly like a wrong role.
    pub fn plan<'a>(
        aggregate: &WorkflowAggregate,
        request: &TransitionRequest,
        actor: impl Into<Option<&'a Actor>>,
    ) -> Result<StageKey, WorkflowError> {
        Self::plan_for(aggregate, request, actor.into()).map(|(target, _)| target)
    }

    fn plan_for<'a>(
        aggregate: &WorkflowAggregate,
        request: &TransitionRequest,
        actor: Option<&'a Actor>,
    ) -> Result<(StageKey, &'a Actor), WorkflowError> {
        aggregate.ensure_version(request.expected_version)?;

        if non_empty(Some(request.notes.as_str()), MAX_NOTES_LENGTH).is_none() {
            return Err(WorkflowError::validation(&["notes"]));
        }

        let current = aggregate.current_stage();
        let actor = AuthorizationGate::authorize_actor(actor, current)?;

        let target = match request.direction {
            Direction::Forward => {
                if StageCatalog::is_terminal(current) {
                    return Err(WorkflowError::TerminalStage { stage: current });
                }
                if !aggregate.can_proceed() {
                    return Err(WorkflowError::BlockedTransition {
                        blockers: aggregate.blockers().to_vec(),
                    });
                }
                StageCatalog::next(current)
                    .ok_or(WorkflowError::TerminalStage { stage: current })?
            }
            Direction::Backward => {
                StageCatalog::previous(current).ok_or(WorkflowError::AlreadyAtFirstStage)?
            }
        };
        Ok((target, actor))
    }

    /// Apply a stage move to the aggregate.
    ///
    /// On failure the aggregate is left exactly as it was.
    pub fn request_transition<'a>(
        aggregate: &mut WorkflowAggregate,
        request: &TransitionRequest,
        actor: impl Into<Option<&'a Actor>>,
        now: Timestamp,
    ) -> Result<StageHistoryEntry, WorkflowError> {
        let (target, actor) = Self::plan_for(aggregate, request, actor.into())?;

        let entry = StageHistoryEntry {
            stage: aggregate.current_stage(),
            direction: request.direction,
            completed_at: now,
            completed_by: actor.id.clone(),
            notes: request.notes.trim().to_string(),
        };
        aggregate.apply_transition(target, entry.clone());
        Ok(entry)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockers::BlockerBoard;
    use crate::{AssessmentId, Role};
    use chrono::TimeZone;

    fn at() -> Timestamp {
        chrono::Utc
            .with_ymd_and_hms(2024, 5, 14, 16, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn admin() -> Actor {
        Actor::new("u-1", "Ari Admin", Role::Admin)
    }

    fn editor() -> Actor {
        Actor::new("u-2", "Eli Editor", Role::Editor)
    }

    fn aggregate_at(index: usize) -> WorkflowAggregate {
        let mut agg = WorkflowAggregate::new(AssessmentId::new("a-1"), "Acme Robotics");
        for _ in 0..index {
            let request = TransitionRequest::forward("setup", agg.version());
            TransitionEngine::request_transition(&mut agg, &request, &admin(), at())
                .expect("setup move");
        }
        agg
    }

    #[test]
    fn forward_from_technical_review() {
        let mut agg = aggregate_at(1);
        let history_len = agg.stage_history().len();
        let request = TransitionRequest::forward("Passed code review", agg.version());

        let entry = TransitionEngine::request_transition(&mut agg, &request, &editor(), at())
            .expect("transition");

        assert_eq!(agg.current_stage(), StageKey::FinancialReview);
        assert_eq!(agg.progress_percent(), 50);
        assert_eq!(agg.stage_history().len(), history_len + 1);
        assert_eq!(entry.stage, StageKey::TechnicalReview);
        assert_eq!(entry.completed_by.as_str(), "u-2");
        assert_eq!(entry.notes, "Passed code review");
    }

    #[test]
    fn blocked_forward_returns_blockers() {
        let mut agg = aggregate_at(1);
        let version = agg.version();
        BlockerBoard::add_blocker(&mut agg, "Missing financial model", &editor(), version)
            .expect("add blocker");
        let before = agg.clone();
        let request = TransitionRequest::forward("Passed code review", agg.version());

        let err = TransitionEngine::request_transition(&mut agg, &request, &editor(), at())
            .expect_err("must be blocked");

        assert_eq!(
            err,
            WorkflowError::BlockedTransition {
                blockers: vec!["Missing financial model".to_string()]
            }
        );
        assert_eq!(agg, before);
    }

    #[test]
    fn backward_ignores_blockers() {
        let mut agg = aggregate_at(2);
        let version = agg.version();
        BlockerBoard::add_blocker(&mut agg, "Cap table unclear", &editor(), version)
            .expect("add blocker");
        let request = TransitionRequest::backward("Needs another technical pass", agg.version());

        TransitionEngine::request_transition(&mut agg, &request, &editor(), at())
            .expect("backward move");

        assert_eq!(agg.current_stage(), StageKey::TechnicalReview);
        assert_eq!(agg.progress_percent(), 25);
        // blockers survive the move
        assert_eq!(agg.blockers(), &["Cap table unclear".to_string()]);
        assert!(!agg.can_proceed());
    }

    #[test]
    fn terminal_stage_rejects_forward() {
        let mut agg = aggregate_at(4);
        let before = agg.clone();
        let request = TransitionRequest::forward("Ship it", agg.version());

        let err = TransitionEngine::request_transition(&mut agg, &request, &admin(), at())
            .expect_err("terminal");

        assert_eq!(
            err,
            WorkflowError::TerminalStage {
                stage: StageKey::FinalApproval
            }
        );
        assert_eq!(agg, before);
    }

    #[test]
    fn first_stage_rejects_backward() {
        let mut agg = aggregate_at(0);
        let request = TransitionRequest::backward("Undo", 0);
        assert_eq!(
            TransitionEngine::request_transition(&mut agg, &request, &admin(), at()),
            Err(WorkflowError::AlreadyAtFirstStage)
        );
    }

    #[test]
    fn empty_notes_checked_before_authorization() {
        let agg = aggregate_at(4);
        let viewer = Actor::new("u-9", "Val Viewer", Role::Viewer);
        let request = TransitionRequest::forward("   ", agg.version());
        assert_eq!(
            TransitionEngine::plan(&agg, &request, &viewer),
            Err(WorkflowError::validation(&["notes"]))
        );
    }

    #[test]
    fn missing_actor_fails_like_wrong_role() {
        let agg = aggregate_at(1);
        let viewer = Actor::new("u-9", "Val Viewer", Role::Viewer);

        let empty_notes = TransitionRequest::forward("", agg.version());
        assert_eq!(
            TransitionEngine::plan(&agg, &empty_notes, None),
            TransitionEngine::plan(&agg, &empty_notes, &viewer)
        );

        let valid = TransitionRequest::forward("Looks good", agg.version());
        assert_eq!(
            TransitionEngine::plan(&agg, &valid, None),
            Err(WorkflowError::Authorization {
                stage: StageKey::TechnicalReview
            })
        );
        assert_eq!(
            TransitionEngine::plan(&agg, &valid, None),
            TransitionEngine::plan(&agg, &valid, &viewer)
        );
    }

    #[test]
    fn authorization_checked_before_terminal() {
        let agg = aggregate_at(4);
        let request = TransitionRequest::forward("Approve", agg.version());
        assert_eq!(
            TransitionEngine::plan(&agg, &request, &editor()),
            Err(WorkflowError::Authorization {
                stage: StageKey::FinalApproval
            })
        );
    }

    #[test]
    fn stale_version_checked_first() {
        let agg = aggregate_at(2);
        let request = TransitionRequest::forward("", 0);
        assert_eq!(
            TransitionEngine::plan(&agg, &request, &editor()),
            Err(WorkflowError::Conflict {
                expected: 0,
                actual: 2
            })
        );
    }
}
