//! # Blocker Board
//!
//! Explicit blocker management. Transitions only read blockers; this is
//! the one place they are added or resolved, so an unresolved issue is
//! never hidden by a stage move.

use crate::aggregate::WorkflowAggregate;
use crate::ledger::non_empty;
use crate::primitives::{MAX_BLOCKERS, MAX_BLOCKER_LENGTH};
use crate::system::AuthorizationGate;
use crate::{Actor, WorkflowError};

/// Adds and resolves blocking reasons on an aggregate.
pub struct BlockerBoard;

impl BlockerBoard {
    /// Record a new blocker. Returns the stored (trimmed) reason.
    ///
    /// Rejects stale versions, empty or duplicate reasons, and actors who
    /// may not act on the current stage (a missing actor included).
    pub fn add_blocker<'a>(
        aggregate: &mut WorkflowAggregate,
        reason: &str,
        actor: impl Into<Option<&'a Actor>>,
        expected_version: u64,
    ) -> Result<String, WorkflowError> {
        aggregate.ensure_version(expected_version)?;

        let reason = non_empty(Some(reason), MAX_BLOCKER_LENGTH)
            .filter(|r| !aggregate.blockers().contains(r))
            .ok_or_else(|| WorkflowError::validation(&["reason"]))?;
        if aggregate.blockers().len() >= MAX_BLOCKERS {
            return Err(WorkflowError::validation(&["reason"]));
        }

        AuthorizationGate::authorize_actor(actor.into(), aggregate.current_stage())?;

        aggregate.push_blocker(reason.clone());
        Ok(reason)
    }

    /// Resolve (remove) an existing blocker by its exact reason text.
    pub fn resolve_blocker<'a>(
        aggregate: &mut WorkflowAggregate,
        reason: &str,
        actor: impl Into<Option<&'a Actor>>,
        expected_version: u64,
    ) -> Result<String, WorkflowError> {
        aggregate.ensure_version(expected_version)?;

        let wanted = reason.trim();
        if wanted.is_empty() {
            return Err(WorkflowError::validation(&["reason"]));
        }

        AuthorizationGate::authorize_actor(actor.into(), aggregate.current_stage())?;

        let position = aggregate
            .blockers()
            .iter()
            .position(|b| b == wanted)
            .ok_or_else(|| WorkflowError::BlockerNotFound(wanted.to_string()))?;

        aggregate.remove_blocker(position);
        Ok(wanted.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
