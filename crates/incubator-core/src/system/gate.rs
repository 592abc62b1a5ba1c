//! # Authorization Gate
//!
//! Decides whether a role may view or act on a stage.
//!
//! The gate is a hard engine-side check. It is consulted before every
//! transition and every score submission against the assessment's
//! *current* stage.

use crate::system::{StageCatalog, StageKey};
use crate::{Actor, Role, WorkflowError};

/// Level of access a role has to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Access {
    /// May read the assessment and its history.
    View,
    /// May score, transition and manage blockers.
    Act,
}

/// Role-based gate over the stage catalog.
pub struct AuthorizationGate;

impl AuthorizationGate {
    /// Access level of `role` on `stage`.
    ///
    /// Every role in the closed set may view every stage.
    #[must_use]
    pub fn access(role: Role, stage: StageKey) -> Access {
        if StageCatalog::descriptor(stage).required_roles.contains(&role) {
            Access::Act
        } else {
            Access::View
        }
    }

    /// True iff `role` is among the stage's required roles.
    #[must_use]
    pub fn can_act(role: Role, stage: StageKey) -> bool {
        Self::access(role, stage) == Access::Act
    }

    /// True iff `role` may see the stage read-only.
    ///
    /// Holds for every role: no stage is hidden from a recognized caller.
    #[must_use]
    pub fn can_view(role: Role, stage: StageKey) -> bool {
        Self::access(role, stage) >= Access::View
    }

    /// Require act access, failing with [`WorkflowError::Authorization`].
    ///
    /// `None` stands for an unauthenticated caller and is rejected with the
    /// same error as a wrong role.
    pub fn authorize(role: Option<Role>, stage: StageKey) -> Result<(), WorkflowError> {
        match role {
            Some(role) if Self::can_act(role, stage) => Ok(()),
            _ => Err(WorkflowError::Authorization { stage }),
        }
    }

    /// [`Self::authorize`] for an optional actor, handing the actor back on success.
    pub fn authorize_actor(
        actor: Option<&Actor>,
        stage: StageKey,
    ) -> Result<&Actor, WorkflowError> {
        Self::authorize(actor.map(|a| a.role), stage)?;
        actor.ok_or(WorkflowError::Authorization { stage })
    }
}

// =============================================================================
// TESTS
// =============================================================================
