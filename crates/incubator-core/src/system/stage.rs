//! # Stage Catalog
//!
//! The five review stages an assessment passes through, in fixed order.
//!
//! | Index | Key | Label | Roles that may act |
//! |-------|-----|-------|--------------------|
//! | 0 | `initial-screening` | Initial Screening | admin, editor, reviewer |
//! | 1 | `technical-review` | Technical Review | admin, editor, reviewer |
//! | 2 | `financial-review` | Financial Review | admin, editor, analyst |
//! | 3 | `due-diligence` | Due Diligence | admin, editor, analyst |
//! | 4 | `final-approval` | Final Approval | admin |
//!
//! Index 0 is the only valid initial stage. The last index is terminal.
//! Progress maps linearly onto the indices: 0, 25, 50, 75, 100.

use crate::{Role, WorkflowError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of review stages.
pub const STAGE_COUNT: usize = 5;

// =============================================================================
// STAGE KEY
// =============================================================================

/// Review stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKey {
    InitialScreening,
    TechnicalReview,
    FinancialReview,
    DueDiligence,
    FinalApproval,
}

impl StageKey {
    /// Get the stable string key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            StageKey::InitialScreening => "initial-screening",
            StageKey::TechnicalReview => "technical-review",
            StageKey::FinancialReview => "financial-review",
            StageKey::DueDiligence => "due-diligence",
            StageKey::FinalApproval => "final-approval",
        }
    }

    /// Get the position of this stage in the catalog.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            StageKey::InitialScreening => 0,
            StageKey::TechnicalReview => 1,
            StageKey::FinancialReview => 2,
            StageKey::DueDiligence => 3,
            StageKey::FinalApproval => 4,
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKey {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageCatalog::parse_key(s)
    }
}

// =============================================================================
// STAGE DESCRIPTOR
// =============================================================================

/// Static description of one review stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageDescriptor {
    pub key: StageKey,
    pub label: &'static str,
    pub description: &'static str,
    /// Roles permitted to act on this stage. Never empty.
    pub required_roles: &'static [Role],
}

static STAGES: [StageDescriptor; STAGE_COUNT] = [
    StageDescriptor {
        key: StageKey::InitialScreening,
        label: "Initial Screening",
        description: "Eligibility check of the application against program criteria",
        required_roles: &[Role::Admin, Role::Editor, Role::Reviewer],
    },
    StageDescriptor {
        key: StageKey::TechnicalReview,
        label: "Technical Review",
        description: "Evaluation of product, architecture and technical feasibility",
        required_roles: &[Role::Admin, Role::Editor, Role::Reviewer],
    },
    StageDescriptor {
        key: StageKey::FinancialReview,
        label: "Financial Review",
        description: "Review of the financial model, burn rate and funding request",
        required_roles: &[Role::Admin, Role::Editor, Role::Analyst],
    },
    StageDescriptor {
        key: StageKey::DueDiligence,
        label: "Due Diligence",
        description: "Verification of legal, team and market claims",
        required_roles: &[Role::Admin, Role::Editor, Role::Analyst],
    },
    StageDescriptor {
        key: StageKey::FinalApproval,
        label: "Final Approval",
        description: "Committee decision on admission and funding",
        required_roles: &[Role::Admin],
    },
];

// =============================================================================
// STAGE CATALOG
// =============================================================================

/// Read-only lookup over the compiled-in stage list.
pub struct StageCatalog;

impl StageCatalog {
    /// Ordered list of all stage descriptors.
    #[must_use]
    pub fn stages() -> &'static [StageDescriptor] {
        &STAGES
    }

    /// Position of a stage in the catalog.
    #[must_use]
    pub fn index_of(key: StageKey) -> usize {
        key.index()
    }

    /// Position of a stage given its string key.
    pub fn index_of_str(key: &str) -> Result<usize, WorkflowError> {
        Self::parse_key(key).map(Self::index_of)
    }

    /// Parse a string key (`"due-diligence"`) into a [`StageKey`].
    pub fn parse_key(key: &str) -> Result<StageKey, WorkflowError> {
        let trimmed = key.trim();
        STAGES
            .iter()
            .find(|d| d.key.as_str() == trimmed)
            .map(|d| d.key)
            .ok_or_else(|| WorkflowError::UnknownStage(key.to_string()))
    }

    /// Stage at a catalog position, if in range.
    #[must_use]
    pub fn at(index: usize) -> Option<StageKey> {
        STAGES.get(index).map(|d| d.key)
    }

    /// Full descriptor for a stage.
    #[must_use]
    pub fn descriptor(key: StageKey) -> &'static StageDescriptor {
        &STAGES[key.index()]
    }

    /// The only valid initial stage.
    #[must_use]
    pub fn initial() -> StageKey {
        STAGES[0].key
    }

    /// True only for the last stage.
    #[must_use]
    pub fn is_terminal(key: StageKey) -> bool {
        key.index() == STAGE_COUNT - 1
    }

    /// Adjacent stage after `key`, if any.
    #[must_use]
    pub fn next(key: StageKey) -> Option<StageKey> {
        Self::at(key.index().saturating_add(1))
    }

    /// Adjacent stage before `key`, if any.
    #[must_use]
    pub fn previous(key: StageKey) -> Option<StageKey> {
        key.index().checked_sub(1).and_then(Self::at)
    }

    /// Overall progress for a stage index: `round(100 * index / (count - 1))`.
    ///
    /// Integer arithmetic only; indices past the end clamp to 100.
    #[must_use]
    pub fn progress_for_index(index: usize) -> u8 {
        let last = (STAGE_COUNT - 1) as u64;
        let index = (index as u64).min(last);
        // round-half-up of 100 * index / last
        ((200 * index + last) / (2 * last)) as u8
    }

    /// Overall progress for a stage.
    #[must_use]
    pub fn progress_for(key: StageKey) -> u8 {
        Self::progress_for_index(key.index())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_is_fixed() {
        let keys: Vec<&str> = StageCatalog::stages()
            .iter()
            .map(|d| d.key.as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "initial-screening",
                "technical-review",
                "financial-review",
                "due-diligence",
                "final-approval",
            ]
        );
    }

    #[test]
    fn descriptor_index_matches_key_index() {
        for (i, descriptor) in StageCatalog::stages().iter().enumerate() {
            assert_eq!(descriptor.key.index(), i);
            assert!(!descriptor.required_roles.is_empty());
        }
    }

    #[test]
    fn index_of_str_unknown_stage() {
        assert_eq!(StageCatalog::index_of_str("due-diligence"), Ok(3));
        assert_eq!(
            StageCatalog::index_of_str("board-vote"),
            Err(WorkflowError::UnknownStage("board-vote".to_string()))
        );
    }

    #[test]
    fn only_last_stage_is_terminal() {
        for descriptor in StageCatalog::stages() {
            assert_eq!(
                StageCatalog::is_terminal(descriptor.key),
                descriptor.key == StageKey::FinalApproval
            );
        }
    }

    #[test]
    fn adjacency() {
        assert_eq!(StageCatalog::previous(StageKey::InitialScreening), None);
        assert_eq!(StageCatalog::next(StageKey::FinalApproval), None);
        assert_eq!(
            StageCatalog::next(StageKey::TechnicalReview),
            Some(StageKey::FinancialReview)
        );
        assert_eq!(
            StageCatalog::previous(StageKey::TechnicalReview),
            Some(StageKey::InitialScreening)
        );
    }

    #[test]
    fn progress_is_linear() {
        let progress: Vec<u8> = (0..STAGE_COUNT)
            .map(StageCatalog::progress_for_index)
            .collect();
        assert_eq!(progress, vec![0, 25, 50, 75, 100]);
        assert_eq!(StageCatalog::progress_for_index(99), 100);
    }

    #[test]
    fn stage_display() {
        assert_eq!(format!("{}", StageKey::DueDiligence), "due-diligence");
        assert_eq!(StageCatalog::descriptor(StageKey::DueDiligence).label, "Due Diligence");
    }
}
