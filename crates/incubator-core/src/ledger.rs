//! # Scoring Ledger
//!
//! Append-only collection of review scores attached to an assessment.
//!
//! Scores are independent of stage position: adding one never changes the
//! current stage, progress or blockers. Entries are immutable once written
//! and are never reordered or removed.

use crate::aggregate::WorkflowAggregate;
use crate::primitives::{DEFAULT_MAX_SCORE, MAX_CATEGORY_LENGTH, MAX_NOTES_LENGTH};
use crate::system::AuthorizationGate;
use crate::{Actor, ActorId, Timestamp, WorkflowError};
use serde::{Deserialize, Serialize};

// =============================================================================
// ENTRY TYPES
// =============================================================================

/// A score as submitted by a reviewer, before validation.
///
/// Every field is optional so that a missing field surfaces as a
/// [`WorkflowError::Validation`] naming it, not as a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCandidate {
    pub category: Option<String>,
    pub score: Option<i64>,
    pub max_score: Option<i64>,
    pub comments: Option<String>,
}

impl ScoreCandidate {
    /// Candidate with every field present and the default maximum.
    #[must_use]
    pub fn new(category: impl Into<String>, score: i64, comments: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            score: Some(score),
            max_score: None,
            comments: Some(comments.into()),
        }
    }

    #[must_use]
    pub fn with_max_score(mut self, max_score: i64) -> Self {
        self.max_score = Some(max_score);
        self
    }
}

/// One immutable review rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub category: String,
    pub score: u32,
    pub max_score: u32,
    pub comments: String,
    pub reviewer_id: ActorId,
    pub reviewer_name: String,
    pub reviewed_at: Timestamp,
}

impl ScoreEntry {
    /// Score as a rounded percentage of its maximum.
    #[must_use]
    pub fn percent(&self) -> u8 {
        let max = u64::from(self.max_score.max(1));
        let score = u64::from(self.score.min(self.max_score));
        ((200 * score + max) / (2 * max)) as u8
    }
}

/// Aggregate view of a score ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: usize,
    /// Rounded mean of per-entry percentages. `None` when there are no entries.
    pub average_percent: Option<u8>,
}

/// Validated score fields.
struct ValidScore {
    category: String,
    score: u32,
    max_score: u32,
    comments: String,
}

// =============================================================================
// SCORING LEDGER
// =============================================================================

/// Validates and appends score entries.
pub struct ScoringLedger;

impl ScoringLedger {
    /// Validate a candidate without touching any aggregate.
    ///
    /// All failing fields are reported together.
    pub fn validate(candidate: &ScoreCandidate) -> Result<(), WorkflowError> {
        Self::check(candidate).map(|_| ())
    }

    /// Append a score to the aggregate's ledger.
    ///
    /// Checked in order, first failure wins, nothing is written on failure:
    /// 1. `expected_version` matches ([`WorkflowError::Conflict`])
    /// 2. required fields present and in range ([`WorkflowError::Validation`])
    /// 3. reviewer may act on the current stage ([`WorkflowError::Authorization`]);
    ///    a missing reviewer fails here too
    pub fn add_score<'a>(
        aggregate: &mut WorkflowAggregate,
        candidate: &ScoreCandidate,
        reviewer: impl Into<Option<&'a Actor>>,
        expected_version: u64,
        now: Timestamp,
    ) -> Result<ScoreEntry, WorkflowError> {
        aggregate.ensure_version(expected_version)?;
        let valid = Self::check(candidate)?;
        let reviewer =
            AuthorizationGate::authorize_actor(reviewer.into(), aggregate.current_stage())?;

        let entry = ScoreEntry {
            category: valid.category,
            score: valid.score,
            max_score: valid.max_score,
            comments: valid.comments,
            reviewer_id: reviewer.id.clone(),
            reviewer_name: reviewer.name.clone(),
            reviewed_at: now,
        };
        aggregate.push_score(entry.clone());
        Ok(entry)
    }

    /// Summarize a ledger.
    #[must_use]
    pub fn summarize(scores: &[ScoreEntry]) -> ScoreSummary {
        let count = scores.len();
        if count == 0 {
            return ScoreSummary {
                count,
                average_percent: None,
            };
        }
        let total: u64 = scores.iter().map(|s| u64::from(s.percent())).sum();
        let n = count as u64;
        ScoreSummary {
            count,
            average_percent: Some(((2 * total + n) / (2 * n)) as u8),
        }
    }

    fn check(candidate: &ScoreCandidate) -> Result<ValidScore, WorkflowError> {
        let mut missing: Vec<&str> = Vec::new();

        let category = non_empty(candidate.category.as_deref(), MAX_CATEGORY_LENGTH);
        if category.is_none() {
            missing.push("category");
        }

        let max_score = match candidate.max_score {
            None => Some(DEFAULT_MAX_SCORE),
            Some(m) => u32::try_from(m).ok().filter(|m| *m > 0),
        };
        if max_score.is_none() {
            missing.push("max_score");
        }

        let score = candidate
            .score
            .and_then(|s| u32::try_from(s).ok())
            .filter(|s| max_score.is_none_or(|max| *s <= max));
        if score.is_none() {
            missing.push("score");
        }

        let comments = non_empty(candidate.comments.as_deref(), MAX_NOTES_LENGTH);
        if comments.is_none() {
            missing.push("comments");
        }

        match (category, score, max_score, comments) {
            (Some(category), Some(score), Some(max_score), Some(comments)) => Ok(ValidScore {
                category,
                score,
                max_score,
                comments,
            }),
            _ => Err(WorkflowError::validation(&missing)),
        }
    }
}

/// Trimmed, non-empty, length-bounded text.
pub(crate) fn non_empty(value: Option<&str>, max_len: usize) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= max_len)
        .map(str::to_string)
}

// =============================================================================
// TESTS
// =============================================================================
