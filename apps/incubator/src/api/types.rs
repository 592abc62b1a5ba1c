//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Request bodies keep every field optional so that missing values surface
//! as a workflow validation error (400 with `missing_fields`) rather than a
//! JSON decoding failure.

use incubator_core::{
    AssessmentId, Direction, Role, STAGE_COUNT, ScoreCandidate, ScoreEntry, ScoreSummary,
    StageCatalog, StageDescriptor, StageHistoryEntry, StageKey, TransitionRequest,
    WorkflowAggregate, WorkflowError,
};
use serde::{Deserialize, Serialize};

use super::identity::Caller;

/// Require an `expected_version` field.
fn require_version(expected_version: Option<u64>) -> Result<u64, WorkflowError> {
    expected_version.ok_or_else(|| WorkflowError::Validation {
        missing_fields: vec!["expected_version".to_string()],
    })
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STAGE RESPONSE
// =============================================================================

/// One catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResponse {
    pub index: usize,
    pub key: StageKey,
    pub label: String,
    pub description: String,
    pub required_roles: Vec<Role>,
    pub progress_percent: u8,
}

impl From<&StageDescriptor> for StageResponse {
    fn from(descriptor: &StageDescriptor) -> Self {
        Self {
            index: descriptor.key.index(),
            key: descriptor.key,
            label: descriptor.label.to_string(),
            description: descriptor.description.to_string(),
            required_roles: descriptor.required_roles.to_vec(),
            progress_percent: StageCatalog::progress_for(descriptor.key),
        }
    }
}

/// Full catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesResponse {
    pub count: usize,
    pub stages: Vec<StageResponse>,
}

impl StagesResponse {
    #[must_use]
    pub fn catalog() -> Self {
        Self {
            count: STAGE_COUNT,
            stages: StageCatalog::stages().iter().map(StageResponse::from).collect(),
        }
    }
}

// =============================================================================
// ASSESSMENT RESPONSES
// =============================================================================

/// Detailed view of one assessment, as seen by a particular caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub id: String,
    pub startup_name: String,
    pub current_stage: StageKey,
    pub stage_label: String,
    pub progress_percent: u8,
    pub can_proceed: bool,
    pub blockers: Vec<String>,
    pub version: u64,
    pub score_summary: ScoreSummary,
    pub scores: Vec<ScoreEntry>,
    pub stage_history: Vec<StageHistoryEntry>,
    /// Whether the caller may score, transition or manage blockers right now.
    pub can_act: bool,
}

impl AssessmentResponse {
    #[must_use]
    pub fn new(aggregate: &WorkflowAggregate, caller: &Caller) -> Self {
        Self {
            id: aggregate.id().to_string(),
            startup_name: aggregate.startup_name().to_string(),
            current_stage: aggregate.current_stage(),
            stage_label: aggregate.stage_label().to_string(),
            progress_percent: aggregate.progress_percent(),
            can_proceed: aggregate.can_proceed(),
            blockers: aggregate.blockers().to_vec(),
            version: aggregate.version(),
            score_summary: aggregate.score_summary(),
            scores: aggregate.scores().to_vec(),
            stage_history: aggregate.stage_history().to_vec(),
            can_act: caller.can_act(aggregate.current_stage()),
        }
    }
}

/// Row in the assessment list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub id: String,
    pub startup_name: String,
    pub current_stage: StageKey,
    pub stage_label: String,
    pub progress_percent: u8,
    pub can_proceed: bool,
    pub version: u64,
}

impl From<&WorkflowAggregate> for AssessmentSummary {
    fn from(aggregate: &WorkflowAggregate) -> Self {
        Self {
            id: aggregate.id().to_string(),
            startup_name: aggregate.startup_name().to_string(),
            current_stage: aggregate.current_stage(),
            stage_label: aggregate.stage_label().to_string(),
            progress_percent: aggregate.progress_percent(),
            can_proceed: aggregate.can_proceed(),
            version: aggregate.version(),
        }
    }
}

/// Assessment list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentListResponse {
    pub count: usize,
    pub assessments: Vec<AssessmentSummary>,
}

/// Result of a mutation: the updated assessment and the record it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse<T> {
    pub assessment: AssessmentResponse,
    pub record: T,
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Open a new assessment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAssessmentRequest {
    pub id: String,
    pub startup_name: String,
}

impl OpenAssessmentRequest {
    #[must_use]
    pub fn assessment_id(&self) -> AssessmentId {
        AssessmentId::new(self.id.trim())
    }
}

/// Append a score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(flatten)]
    pub candidate: ScoreCandidate,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

impl ScoreRequest {
    pub fn expected_version(&self) -> Result<u64, WorkflowError> {
        require_version(self.expected_version)
    }
}

/// Move one stage forward or backward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionBody {
    /// `forward` / `backward` (aliases `advance`, `retreat`).
    pub direction: Option<String>,
    pub notes: Option<String>,
    pub expected_version: Option<u64>,
}

impl TransitionBody {
    /// Convert to an engine request. Notes are checked by the engine itself.
    pub fn to_request(&self) -> Result<TransitionRequest, WorkflowError> {
        let direction = match self.direction.as_deref() {
            Some(raw) => raw.parse::<Direction>()?,
            None => {
                return Err(WorkflowError::Validation {
                    missing_fields: vec!["direction".to_string()],
                });
            }
        };
        let expected_version = require_version(self.expected_version)?;
        Ok(TransitionRequest {
            direction,
            notes: self.notes.clone().unwrap_or_default(),
            expected_version,
        })
    }
}

/// Add or resolve a blocker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockerBody {
    pub reason: Option<String>,
    pub expected_version: Option<u64>,
}

impl BlockerBody {
    pub fn expected_version(&self) -> Result<u64, WorkflowError> {
        require_version(self.expected_version)
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }
}

// =============================================================================
// SNAPSHOT RESPONSE
// =============================================================================

/// Base64 snapshot of every assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub count: usize,
    /// BLAKE3 digest of the raw snapshot bytes.
    pub digest: String,
    pub data: String,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blockers: Vec<String>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transition_body_requires_direction() {
        let body: TransitionBody =
            serde_json::from_value(json!({"notes": "ok", "expected_version": 0})).expect("json");
        assert_eq!(
            body.to_request(),
            Err(WorkflowError::Validation {
                missing_fields: vec!["direction".to_string()]
            })
        );
    }

    #[test]
    fn transition_body_accepts_aliases() {
        let body: TransitionBody = serde_json::from_value(
            json!({"direction": "retreat", "notes": "Back", "expected_version": 3}),
        )
        .expect("json");
        assert_eq!(
            body.to_request(),
            Ok(TransitionRequest::backward("Back", 3))
        );
    }

    #[test]
    fn score_request_flattens_candidate() {
        let body: ScoreRequest = serde_json::from_value(json!({
            "category": "Technical Feasibility",
            "score": 85,
            "max_score": 100,
            "comments": "Solid architecture",
            "expected_version": 2
        }))
        .expect("json");

        assert_eq!(
            body.candidate,
            ScoreCandidate::new("Technical Feasibility", 85, "Solid architecture")
                .with_max_score(100)
        );
        assert_eq!(body.expected_version(), Ok(2));
    }

    #[test]
    fn missing_version_is_validation_error() {
        let body = BlockerBody {
            reason: Some("Missing deck".to_string()),
            expected_version: None,
        };
        assert!(matches!(
            body.expected_version(),
            Err(WorkflowError::Validation { .. })
        ));
    }

    #[test]
    fn catalog_lists_five_stages_in_order() {
        let catalog = StagesResponse::catalog();
        assert_eq!(catalog.count, 5);
        let percents: Vec<u8> = catalog.stages.iter().map(|s| s.progress_percent).collect();
        assert_eq!(percents, vec![0, 25, 50, 75, 100]);
        assert_eq!(catalog.stages[4].required_roles, vec![Role::Admin]);
    }
}
