//! # API Error Mapping
//!
//! | error                                               | status |
//! |-----------------------------------------------------|--------|
//! | validation, unknown stage, unknown role             | 400    |
//! | authorization                                       | 403    |
//! | assessment not found, blocker not found             | 404    |
//! | conflict, terminal, blocked, first stage, duplicate | 409    |
//! | store failure                                       | 500    |

use super::types::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use incubator_core::{PipelineError, StoreError, WorkflowError};

/// Pipeline failure rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        Self(PipelineError::Workflow(e))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(PipelineError::Store(e))
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::Workflow(e) => match e {
                WorkflowError::Validation { .. }
                | WorkflowError::UnknownStage(_)
                | WorkflowError::UnknownRole(_) => StatusCode::BAD_REQUEST,
                WorkflowError::Authorization { .. } => StatusCode::FORBIDDEN,
                WorkflowError::BlockerNotFound(_) => StatusCode::NOT_FOUND,
                WorkflowError::Conflict { .. }
                | WorkflowError::TerminalStage { .. }
                | WorkflowError::BlockedTransition { .. }
                | WorkflowError::AlreadyAtFirstStage => StatusCode::CONFLICT,
            },
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::Store(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            PipelineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match &self.0 {
            PipelineError::Workflow(e) => e.kind(),
            PipelineError::NotFound(_) => "not_found",
            PipelineError::Store(StoreError::AlreadyExists(_)) => "already_exists",
            PipelineError::Store(_) => "store",
        }
    }

    #[must_use]
    pub fn body(&self) -> ErrorResponse {
        let (missing_fields, blockers) = match &self.0 {
            PipelineError::Workflow(WorkflowError::Validation { missing_fields }) => {
                (missing_fields.clone(), Vec::new())
            }
            PipelineError::Workflow(WorkflowError::BlockedTransition { blockers }) => {
                (Vec::new(), blockers.clone())
            }
            _ => (Vec::new(), Vec::new()),
        };
        ErrorResponse {
            error: self.0.to_string(),
            error_kind: self.kind().to_string(),
            missing_fields,
            blockers,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(event = "store_failure", "{}", self.0);
        } else {
            tracing::debug!(event = "request_rejected", kind = self.kind(), "{}", self.0);
        }
        (status, Json(self.body())).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
