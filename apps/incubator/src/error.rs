//! # Application Errors
//!
//! Errors raised by the CLI and server startup. Workflow and store
//! failures pass through unchanged from the core pipeline.

use incubator_core::{PipelineError, StoreError, WorkflowError};
use thiserror::Error;

/// Top-level error of the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Rejected or failed pipeline operation.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Filesystem or network failure outside the store.
    #[error("I/O error: {0}")]
    Io(String),

    /// Unreadable or inconsistent configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<WorkflowError> for AppError {
    fn from(e: WorkflowError) -> Self {
        Self::Pipeline(PipelineError::Workflow(e))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self::Pipeline(PipelineError::Store(e))
    }
}
