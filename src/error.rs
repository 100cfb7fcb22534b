//! # Error Types
//!
//! Crate-wide error taxonomy for the feedback pipeline. Store and missing-record
//! failures are fatal to a workflow instance; oracle failures never leave the
//! step that produced them because every classification step has a local
//! fallback.

use crate::oracle::OracleError;
use crate::state_machine::StateMachineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Feedback {feedback_id} not found")]
    NotFound { feedback_id: i64 },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored row holds a value the model cannot represent
    #[error("Feedback {feedback_id} is corrupt: {reason}")]
    CorruptRecord { feedback_id: i64, reason: String },

    #[error("Classification oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Workflow creation failed for {instance_id}: {reason}")]
    WorkflowCreation { instance_id: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid workflow parameters: {0}")]
    InvalidParams(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Step journal error: {0}")]
    StepJournal(String),

    #[error("State transition error: {0}")]
    StateTransition(#[from] StateMachineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FeedbackError {
    pub fn not_found(feedback_id: i64) -> Self {
        Self::NotFound { feedback_id }
    }

    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable(reason.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Errors that must abort a workflow instance rather than being absorbed by a fallback.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Oracle(_))
    }

    /// Short machine-readable error kind, used in logs and lifecycle events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::CorruptRecord { .. } => "corrupt_record",
            Self::Oracle(_) => "oracle_error",
            Self::WorkflowCreation { .. } => "workflow_creation_failure",
            Self::Validation(_) => "validation_error",
            Self::InvalidParams(_) => "invalid_params",
            Self::Configuration(_) => "configuration_error",
            Self::StepJournal(_) => "step_journal_error",
            Self::StateTransition(_) => "state_transition_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

impl From<sqlx::Error> for FeedbackError {
    fn from(error: sqlx::Error) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedbackError>;
