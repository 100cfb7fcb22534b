//! # Web API Error Types
//!
//! Every error response carries a `{error, message}` JSON body.

use crate::error::FeedbackError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::DatabaseError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_label(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Not found",
            Self::BadRequest { .. } => "Invalid request",
            Self::DatabaseError { .. } => "Database error",
            Self::Internal { .. } => "Internal server error",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound { message }
            | Self::BadRequest { message }
            | Self::DatabaseError { message }
            | Self::Internal { message } => message,
        }
    }
}

impl From<FeedbackError> for ApiError {
    fn from(err: FeedbackError) -> Self {
        let message = err.to_string();
        match err {
            FeedbackError::NotFound { .. } => Self::NotFound { message },
            FeedbackError::StoreUnavailable(_) | FeedbackError::StepJournal(_) => {
                Self::DatabaseError { message }
            }
            FeedbackError::Validation(_) | FeedbackError::InvalidParams(_) => {
                Self::BadRequest { message }
            }
            _ => Self::Internal { message },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "API request failed");
        }

        let body = json!({
            "error": self.error_label(),
            "message": self.message(),
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
