//! # Classification Oracle
//!
//! The external text model consulted for sentiment, topics and chat answers.
//! Any failure is surfaced as an [`OracleError`] and handled by the caller's
//! keyword fallback; nothing here retries.

pub mod http;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use http::HttpOracle;

/// What a prompt is asking the oracle to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptRole {
    SentimentAnalysis,
    TopicExtraction,
    FeedbackChat,
}

impl PromptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentimentAnalysis => "sentiment_analysis",
            Self::TopicExtraction => "topic_extraction",
            Self::FeedbackChat => "feedback_chat",
        }
    }
}

impl fmt::Display for PromptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("oracle is not configured")]
    Unavailable,

    #[error("request failed: {0}")]
    Request(String),

    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed oracle response: {0}")]
    Malformed(String),

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("circuit breaker open for {0}")]
    CircuitOpen(String),

    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait ClassificationOracle: Send + Sync + 'static {
    /// Send one system instruction plus user text and return the raw answer text.
    ///
    /// Blank answers are reported as [`OracleError::EmptyResponse`].
    async fn classify(
        &self,
        role: PromptRole,
        system_instruction: &str,
        user_text: &str,
    ) -> Result<String, OracleError>;

    fn name(&self) -> &str;
}

/// Stand-in used when no oracle endpoint is configured; every call fails so the
/// keyword fallbacks take over.
#[derive(Debug, Default, Clone)]
pub struct UnavailableOracle;

#[async_trait]
impl ClassificationOracle for UnavailableOracle {
    async fn classify(
        &self,
        _role: PromptRole,
        _system_instruction: &str,
        _user_text: &str,
    ) -> Result<String, OracleError> {
        Err(OracleError::Unavailable)
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
