//! # Orchestration Types
//!
//! Parameters, identifiers and step outputs shared by the workflow, the
//! trigger, the dispatcher and the HTTP layer.

use crate::constants::INSTANCE_ID_PREFIX;
use crate::error::{FeedbackError, Result};
use crate::models::{FeedbackAnalysis, FeedbackRecord, Sentiment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The one parameter contract for a workflow instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeedbackWorkflowParams {
    pub feedback_id: i64,
}

impl FeedbackWorkflowParams {
    pub fn new(feedback_id: i64) -> Self {
        Self { feedback_id }
    }

    /// Extract parameters from an event payload.
    ///
    /// `feedbackId` is required and must be a positive integer; anything else
    /// is rejected immediately.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let params: Self = serde_json::from_value(payload.clone())
            .map_err(|e| FeedbackError::InvalidParams(e.to_string()))?;
        if params.feedback_id <= 0 {
            return Err(FeedbackError::InvalidParams(format!(
                "feedbackId must be positive, got {}",
                params.feedback_id
            )));
        }
        Ok(params)
    }

    pub fn instance_id(&self) -> WorkflowInstanceId {
        WorkflowInstanceId::for_feedback(self.feedback_id)
    }
}

/// Workflow instance key, `feedback-<id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowInstanceId(String);

impl WorkflowInstanceId {
    pub fn for_feedback(feedback_id: i64) -> Self {
        Self(format!("{INSTANCE_ID_PREFIX}{feedback_id}"))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.strip_prefix(INSTANCE_ID_PREFIX)?
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(Self::for_feedback)
    }

    pub fn feedback_id(&self) -> Option<i64> {
        self.0.strip_prefix(INSTANCE_ID_PREFIX)?.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of the retrieve step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedFeedback {
    /// The record was already processed; the instance ends here
    pub skip: bool,
    pub feedback: FeedbackRecord,
}

/// Output of the analyze-sentiment step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub score: f64,
    /// True when the keyword fallback produced the judgement
    pub fallback: bool,
}

/// Output of the extract-topics step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResult {
    pub topics: String,
    pub fallback: bool,
}

/// Output of the save step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub feedback_id: i64,
    pub saved_at: DateTime<Utc>,
}

/// Terminal success object of a processed instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub feedback_id: i64,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub topics: String,
}

impl ProcessingResult {
    pub fn analysis(&self) -> FeedbackAnalysis {
        FeedbackAnalysis {
            sentiment: self.sentiment,
            sentiment_score: self.sentiment_score,
            topics: self.topics.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    AlreadyProcessed {
        #[serde(rename = "feedbackId")]
        feedback_id: i64,
    },
    Processed(ProcessingResult),
}

impl WorkflowOutcome {
    pub fn feedback_id(&self) -> i64 {
        match self {
            Self::AlreadyProcessed { feedback_id } => *feedback_id,
            Self::Processed(result) => result.feedback_id,
        }
    }

    pub fn is_already_processed(&self) -> bool {
        matches!(self, Self::AlreadyProcessed { .. })
    }
}
