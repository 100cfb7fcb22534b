use serde::{Deserialize, Serialize};

/// Events that drive a workflow instance between states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WorkflowEvent {
    /// The record exists and still needs processing
    FeedbackRetrieved,
    /// The record exists and was processed before
    AlreadyProcessed,
    SentimentAnalyzed,
    TopicsExtracted,
    ResultsSaved,
    Fail(String),
}

impl WorkflowEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FeedbackRetrieved => "feedback_retrieved",
            Self::AlreadyProcessed => "already_processed",
            Self::SentimentAnalyzed => "sentiment_analyzed",
            Self::TopicsExtracted => "topics_extracted",
            Self::ResultsSaved => "results_saved",
            Self::Fail(_) => "fail",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }
}
