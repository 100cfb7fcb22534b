use crate::constants::status;
use crate::error::{FeedbackError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-way sentiment judgement stored on a feedback row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive so rows written by older tooling (`neutral`) still parse
impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" => Ok(Self::Positive),
            "NEGATIVE" => Ok(Self::Negative),
            "NEUTRAL" => Ok(Self::Neutral),
            _ => Err(format!("Invalid sentiment: {s}")),
        }
    }
}

/// A stored feedback row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub source: String,
    pub content: String,
    pub author: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
    pub topics: Option<String>,
    pub status: String,
    pub processed: bool,
}

impl FeedbackRecord {
    /// True when every classification field required by `processed=true` is present
    pub fn is_fully_classified(&self) -> bool {
        self.sentiment.is_some()
            && self.sentiment_score.is_some()
            && self.topics.is_some()
            && self.status == status::PROCESSED
    }

    pub fn apply_analysis(&mut self, analysis: &FeedbackAnalysis) {
        self.sentiment = Some(analysis.sentiment);
        self.sentiment_score = Some(analysis.sentiment_score);
        self.topics = Some(analysis.topics.clone());
        self.status = status::PROCESSED.to_string();
        self.processed = true;
    }
}

/// New feedback for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    pub source: String,
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl NewFeedback {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            author: None,
            status: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(FeedbackError::validation("source cannot be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(FeedbackError::validation("content cannot be empty"));
        }
        if self.status.as_deref() == Some(status::PROCESSED) {
            return Err(FeedbackError::validation(
                "status 'processed' is reserved for the processing workflow",
            ));
        }
        Ok(())
    }

    pub fn initial_status(&self) -> &str {
        self.status.as_deref().unwrap_or(status::PENDING)
    }
}

/// Classification fields written by the save step in one update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalysis {
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub topics: String,
}

/// Equality filters and pagination for listing feedback
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackFilter {
    pub source: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for FeedbackFilter {
    fn default() -> Self {
        Self {
            source: None,
            sentiment: None,
            limit: 100,
            offset: 0,
        }
    }
}
