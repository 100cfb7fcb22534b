use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one feedback workflow instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Loading the record and checking whether it still needs processing
    #[default]
    Retrieving,
    /// The record was already processed; nothing was written
    Skipped,
    AnalyzingSentiment,
    ExtractingTopics,
    Saving,
    /// Analysis persisted and the record marked processed
    Done,
    /// A fatal error (missing record, store outage) ended the instance
    Failed,
}

impl WorkflowState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Skipped | Self::Done | Self::Failed)
    }

    /// Terminal states that count as a successful run
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Skipped | Self::Done)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retrieving => write!(f, "retrieving"),
            Self::Skipped => write!(f, "skipped"),
            Self::AnalyzingSentiment => write!(f, "analyzing_sentiment"),
            Self::ExtractingTopics => write!(f, "extracting_topics"),
            Self::Saving => write!(f, "saving"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for WorkflowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retrieving" => Ok(Self::Retrieving),
            "skipped" => Ok(Self::Skipped),
            "analyzing_sentiment" => Ok(Self::AnalyzingSentiment),
            "extracting_topics" => Ok(Self::ExtractingTopics),
            "saving" => Ok(Self::Saving),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid workflow state: {s}")),
        }
    }
}
