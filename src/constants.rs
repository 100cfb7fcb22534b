//! # System Constants
//!
//! Step names, lifecycle event names, classification keywords and scores that
//! define the behaviour of the feedback processing workflow.

/// Prefix for workflow instance identifiers (`feedback-<id>`)
pub const INSTANCE_ID_PREFIX: &str = "feedback-";

/// Lifecycle events published on the event channel
pub mod events {
    pub const WORKFLOW_STARTED: &str = "workflow.started";
    pub const WORKFLOW_STEP_COMPLETED: &str = "workflow.step_completed";
    pub const WORKFLOW_STEP_REPLAYED: &str = "workflow.step_replayed";
    pub const WORKFLOW_STEP_FAILED: &str = "workflow.step_failed";
    pub const WORKFLOW_SKIPPED: &str = "workflow.skipped";
    pub const WORKFLOW_COMPLETED: &str = "workflow.completed";
    pub const WORKFLOW_FAILED: &str = "workflow.failed";
    pub const DISPATCH_FALLBACK_INLINE: &str = "dispatch.fallback_inline";
}

/// Step names, stable across releases because they key the step journal
pub mod steps {
    pub const RETRIEVE_FEEDBACK: &str = "retrieve-feedback";
    pub const ANALYZE_SENTIMENT: &str = "analyze-sentiment";
    pub const EXTRACT_TOPICS: &str = "extract-topics";
    pub const SAVE_RESULTS: &str = "save-results";
}

/// Record status column values
pub mod status {
    pub const PENDING: &str = "pending";
    pub const PROCESSED: &str = "processed";
}

/// Fixed sentiment scores
pub mod scores {
    pub const POSITIVE: f64 = 0.8;
    /// Oracle-derived negative judgement
    pub const NEGATIVE: f64 = 0.2;
    /// Keyword-derived negative judgement
    pub const FALLBACK_NEGATIVE: f64 = 0.3;
    pub const NEUTRAL: f64 = 0.5;
}

/// Keyword heuristics used when the oracle is unavailable
pub mod keywords {
    pub const POSITIVE: [&str; 3] = ["great", "love", "excellent"];
    pub const NEGATIVE: [&str; 3] = ["bug", "crash", "fix"];

    pub const TOPIC_VOCABULARY: [&str; 8] = [
        "dashboard", "api", "mobile", "pricing", "feature", "bug", "ui", "login",
    ];
    pub const MAX_FALLBACK_TOPICS: usize = 3;
    pub const DEFAULT_TOPIC: &str = "general";
}

/// System instructions sent to the classification oracle
pub mod prompts {
    pub const SENTIMENT_SYSTEM_PROMPT: &str = "You are a sentiment analysis expert. Analyze the sentiment of the following feedback and respond with ONLY one word: POSITIVE, NEGATIVE, or NEUTRAL.";
    pub const TOPIC_SYSTEM_PROMPT: &str =
        "Extract the main topics from this feedback. Return only 2-3 comma-separated topics.";
    pub const CHAT_SYSTEM_PROMPT_PREFIX: &str =
        "You are a helpful assistant analyzing customer feedback. Here's recent feedback data:";
    pub const CHAT_SYSTEM_PROMPT_SUFFIX: &str = "Answer questions about this feedback data.";
}
