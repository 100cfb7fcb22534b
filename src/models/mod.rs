//! # Data Models
//!
//! Feedback rows, creation payloads, analysis results and aggregate statistics.

pub mod feedback;
pub mod stats;

pub use feedback::{FeedbackAnalysis, FeedbackFilter, FeedbackRecord, NewFeedback, Sentiment};
pub use stats::{FeedbackStats, SentimentCount, SourceCount, TrendPoint};
