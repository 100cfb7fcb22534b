//! # Durable Feedback Store
//!
//! The relational table of feedback rows, abstracted so the workflow and the
//! HTTP layer can run against PostgreSQL in production and an in-memory table in
//! tests or local development.
//!
//! Every operation either succeeds or reports [`FeedbackError::StoreUnavailable`];
//! `save_analysis` additionally reports [`FeedbackError::NotFound`] when the row
//! is missing so the save step never silently drops results.
//!
//! [`FeedbackError::StoreUnavailable`]: crate::error::FeedbackError::StoreUnavailable
//! [`FeedbackError::NotFound`]: crate::error::FeedbackError::NotFound

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{FeedbackAnalysis, FeedbackFilter, FeedbackRecord, FeedbackStats, NewFeedback};
use async_trait::async_trait;

pub use memory::InMemoryFeedbackStore;
pub use postgres::PgFeedbackStore;

#[async_trait]
pub trait FeedbackStore: Send + Sync + 'static {
    /// Insert an unclassified row and return it with its generated id
    async fn insert(&self, new_feedback: &NewFeedback) -> Result<FeedbackRecord>;

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedbackRecord>>;

    /// Write all classification fields and mark the row processed in one update
    async fn save_analysis(&self, id: i64, analysis: &FeedbackAnalysis) -> Result<()>;

    /// Newest first
    async fn list(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>>;

    async fn unprocessed_ids(&self) -> Result<Vec<i64>>;

    /// Most recent processed rows, used as chat context
    async fn recent_processed(&self, limit: i64) -> Result<Vec<FeedbackRecord>>;

    async fn stats(&self, trend_window_days: i64) -> Result<FeedbackStats>;

    async fn cache_chat_response(&self, query: &str, response: &str) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}
