//! # Web API Application State
//!
//! Shared services handed to every handler.

use crate::config::WebConfig;
use crate::orchestration::{BacklogSweep, FeedbackDispatcher, FeedbackWorkflow, StepJournal};
use crate::services::ChatService;
use crate::store::FeedbackStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Immutable web configuration, CORS policy included
    pub config: Arc<WebConfig>,
    pub store: Arc<dyn FeedbackStore>,
    pub workflow: FeedbackWorkflow,
    pub dispatcher: FeedbackDispatcher,
    pub sweep: Arc<BacklogSweep>,
    pub chat: Arc<ChatService>,
    pub trend_window_days: i64,
}

impl AppState {
    pub fn journal(&self) -> &Arc<dyn StepJournal> {
        self.workflow.journal()
    }

    /// Clamp a requested page size to the configured bounds
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size)
    }
}
