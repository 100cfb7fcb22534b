//! # Backlog Sweep
//!
//! Dispatches every unprocessed feedback row concurrently and waits for all
//! dispatches to settle. A failing row never stops the others.

use super::dispatcher::{DispatchOutcome, FeedbackDispatcher};
use crate::error::Result;
use crate::store::FeedbackStore;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Rows a dispatch was attempted for
    pub attempted: usize,
    pub dispatched_async: usize,
    pub ran_inline: usize,
    pub failed: usize,
}

impl SweepReport {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.attempted += 1;
        match outcome {
            DispatchOutcome::DispatchedAsync { .. } => self.dispatched_async += 1,
            DispatchOutcome::RanInline { .. } => self.ran_inline += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

pub struct BacklogSweep {
    store: Arc<dyn FeedbackStore>,
    dispatcher: FeedbackDispatcher,
}

impl BacklogSweep {
    pub fn new(store: Arc<dyn FeedbackStore>, dispatcher: FeedbackDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Only listing the backlog can fail; per-row failures land in the report
    pub async fn run(&self) -> Result<SweepReport> {
        let pending = self.store.unprocessed_ids().await?;
        info!(pending = pending.len(), "Starting backlog sweep");

        let outcomes = join_all(
            pending
                .iter()
                .map(|feedback_id| self.dispatcher.dispatch(*feedback_id)),
        )
        .await;

        let mut report = SweepReport::default();
        for outcome in &outcomes {
            if let DispatchOutcome::Failed {
                instance_id, error, ..
            } = outcome
            {
                warn!(instance_id = %instance_id, error = %error, "Backlog item failed");
            }
            report.record(outcome);
        }

        info!(
            attempted = report.attempted,
            dispatched_async = report.dispatched_async,
            ran_inline = report.ran_inline,
            failed = report.failed,
            "Backlog sweep finished"
        );
        Ok(report)
    }
}
