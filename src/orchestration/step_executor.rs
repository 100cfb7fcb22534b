//! # Step Executor
//!
//! Runs the named steps of one workflow instance against the step journal so a
//! resumed instance reuses every committed step output instead of running the
//! step body again.

use super::step_journal::StepJournal;
use super::types::WorkflowInstanceId;
use crate::constants::events;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::logging::log_step_operation;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub struct StepExecutor {
    instance_id: WorkflowInstanceId,
    feedback_id: i64,
    journal: Arc<dyn StepJournal>,
    events: EventPublisher,
}

impl StepExecutor {
    pub fn new(
        instance_id: WorkflowInstanceId,
        feedback_id: i64,
        journal: Arc<dyn StepJournal>,
        events: EventPublisher,
    ) -> Self {
        Self {
            instance_id,
            feedback_id,
            journal,
            events,
        }
    }

    pub fn instance_id(&self) -> &WorkflowInstanceId {
        &self.instance_id
    }

    /// Whether `step_name` already has a committed result for this instance
    pub async fn is_committed(&self, step_name: &str) -> Result<bool> {
        Ok(self
            .journal
            .load(self.instance_id.as_str(), step_name)
            .await?
            .is_some_and(|record| record.is_completed()))
    }

    /// Run `step` unless `step_name` already has a committed result, in which
    /// case the committed output is decoded and returned.
    ///
    /// The step body may run more than once across retries (it is only skipped
    /// once its result is committed), so its side effects must be idempotent.
    pub async fn execute<T, F, Fut>(&self, step_name: &str, step: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let instance_id = self.instance_id.as_str();

        if let Some(record) = self.journal.load(instance_id, step_name).await? {
            if let (true, Some(output)) = (record.is_completed(), record.output) {
                debug!(
                    instance_id = %instance_id,
                    step_name = %step_name,
                    "Replaying committed step output"
                );
                log_step_operation("replay", instance_id, step_name, "replayed", None, None);
                self.events.publish_workflow_event(
                    events::WORKFLOW_STEP_REPLAYED,
                    instance_id,
                    self.feedback_id,
                    json!({ "step_name": step_name }),
                );
                return Ok(serde_json::from_value(output)?);
            }
        }

        let started = Instant::now();
        match step().await {
            Ok(value) => {
                let committed = self
                    .journal
                    .record_completed(instance_id, step_name, serde_json::to_value(&value)?)
                    .await?;
                let duration_ms = started.elapsed().as_millis();
                log_step_operation(
                    "execute",
                    instance_id,
                    step_name,
                    "completed",
                    Some(duration_ms),
                    None,
                );
                self.events.publish_workflow_event(
                    events::WORKFLOW_STEP_COMPLETED,
                    instance_id,
                    self.feedback_id,
                    json!({
                        "step_name": step_name,
                        "attempts": committed.attempts,
                        "duration_ms": duration_ms as u64,
                    }),
                );

                // A concurrent run may have committed first; its output wins
                match committed.output {
                    Some(output) => Ok(serde_json::from_value(output)?),
                    None => Ok(value),
                }
            }
            Err(error) => {
                let message = error.to_string();
                if let Err(journal_error) = self
                    .journal
                    .record_failed(instance_id, step_name, &message)
                    .await
                {
                    warn!(
                        instance_id = %instance_id,
                        step_name = %step_name,
                        error = %journal_error,
                        "Could not record step failure"
                    );
                }
                log_step_operation(
                    "execute",
                    instance_id,
                    step_name,
                    "failed",
                    Some(started.elapsed().as_millis()),
                    Some(&message),
                );
                self.events.publish_workflow_event(
                    events::WORKFLOW_STEP_FAILED,
                    instance_id,
                    self.feedback_id,
                    json!({ "step_name": step_name, "error": message, "kind": error.kind() }),
                );
                Err(error)
            }
        }
    }
}
