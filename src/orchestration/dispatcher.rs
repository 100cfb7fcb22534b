//! # Feedback Dispatcher
//!
//! At-least-once dispatch policy for a feedback row: start a background
//! instance, and when that is refused, process the row inline before
//! returning.

use super::feedback_workflow::FeedbackWorkflow;
use super::trigger::{TriggerError, TriggerReceipt, WorkflowTrigger};
use super::types::{FeedbackWorkflowParams, WorkflowInstanceId, WorkflowOutcome};
use crate::constants::events;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DispatchOutcome {
    DispatchedAsync {
        instance_id: WorkflowInstanceId,
        /// The instance was already live; no new run was started
        deduplicated: bool,
    },
    RanInline {
        instance_id: WorkflowInstanceId,
        trigger_error: TriggerError,
        outcome: WorkflowOutcome,
    },
    Failed {
        instance_id: WorkflowInstanceId,
        trigger_error: TriggerError,
        error: String,
    },
}

impl DispatchOutcome {
    pub fn instance_id(&self) -> &WorkflowInstanceId {
        match self {
            Self::DispatchedAsync { instance_id, .. }
            | Self::RanInline { instance_id, .. }
            | Self::Failed { instance_id, .. } => instance_id,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Clone)]
pub struct FeedbackDispatcher {
    trigger: Arc<dyn WorkflowTrigger>,
    workflow: FeedbackWorkflow,
}

impl FeedbackDispatcher {
    pub fn new(trigger: Arc<dyn WorkflowTrigger>, workflow: FeedbackWorkflow) -> Self {
        Self { trigger, workflow }
    }

    pub fn workflow(&self) -> &FeedbackWorkflow {
        &self.workflow
    }

    pub async fn dispatch(&self, feedback_id: i64) -> DispatchOutcome {
        let params = FeedbackWorkflowParams::new(feedback_id);
        let instance_id = params.instance_id();

        let trigger_error = match self.trigger.create(&instance_id, params).await {
            Ok(receipt) => {
                info!(
                    instance_id = %instance_id,
                    receipt = ?receipt,
                    "Feedback workflow dispatched"
                );
                return DispatchOutcome::DispatchedAsync {
                    instance_id,
                    deduplicated: receipt == TriggerReceipt::AlreadyRunning,
                };
            }
            Err(trigger_error) => trigger_error,
        };

        warn!(
            instance_id = %instance_id,
            error = %trigger_error,
            "Workflow creation failed, processing inline"
        );
        self.workflow.events().publish_workflow_event(
            events::DISPATCH_FALLBACK_INLINE,
            instance_id.as_str(),
            feedback_id,
            json!({ "trigger_error": trigger_error.to_string() }),
        );

        let result = if self.workflow.registry().try_claim(&instance_id, feedback_id) {
            self.workflow.run(params).await
        } else {
            // The live run owns the registry snapshot
            debug!(instance_id = %instance_id, "Instance live elsewhere, running untracked");
            self.workflow.run_untracked(params).await
        };
        match result {
            Ok(outcome) => DispatchOutcome::RanInline {
                instance_id,
                trigger_error,
                outcome,
            },
            Err(err) => {
                error!(
                    instance_id = %instance_id,
                    error = %err,
                    "Inline feedback processing failed"
                );
                DispatchOutcome::Failed {
                    instance_id,
                    trigger_error,
                    error: err.to_string(),
                }
            }
        }
    }
}
