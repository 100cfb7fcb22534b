//! # Workflow Trigger
//!
//! Starts background workflow instances. Creating an instance whose id is
//! still running is a no-op; re-running an interrupted instance resumes it
//! from the step journal, and one that already saved its results reports the
//! feedback as already processed.

use super::feedback_workflow::FeedbackWorkflow;
use super::instance_registry::Claim;
use super::types::{FeedbackWorkflowParams, WorkflowInstanceId};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReceipt {
    Started,
    /// An instance with the same id is still live; nothing new was started
    AlreadyRunning,
}

#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TriggerError {
    #[error("workflow trigger is shut down")]
    ShutDown,

    #[error("no capacity for new workflow instances (limit {limit})")]
    CapacityExhausted { limit: usize },

    #[error("trigger rejected {instance_id}: {message}")]
    Rejected {
        instance_id: String,
        message: String,
    },
}

#[async_trait]
pub trait WorkflowTrigger: Send + Sync + 'static {
    async fn create(
        &self,
        instance_id: &WorkflowInstanceId,
        params: FeedbackWorkflowParams,
    ) -> Result<TriggerReceipt, TriggerError>;
}

/// Runs each instance on its own tokio task, bounded by a semaphore
pub struct TokioWorkflowTrigger {
    workflow: FeedbackWorkflow,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    shut_down: AtomicBool,
}

impl TokioWorkflowTrigger {
    pub fn new(workflow: FeedbackWorkflow, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            workflow,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Stop accepting new instances; running ones finish normally
    pub fn shutdown(&self) {
        self.shut_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.max_concurrent - self.permits.available_permits()
    }

    /// Wait until every spawned instance has finished
    pub async fn wait_idle(&self) {
        let permits = u32::try_from(self.max_concurrent).unwrap_or(u32::MAX);
        if let Ok(all) = self.permits.acquire_many(permits).await {
            drop(all);
        }
    }
}

#[async_trait]
impl WorkflowTrigger for TokioWorkflowTrigger {
    async fn create(
        &self,
        instance_id: &WorkflowInstanceId,
        params: FeedbackWorkflowParams,
    ) -> Result<TriggerReceipt, TriggerError> {
        if params.instance_id() != *instance_id {
            return Err(TriggerError::Rejected {
                instance_id: instance_id.to_string(),
                message: format!("parameters belong to {}", params.instance_id()),
            });
        }
        if self.is_shut_down() {
            return Err(TriggerError::ShutDown);
        }

        let registry = self.workflow.registry();
        let previous = match registry.claim(instance_id, params.feedback_id) {
            Claim::Acquired { previous } => previous,
            Claim::Live => {
                debug!(instance_id = %instance_id, "Instance already running");
                return Ok(TriggerReceipt::AlreadyRunning);
            }
        };

        let permit = match self.permits.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                registry.release(instance_id, previous);
                warn!(
                    instance_id = %instance_id,
                    limit = self.max_concurrent,
                    "Workflow capacity exhausted"
                );
                return Err(TriggerError::CapacityExhausted {
                    limit: self.max_concurrent,
                });
            }
        };

        let workflow = self.workflow.clone();
        tokio::spawn(async move {
            let _permit = permit;
            // Failures are logged and published by the workflow itself
            let _ = workflow.run(params).await;
        });

        Ok(TriggerReceipt::Started)
    }
}
