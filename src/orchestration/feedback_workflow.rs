//! # Feedback Processing Workflow
//!
//! Ordered steps turning one pending feedback row into a processed one:
//!
//! 1. `retrieve-feedback` loads the row; a missing row is fatal and an already
//!    processed row ends the instance as skipped.
//! 2. `analyze-sentiment` asks the oracle, falling back to keywords.
//! 3. `extract-topics` asks the oracle, falling back to the topic vocabulary.
//! 4. `save-results` writes every classification field in one update.
//!
//! Each step result is committed to the step journal before the next step
//! starts, so re-running an instance only re-executes the steps that never
//! completed. An instance whose save step is committed ends as skipped.

use super::classifier;
use super::instance_registry::InstanceRegistry;
use super::step_executor::StepExecutor;
use super::step_journal::{InMemoryStepJournal, StepJournal};
use super::types::{
    FeedbackWorkflowParams, ProcessingResult, RetrievedFeedback, SaveReceipt, SentimentResult,
    TopicResult, WorkflowInstanceId, WorkflowOutcome,
};
use crate::constants::{events, steps};
use crate::error::{FeedbackError, Result};
use crate::events::EventPublisher;
use crate::logging::log_workflow_operation;
use crate::models::FeedbackAnalysis;
use crate::oracle::ClassificationOracle;
use crate::state_machine::{WorkflowEvent, WorkflowStateMachine};
use crate::store::FeedbackStore;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct FeedbackWorkflow {
    store: Arc<dyn FeedbackStore>,
    oracle: Arc<dyn ClassificationOracle>,
    journal: Arc<dyn StepJournal>,
    events: EventPublisher,
    registry: Arc<InstanceRegistry>,
}

impl FeedbackWorkflow {
    pub fn new(
        store: Arc<dyn FeedbackStore>,
        oracle: Arc<dyn ClassificationOracle>,
        journal: Arc<dyn StepJournal>,
        events: EventPublisher,
        registry: Arc<InstanceRegistry>,
    ) -> Self {
        Self {
            store,
            oracle,
            journal,
            events,
            registry,
        }
    }

    pub fn store(&self) -> &Arc<dyn FeedbackStore> {
        &self.store
    }

    pub fn journal(&self) -> &Arc<dyn StepJournal> {
        &self.journal
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry> {
        &self.registry
    }

    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    /// Run (or resume) the durable instance `feedback-<id>`
    #[instrument(skip(self), fields(feedback_id = params.feedback_id))]
    pub async fn run(&self, params: FeedbackWorkflowParams) -> Result<WorkflowOutcome> {
        self.execute(params, self.journal.clone(), false, true)
            .await
    }

    /// Run the durable instance without touching the instance registry, for
    /// callers that could not claim the instance id
    #[instrument(skip(self), fields(feedback_id = params.feedback_id))]
    pub async fn run_untracked(&self, params: FeedbackWorkflowParams) -> Result<WorkflowOutcome> {
        self.execute(params, self.journal.clone(), false, false)
            .await
    }

    /// Process one record synchronously with a private journal.
    ///
    /// With `force` the processed flag is ignored and the record is classified
    /// and saved again.
    #[instrument(skip(self), fields(feedback_id = params.feedback_id))]
    pub async fn run_inline(
        &self,
        params: FeedbackWorkflowParams,
        force: bool,
    ) -> Result<WorkflowOutcome> {
        self.execute(params, Arc::new(InMemoryStepJournal::new()), force, false)
            .await
    }

    async fn execute(
        &self,
        params: FeedbackWorkflowParams,
        journal: Arc<dyn StepJournal>,
        force: bool,
        tracked: bool,
    ) -> Result<WorkflowOutcome> {
        let instance_id = params.instance_id();
        let feedback_id = params.feedback_id;
        let executor = StepExecutor::new(
            instance_id.clone(),
            feedback_id,
            journal,
            self.events.clone(),
        );
        let mut machine = WorkflowStateMachine::new();

        log_workflow_operation(
            "start",
            instance_id.as_str(),
            Some(feedback_id),
            "started",
            None,
        );
        self.events.publish_workflow_event(
            events::WORKFLOW_STARTED,
            instance_id.as_str(),
            feedback_id,
            json!({ "durable": tracked, "force": force }),
        );
        if tracked {
            self.track(&instance_id, &machine, None);
        }

        let result = self
            .drive(&executor, &mut machine, &instance_id, feedback_id, force, tracked)
            .await;

        match &result {
            Ok(WorkflowOutcome::AlreadyProcessed { .. }) => {
                info!(instance_id = %instance_id, "Feedback already processed, skipping");
                log_workflow_operation(
                    "finish",
                    instance_id.as_str(),
                    Some(feedback_id),
                    "skipped",
                    None,
                );
                self.events.publish_workflow_event(
                    events::WORKFLOW_SKIPPED,
                    instance_id.as_str(),
                    feedback_id,
                    json!({ "reason": "already_processed" }),
                );
            }
            Ok(WorkflowOutcome::Processed(processed)) => {
                log_workflow_operation(
                    "finish",
                    instance_id.as_str(),
                    Some(feedback_id),
                    "completed",
                    None,
                );
                self.events.publish_workflow_event(
                    events::WORKFLOW_COMPLETED,
                    instance_id.as_str(),
                    feedback_id,
                    serde_json::to_value(processed).unwrap_or_default(),
                );
            }
            Err(err) => {
                let message = err.to_string();
                if let Err(transition_error) =
                    machine.transition(WorkflowEvent::Fail(message.clone()))
                {
                    error!(instance_id = %instance_id, error = %transition_error, "Could not mark instance failed");
                }
                error!(
                    instance_id = %instance_id,
                    feedback_id = feedback_id,
                    kind = err.kind(),
                    error = %message,
                    "Feedback workflow failed"
                );
                log_workflow_operation(
                    "finish",
                    instance_id.as_str(),
                    Some(feedback_id),
                    "failed",
                    Some(&message),
                );
                self.events.publish_workflow_event(
                    events::WORKFLOW_FAILED,
                    instance_id.as_str(),
                    feedback_id,
                    json!({ "error": message, "kind": err.kind() }),
                );
            }
        }

        if tracked {
            let error = result.as_ref().err().map(ToString::to_string);
            self.track(&instance_id, &machine, error);
        }
        result
    }

    async fn drive(
        &self,
        executor: &StepExecutor,
        machine: &mut WorkflowStateMachine,
        instance_id: &WorkflowInstanceId,
        feedback_id: i64,
        force: bool,
        tracked: bool,
    ) -> Result<WorkflowOutcome> {
        let store = &self.store;
        let oracle = &self.oracle;

        // A previous run of this instance already saved its results
        if executor.is_committed(steps::SAVE_RESULTS).await? {
            machine.transition(WorkflowEvent::AlreadyProcessed)?;
            return Ok(WorkflowOutcome::AlreadyProcessed { feedback_id });
        }

        let retrieved: RetrievedFeedback = executor
            .execute(steps::RETRIEVE_FEEDBACK, move || async move {
                let feedback = store
                    .find_by_id(feedback_id)
                    .await?
                    .ok_or(FeedbackError::not_found(feedback_id))?;
                Ok(RetrievedFeedback {
                    skip: feedback.processed && !force,
                    feedback,
                })
            })
            .await?;

        if retrieved.skip {
            machine.transition(WorkflowEvent::AlreadyProcessed)?;
            return Ok(WorkflowOutcome::AlreadyProcessed { feedback_id });
        }
        machine.transition(WorkflowEvent::FeedbackRetrieved)?;
        if tracked {
            self.track(instance_id, machine, None);
        }

        let content = retrieved.feedback.content.as_str();

        let sentiment: SentimentResult = executor
            .execute(steps::ANALYZE_SENTIMENT, move || async move {
                Ok(classifier::classify_sentiment(oracle.as_ref(), content).await)
            })
            .await?;
        machine.transition(WorkflowEvent::SentimentAnalyzed)?;
        if tracked {
            self.track(instance_id, machine, None);
        }

        let topics: TopicResult = executor
            .execute(steps::EXTRACT_TOPICS, move || async move {
                Ok(classifier::extract_topics(oracle.as_ref(), content).await)
            })
            .await?;
        machine.transition(WorkflowEvent::TopicsExtracted)?;
        if tracked {
            self.track(instance_id, machine, None);
        }

        let analysis = FeedbackAnalysis {
            sentiment: sentiment.sentiment,
            sentiment_score: sentiment.score,
            topics: topics.topics,
        };
        let to_save = &analysis;
        let _receipt: SaveReceipt = executor
            .execute(steps::SAVE_RESULTS, move || async move {
                store.save_analysis(feedback_id, to_save).await?;
                Ok(SaveReceipt {
                    feedback_id,
                    saved_at: Utc::now(),
                })
            })
            .await?;
        machine.transition(WorkflowEvent::ResultsSaved)?;

        Ok(WorkflowOutcome::Processed(ProcessingResult {
            feedback_id,
            sentiment: analysis.sentiment,
            sentiment_score: analysis.sentiment_score,
            topics: analysis.topics,
        }))
    }

    fn track(
        &self,
        instance_id: &WorkflowInstanceId,
        machine: &WorkflowStateMachine,
        error: Option<String>,
    ) {
        self.registry.update(
            instance_id,
            machine.current_state(),
            machine.history(),
            error,
        );
    }
}
