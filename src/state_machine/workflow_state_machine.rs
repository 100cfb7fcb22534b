use super::{
    errors::{StateMachineError, StateMachineResult},
    events::WorkflowEvent,
    states::WorkflowState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One applied transition, kept for the instance status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub event: String,
    pub occurred_at: DateTime<Utc>,
}

/// In-process state machine for one workflow instance.
///
/// The durable record of progress lives in the step journal; this machine
/// only guards the step ordering and keeps the transition history.
#[derive(Debug, Clone, Default)]
pub struct WorkflowStateMachine {
    state: WorkflowState,
    history: Vec<StateTransition>,
}

impl WorkflowStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> WorkflowState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn transition(&mut self, event: WorkflowEvent) -> StateMachineResult<WorkflowState> {
        let target = Self::determine_target_state(self.state, &event)?;
        self.history.push(StateTransition {
            from: self.state,
            to: target,
            event: event.event_type().to_string(),
            occurred_at: Utc::now(),
        });
        self.state = target;
        Ok(target)
    }

    pub fn determine_target_state(
        current_state: WorkflowState,
        event: &WorkflowEvent,
    ) -> StateMachineResult<WorkflowState> {
        let target = match (current_state, event) {
            (WorkflowState::Retrieving, WorkflowEvent::FeedbackRetrieved) => {
                WorkflowState::AnalyzingSentiment
            }
            (WorkflowState::Retrieving, WorkflowEvent::AlreadyProcessed) => WorkflowState::Skipped,
            (WorkflowState::AnalyzingSentiment, WorkflowEvent::SentimentAnalyzed) => {
                WorkflowState::ExtractingTopics
            }
            (WorkflowState::ExtractingTopics, WorkflowEvent::TopicsExtracted) => {
                WorkflowState::Saving
            }
            (WorkflowState::Saving, WorkflowEvent::ResultsSaved) => WorkflowState::Done,

            // Any live state may fail
            (from_state, WorkflowEvent::Fail(_)) if !from_state.is_terminal() => {
                WorkflowState::Failed
            }

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}
