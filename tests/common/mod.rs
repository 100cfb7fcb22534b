//! Shared fixtures for integration tests: a scripted oracle, a trigger that
//! refuses every instance, and systems wired over in-memory backends.

#![allow(dead_code)]

use async_trait::async_trait;
use feedback_core::bootstrap::FeedbackSystem;
use feedback_core::config::{FeedbackConfig, StorageBackend};
use feedback_core::events::EventPublisher;
use feedback_core::models::NewFeedback;
use feedback_core::oracle::{ClassificationOracle, OracleError, PromptRole};
use feedback_core::orchestration::{
    FeedbackDispatcher, FeedbackWorkflow, FeedbackWorkflowParams, InMemoryStepJournal,
    InstanceRegistry, TriggerError, TriggerReceipt, WorkflowInstanceId, WorkflowTrigger,
};
use feedback_core::store::{FeedbackStore, InMemoryFeedbackStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Oracle answering from a per-role script and counting calls
#[derive(Default)]
pub struct ScriptedOracle {
    responses: Mutex<HashMap<PromptRole, Result<String, OracleError>>>,
    calls: Mutex<HashMap<PromptRole, usize>>,
    delay: Option<Duration>,
}

impl ScriptedOracle {
    /// Every role fails with `Unavailable` until scripted
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(sentiment: &str, topics: &str) -> Self {
        let oracle = Self::new();
        oracle.respond(PromptRole::SentimentAnalysis, sentiment);
        oracle.respond(PromptRole::TopicExtraction, topics);
        oracle
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, role: PromptRole, answer: &str) {
        self.responses.lock().insert(role, Ok(answer.to_string()));
    }

    pub fn fail(&self, role: PromptRole, error: OracleError) {
        self.responses.lock().insert(role, Err(error));
    }

    pub fn calls(&self, role: PromptRole) -> usize {
        self.calls.lock().get(&role).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ClassificationOracle for ScriptedOracle {
    async fn classify(
        &self,
        role: PromptRole,
        _system_instruction: &str,
        _user_text: &str,
    ) -> Result<String, OracleError> {
        *self.calls.lock().entry(role).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .get(&role)
            .cloned()
            .unwrap_or(Err(OracleError::Unavailable))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Trigger refusing every instance with a fixed error
pub struct FailingTrigger {
    pub error: TriggerError,
}

impl FailingTrigger {
    pub fn shut_down() -> Self {
        Self {
            error: TriggerError::ShutDown,
        }
    }
}

#[async_trait]
impl WorkflowTrigger for FailingTrigger {
    async fn create(
        &self,
        _instance_id: &WorkflowInstanceId,
        _params: FeedbackWorkflowParams,
    ) -> Result<TriggerReceipt, TriggerError> {
        Err(self.error.clone())
    }
}

/// Workflow over in-memory backends, with handles kept for assertions
pub struct Harness {
    pub store: Arc<InMemoryFeedbackStore>,
    pub journal: Arc<InMemoryStepJournal>,
    pub oracle: Arc<ScriptedOracle>,
    pub events: EventPublisher,
    pub workflow: FeedbackWorkflow,
}

impl Harness {
    pub fn new(oracle: ScriptedOracle) -> Self {
        let store = Arc::new(InMemoryFeedbackStore::new());
        let journal = Arc::new(InMemoryStepJournal::new());
        let oracle = Arc::new(oracle);
        let events = EventPublisher::new(256);
        let workflow = FeedbackWorkflow::new(
            store.clone(),
            oracle.clone(),
            journal.clone(),
            events.clone(),
            Arc::new(InstanceRegistry::new()),
        );
        Self {
            store,
            journal,
            oracle,
            events,
            workflow,
        }
    }

    /// Dispatcher whose background trigger always refuses
    pub fn inline_dispatcher(&self) -> FeedbackDispatcher {
        FeedbackDispatcher::new(Arc::new(FailingTrigger::shut_down()), self.workflow.clone())
    }

    pub async fn seed(&self, source: &str, content: &str) -> i64 {
        self.store
            .insert(&NewFeedback::new(source, content))
            .await
            .expect("seed insert")
            .id
    }
}

pub fn memory_config() -> FeedbackConfig {
    let mut config = FeedbackConfig::default();
    config.database.backend = StorageBackend::Memory;
    config.database.run_migrations = false;
    config.environment = "test".to_string();
    config
}

/// Full system over in-memory backends
pub struct SystemHarness {
    pub system: FeedbackSystem,
    pub store: Arc<InMemoryFeedbackStore>,
    pub oracle: Arc<ScriptedOracle>,
}

impl SystemHarness {
    pub fn new(oracle: ScriptedOracle) -> Self {
        Self::with_config(memory_config(), oracle)
    }

    pub fn with_config(config: FeedbackConfig, oracle: ScriptedOracle) -> Self {
        let store = Arc::new(InMemoryFeedbackStore::new());
        let oracle = Arc::new(oracle);
        let system = FeedbackSystem::from_components(
            config,
            store.clone(),
            Arc::new(InMemoryStepJournal::new()),
            oracle.clone(),
        );
        Self {
            system,
            store,
            oracle,
        }
    }
}

/// Drain every event already published on a subscription
pub fn drain_event_names(
    receiver: &mut tokio::sync::broadcast::Receiver<feedback_core::events::PublishedEvent>,
) -> Vec<String> {
    let mut names = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        names.push(event.name);
    }
    names
}
