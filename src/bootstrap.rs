//! # Feedback System Bootstrap
//!
//! Wires configuration into a running system: store and step journal for the
//! configured backend, the classification oracle, the workflow engine and the
//! web application state.

use crate::config::{FeedbackConfig, StorageBackend};
use crate::database::{DatabaseConnection, DatabaseMigrations};
use crate::error::{FeedbackError, Result};
use crate::events::EventPublisher;
use crate::oracle::{ClassificationOracle, HttpOracle, UnavailableOracle};
use crate::orchestration::{
    BacklogSweep, FeedbackDispatcher, FeedbackWorkflow, InMemoryStepJournal, InstanceRegistry,
    PgStepJournal, StepJournal, TokioWorkflowTrigger,
};
use crate::services::ChatService;
use crate::store::{FeedbackStore, InMemoryFeedbackStore, PgFeedbackStore};
use crate::web::state::AppState;
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Handle over every long-lived component of the service
pub struct FeedbackSystem {
    config: FeedbackConfig,
    app_state: AppState,
    trigger: Arc<TokioWorkflowTrigger>,
    events: EventPublisher,
    connection: Option<DatabaseConnection>,
}

impl FeedbackSystem {
    /// Connect to the configured backend and assemble the system
    pub async fn bootstrap(config: FeedbackConfig) -> Result<Self> {
        config.validate()?;

        let (store, journal, connection): (
            Arc<dyn FeedbackStore>,
            Arc<dyn StepJournal>,
            Option<DatabaseConnection>,
        ) = match config.database.backend {
            StorageBackend::Postgres => {
                let connection = DatabaseConnection::connect(&config.database).await?;
                if config.database.run_migrations {
                    let applied = DatabaseMigrations::run_all(
                        connection.pool(),
                        Path::new(&config.database.migrations_dir),
                    )
                    .await?;
                    info!(applied = applied, "Database migrations complete");
                }
                let pool = connection.pool().clone();
                (
                    Arc::new(PgFeedbackStore::new(pool.clone())),
                    Arc::new(PgStepJournal::new(pool)),
                    Some(connection),
                )
            }
            StorageBackend::Memory => {
                warn!("Using in-memory store; feedback and step results are not durable");
                (
                    Arc::new(InMemoryFeedbackStore::new()),
                    Arc::new(InMemoryStepJournal::new()),
                    None,
                )
            }
        };

        let oracle: Arc<dyn ClassificationOracle> = if config.oracle.enabled {
            Arc::new(HttpOracle::new(&config.oracle).map_err(FeedbackError::Oracle)?)
        } else {
            info!("Classification oracle disabled, keyword fallbacks only");
            Arc::new(UnavailableOracle)
        };

        let mut system = Self::from_components(config, store, journal, oracle);
        system.connection = connection;
        Ok(system)
    }

    /// Assemble the system around already-built store, journal and oracle
    pub fn from_components(
        config: FeedbackConfig,
        store: Arc<dyn FeedbackStore>,
        journal: Arc<dyn StepJournal>,
        oracle: Arc<dyn ClassificationOracle>,
    ) -> Self {
        let events = EventPublisher::new(config.workflow.event_channel_capacity);
        let registry = Arc::new(InstanceRegistry::new());
        let workflow = FeedbackWorkflow::new(
            store.clone(),
            oracle.clone(),
            journal,
            events.clone(),
            registry,
        );

        let trigger = Arc::new(TokioWorkflowTrigger::new(
            workflow.clone(),
            config.workflow.max_concurrent_instances,
        ));
        let dispatcher = FeedbackDispatcher::new(trigger.clone(), workflow.clone());
        let sweep = Arc::new(BacklogSweep::new(store.clone(), dispatcher.clone()));
        let chat = Arc::new(ChatService::new(
            store.clone(),
            oracle,
            config.web.chat_context_limit,
        ));

        let app_state = AppState {
            config: Arc::new(config.web.clone()),
            store,
            workflow,
            dispatcher,
            sweep,
            chat,
            trend_window_days: config.workflow.trend_window_days,
        };

        Self {
            config,
            app_state,
            trigger,
            events,
            connection: None,
        }
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.config
    }

    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    pub fn trigger(&self) -> &Arc<TokioWorkflowTrigger> {
        &self.trigger
    }

    pub fn router(&self) -> Router {
        crate::web::create_app(self.app_state.clone())
    }

    /// Refuse new background instances, let running ones finish, close the pool
    pub async fn shutdown(self) {
        self.trigger.shutdown();
        info!(running = self.trigger.running(), "Waiting for workflow instances");
        self.trigger.wait_idle().await;

        let stats = self.events.stats();
        info!(published_events = stats.published, "Workflow engine stopped");

        if let Some(connection) = self.connection {
            connection.close().await;
        }
    }
}
