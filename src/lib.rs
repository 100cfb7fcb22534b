#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Feedback Core
//!
//! Feedback collection service with a durable, step-based classification
//! workflow.
//!
//! ## Overview
//!
//! Feedback arrives through a REST API and is stored as `pending`. Each row is
//! then processed by a workflow instance keyed `feedback-<id>`:
//!
//! 1. retrieve the row (already processed rows are skipped)
//! 2. analyze sentiment through the classification oracle
//! 3. extract topics through the classification oracle
//! 4. save every classification field in one update
//!
//! Step results are committed to a step journal, so a resumed instance only
//! re-executes steps that never completed. When the oracle fails, keyword
//! heuristics stand in; when a background instance cannot be started, the row
//! is processed inline before the request returns.
//!
//! ## Module Organization
//!
//! - [`models`] - Feedback rows, analysis results and statistics
//! - [`store`] - Feedback persistence (PostgreSQL or in-memory)
//! - [`database`] - Connection pool and schema migrations
//! - [`oracle`] - Classification oracle client and circuit breaker wiring
//! - [`state_machine`] - Workflow instance lifecycle
//! - [`orchestration`] - Step journal, workflow, trigger, dispatcher and sweep
//! - [`services`] - Question answering over recent feedback
//! - [`web`] - Axum REST API
//! - [`config`] - Layered configuration
//! - [`bootstrap`] - Assembly of the running system
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use feedback_core::bootstrap::FeedbackSystem;
//! use feedback_core::config::ConfigManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let system = FeedbackSystem::bootstrap(manager.config().clone()).await?;
//! let app = system.router();
//! # let _ = app;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests (in-memory backends)
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod oracle;
pub mod orchestration;
pub mod resilience;
pub mod services;
pub mod state_machine;
pub mod store;
pub mod web;

pub use bootstrap::FeedbackSystem;
pub use config::{ConfigManager, FeedbackConfig, StorageBackend};
pub use error::{FeedbackError, Result};
pub use models::{FeedbackAnalysis, FeedbackRecord, FeedbackStats, NewFeedback, Sentiment};
pub use oracle::{ClassificationOracle, OracleError, PromptRole};
pub use orchestration::{
    DispatchOutcome, FeedbackDispatcher, FeedbackWorkflow, FeedbackWorkflowParams,
    WorkflowInstanceId, WorkflowOutcome,
};
pub use store::FeedbackStore;
