//! # Orchestration Engine
//!
//! Durable, step-based processing of feedback rows.
//!
//! ## Core Components
//!
//! - **StepJournal**: committed step outputs per instance (PostgreSQL or memory)
//! - **StepExecutor**: runs a named step once its journal entry is missing
//! - **FeedbackWorkflow**: retrieve, analyze-sentiment, extract-topics, save
//! - **WorkflowTrigger**: starts background instances keyed `feedback-<id>`
//! - **FeedbackDispatcher**: background start with inline fallback
//! - **BacklogSweep**: dispatches every unprocessed row and waits for all
//! - **InstanceRegistry**: in-process instance status for the API

pub mod backlog_sweep;
pub mod classifier;
pub mod dispatcher;
pub mod feedback_workflow;
pub mod instance_registry;
pub mod step_executor;
pub mod step_journal;
pub mod trigger;
pub mod types;

pub use backlog_sweep::{BacklogSweep, SweepReport};
pub use dispatcher::{DispatchOutcome, FeedbackDispatcher};
pub use feedback_workflow::FeedbackWorkflow;
pub use instance_registry::{Claim, InstanceRegistry, InstanceSnapshot};
pub use step_executor::StepExecutor;
pub use step_journal::{InMemoryStepJournal, PgStepJournal, StepJournal, StepRecord, StepStatus};
pub use trigger::{TokioWorkflowTrigger, TriggerError, TriggerReceipt, WorkflowTrigger};
pub use types::{
    FeedbackWorkflowParams, ProcessingResult, RetrievedFeedback, SaveReceipt, SentimentResult,
    TopicResult, WorkflowInstanceId, WorkflowOutcome,
};
