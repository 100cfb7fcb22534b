//! Lifecycle events for workflow instances and dispatch decisions.

pub mod publisher;

pub use publisher::{EventPublisher, EventPublisherStats, PublishedEvent};
