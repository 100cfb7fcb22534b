use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast publisher for workflow lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
    published: Arc<AtomicU64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventPublisherStats {
    pub published: u64,
    pub subscribers: usize,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event_name: impl Into<String>, context: Value) {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: Utc::now(),
        };
        self.published.fetch_add(1, Ordering::Relaxed);
        let _ = self.sender.send(event);
    }

    /// Publish an event scoped to one workflow instance
    pub fn publish_workflow_event(
        &self,
        event_name: &str,
        instance_id: &str,
        feedback_id: i64,
        details: Value,
    ) {
        self.publish(
            event_name,
            json!({
                "instance_id": instance_id,
                "feedback_id": feedback_id,
                "details": details,
            }),
        );
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn stats(&self) -> EventPublisherStats {
        EventPublisherStats {
            published: self.published.load(Ordering::Relaxed),
            subscribers: self.subscriber_count(),
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::events;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::new(8);
        publisher.publish("anything", json!({}));
        assert_eq!(publisher.stats().published, 1);
        assert_eq!(publisher.stats().subscribers, 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_workflow_events() {
        let publisher = EventPublisher::new(8);
        let mut receiver = publisher.subscribe();

        publisher.publish_workflow_event(
            events::WORKFLOW_STARTED,
            "feedback-7",
            7,
            json!({"mode": "async"}),
        );

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, events::WORKFLOW_STARTED);
        assert_eq!(event.context["instance_id"], "feedback-7");
        assert_eq!(event.context["feedback_id"], 7);
        assert_eq!(event.context["details"]["mode"], "async");
    }
}
