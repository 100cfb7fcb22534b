//! Question answering over recently processed feedback.

use crate::constants::prompts;
use crate::error::Result;
use crate::models::{FeedbackRecord, Sentiment};
use crate::oracle::{ClassificationOracle, PromptRole};
use crate::store::FeedbackStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(skip)]
    pub fallback: bool,
    #[serde(skip)]
    pub context_items: usize,
}

pub struct ChatService {
    store: Arc<dyn FeedbackStore>,
    oracle: Arc<dyn ClassificationOracle>,
    context_limit: i64,
}

impl ChatService {
    pub fn new(
        store: Arc<dyn FeedbackStore>,
        oracle: Arc<dyn ClassificationOracle>,
        context_limit: i64,
    ) -> Self {
        Self {
            store,
            oracle,
            context_limit,
        }
    }

    /// Answer `query` using the most recent processed feedback as context.
    ///
    /// Only reading the context can fail; oracle failures produce a keyword
    /// answer and cache failures are logged.
    pub async fn answer(&self, query: &str) -> Result<ChatReply> {
        let recent = self.store.recent_processed(self.context_limit).await?;
        let system_instruction = format!(
            "{}\n\n{}\n\n{}",
            prompts::CHAT_SYSTEM_PROMPT_PREFIX,
            format_context(&recent),
            prompts::CHAT_SYSTEM_PROMPT_SUFFIX
        );

        let (response, fallback) = match self
            .oracle
            .classify(PromptRole::FeedbackChat, &system_instruction, query)
            .await
        {
            Ok(answer) => (answer, false),
            Err(error) => {
                warn!(error = %error, "Chat oracle failed, using keyword answer");
                (fallback_answer(query, &recent), true)
            }
        };

        if let Err(error) = self.store.cache_chat_response(query, &response).await {
            warn!(error = %error, "Failed to cache chat response");
        }
        debug!(context_items = recent.len(), fallback, "Chat answered");

        Ok(ChatReply {
            response,
            fallback,
            context_items: recent.len(),
        })
    }
}

pub fn format_context(recent: &[FeedbackRecord]) -> String {
    recent
        .iter()
        .map(|record| {
            format!(
                "Feedback: \"{}\" (Sentiment: {}, Topics: {})",
                record.content,
                record
                    .sentiment
                    .map(|s| s.as_str())
                    .unwrap_or("UNKNOWN"),
                record.topics.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn fallback_answer(query: &str, recent: &[FeedbackRecord]) -> String {
    let lowered = query.to_lowercase();
    let count = |sentiment: Sentiment| {
        recent
            .iter()
            .filter(|record| record.sentiment == Some(sentiment))
            .count()
    };

    if lowered.contains("complaint") || lowered.contains("negative") {
        format!(
            "Based on recent feedback, there are {} negative feedback items. Common issues include bugs, crashes, and feature requests.",
            count(Sentiment::Negative)
        )
    } else if lowered.contains("positive") || lowered.contains("good") {
        format!(
            "Based on recent feedback, there are {} positive feedback items. Users appreciate improvements and new features.",
            count(Sentiment::Positive)
        )
    } else {
        format!(
            "I found {} recent feedback items. Use specific questions about sentiment, topics, or trends for better insights.",
            recent.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedbackAnalysis, NewFeedback};
    use crate::oracle::UnavailableOracle;
    use crate::store::InMemoryFeedbackStore;

    async fn seeded_store() -> Arc<InMemoryFeedbackStore> {
        let store = Arc::new(InMemoryFeedbackStore::new());
        for (content, sentiment) in [
            ("App crashes", Sentiment::Negative),
            ("Login bug", Sentiment::Negative),
            ("Great UI", Sentiment::Positive),
        ] {
            let row = store.insert(&NewFeedback::new("email", content)).await.unwrap();
            store
                .save_analysis(
                    row.id,
                    &FeedbackAnalysis {
                        sentiment,
                        sentiment_score: 0.5,
                        topics: "ui".to_string(),
                    },
                )
                .await
                .unwrap();
        }
        store.insert(&NewFeedback::new("email", "unprocessed")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_fallback_counts_negative_items() {
        let store = seeded_store().await;
        let service = ChatService::new(store.clone(), Arc::new(UnavailableOracle), 10);

        let reply = service.answer("Any complaints?").await.unwrap();
        assert!(reply.fallback);
        assert_eq!(reply.context_items, 3);
        assert!(reply.response.contains("there are 2 negative feedback items"));

        let cached = store.chat_cache_entries();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].0, "Any complaints?");
    }

    #[tokio::test]
    async fn test_fallback_generic_answer() {
        let store = seeded_store().await;
        let service = ChatService::new(store, Arc::new(UnavailableOracle), 2);

        let reply = service.answer("What's trending?").await.unwrap();
        assert_eq!(
            reply.response,
            "I found 2 recent feedback items. Use specific questions about sentiment, topics, or trends for better insights."
        );
    }

    #[test]
    fn test_format_context_line() {
        let record = FeedbackRecord {
            id: 1,
            source: "email".to_string(),
            content: "Great UI".to_string(),
            author: None,
            timestamp: chrono::Utc::now(),
            sentiment: Some(Sentiment::Positive),
            sentiment_score: Some(0.8),
            topics: Some("ui".to_string()),
            status: "processed".to_string(),
            processed: true,
        };
        assert_eq!(
            format_context(&[record]),
            "Feedback: \"Great UI\" (Sentiment: POSITIVE, Topics: ui)"
        );
    }
}
