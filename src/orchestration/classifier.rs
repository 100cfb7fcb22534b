//! # Feedback Classifier
//!
//! Oracle-backed sentiment and topic classification with deterministic keyword
//! fallbacks. Neither entrypoint can fail: any oracle error produces the
//! fallback result instead.

use super::types::{SentimentResult, TopicResult};
use crate::constants::{keywords, prompts, scores};
use crate::models::Sentiment;
use crate::oracle::{ClassificationOracle, OracleError, PromptRole};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

static TOPIC_PATTERN: OnceLock<Regex> = OnceLock::new();

fn topic_pattern() -> &'static Regex {
    TOPIC_PATTERN.get_or_init(|| {
        let alternatives = keywords::TOPIC_VOCABULARY.join("|");
        Regex::new(&format!(r"\b(?:{alternatives})\b")).expect("topic vocabulary is a valid regex")
    })
}

/// Map a free-text oracle answer to a sentiment; POSITIVE wins over NEGATIVE
pub fn parse_sentiment_response(response: &str) -> (Sentiment, f64) {
    let normalized = response.trim().to_uppercase();
    if normalized.contains("POSITIVE") {
        (Sentiment::Positive, scores::POSITIVE)
    } else if normalized.contains("NEGATIVE") {
        (Sentiment::Negative, scores::NEGATIVE)
    } else {
        (Sentiment::Neutral, scores::NEUTRAL)
    }
}

/// Keyword rule used when the oracle gives no answer
pub fn fallback_sentiment(content: &str) -> (Sentiment, f64) {
    let lowered = content.to_lowercase();
    if keywords::POSITIVE.iter().any(|word| lowered.contains(word)) {
        (Sentiment::Positive, scores::POSITIVE)
    } else if keywords::NEGATIVE.iter().any(|word| lowered.contains(word)) {
        (Sentiment::Negative, scores::FALLBACK_NEGATIVE)
    } else {
        (Sentiment::Neutral, scores::NEUTRAL)
    }
}

/// Whole-word vocabulary scan: distinct matches in first-seen order, at most three
pub fn fallback_topics(content: &str) -> String {
    let lowered = content.to_lowercase();
    let mut found: Vec<&str> = Vec::with_capacity(keywords::MAX_FALLBACK_TOPICS);

    for hit in topic_pattern().find_iter(&lowered) {
        let word = hit.as_str();
        if !found.contains(&word) {
            found.push(word);
            if found.len() == keywords::MAX_FALLBACK_TOPICS {
                break;
            }
        }
    }

    if found.is_empty() {
        keywords::DEFAULT_TOPIC.to_string()
    } else {
        found.join(", ")
    }
}

/// Blank answers count as no answer so the keyword fallbacks apply
fn require_answer(answer: Result<String, OracleError>) -> Result<String, OracleError> {
    match answer {
        Ok(text) if text.trim().is_empty() => Err(OracleError::EmptyResponse),
        other => other,
    }
}

pub async fn classify_sentiment(oracle: &dyn ClassificationOracle, content: &str) -> SentimentResult {
    match require_answer(
        oracle
            .classify(
                PromptRole::SentimentAnalysis,
                prompts::SENTIMENT_SYSTEM_PROMPT,
                content,
            )
            .await,
    ) {
        Ok(response) => {
            let (sentiment, score) = parse_sentiment_response(&response);
            debug!(oracle = oracle.name(), sentiment = %sentiment, "Oracle sentiment");
            SentimentResult {
                sentiment,
                score,
                fallback: false,
            }
        }
        Err(error) => {
            let (sentiment, score) = fallback_sentiment(content);
            warn!(
                oracle = oracle.name(),
                error = %error,
                sentiment = %sentiment,
                "Sentiment oracle failed, using keyword fallback"
            );
            SentimentResult {
                sentiment,
                score,
                fallback: true,
            }
        }
    }
}

pub async fn extract_topics(oracle: &dyn ClassificationOracle, content: &str) -> TopicResult {
    match require_answer(
        oracle
            .classify(PromptRole::TopicExtraction, prompts::TOPIC_SYSTEM_PROMPT, content)
            .await,
    ) {
        Ok(response) => TopicResult {
            topics: response.trim().to_string(),
            fallback: false,
        },
        Err(error) => {
            let topics = fallback_topics(content);
            warn!(
                oracle = oracle.name(),
                error = %error,
                topics = %topics,
                "Topic oracle failed, using vocabulary fallback"
            );
            TopicResult {
                topics,
                fallback: true,
            }
        }
    }
}
