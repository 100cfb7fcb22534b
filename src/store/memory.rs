//! In-memory feedback table with outage injection.

use super::FeedbackStore;
use crate::error::{FeedbackError, Result};
use crate::models::{
    FeedbackAnalysis, FeedbackFilter, FeedbackRecord, FeedbackStats, NewFeedback, SentimentCount,
    SourceCount, TrendPoint,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

#[derive(Debug)]
pub struct InMemoryFeedbackStore {
    rows: RwLock<BTreeMap<i64, FeedbackRecord>>,
    chat_cache: RwLock<Vec<(String, String)>>,
    next_id: AtomicI64,
    available: AtomicBool,
    writes_available: AtomicBool,
}

impl Default for InMemoryFeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            chat_cache: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            available: AtomicBool::new(true),
            writes_available: AtomicBool::new(true),
        }
    }

    /// Simulate a full outage: every operation fails
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Simulate an outage of the analysis update only; reads keep working
    pub fn set_writes_available(&self, available: bool) {
        self.writes_available.store(available, Ordering::SeqCst);
    }

    pub fn chat_cache_entries(&self) -> Vec<(String, String)> {
        self.chat_cache.read().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FeedbackError::store_unavailable(
                "in-memory store marked unavailable",
            ))
        }
    }

    fn newest_first(mut rows: Vec<FeedbackRecord>) -> Vec<FeedbackRecord> {
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn insert(&self, new_feedback: &NewFeedback) -> Result<FeedbackRecord> {
        self.ensure_available()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = FeedbackRecord {
            id,
            source: new_feedback.source.clone(),
            content: new_feedback.content.clone(),
            author: new_feedback.author.clone(),
            timestamp: Utc::now(),
            sentiment: None,
            sentiment_score: None,
            topics: None,
            status: new_feedback.initial_status().to_string(),
            processed: false,
        };
        self.rows.write().insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedbackRecord>> {
        self.ensure_available()?;
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn save_analysis(&self, id: i64, analysis: &FeedbackAnalysis) -> Result<()> {
        self.ensure_available()?;
        if !self.writes_available.load(Ordering::SeqCst) {
            return Err(FeedbackError::store_unavailable(
                "in-memory store rejected the analysis update",
            ));
        }
        let mut rows = self.rows.write();
        let record = rows.get_mut(&id).ok_or(FeedbackError::not_found(id))?;
        record.apply_analysis(analysis);
        Ok(())
    }

    async fn list(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>> {
        self.ensure_available()?;
        let matching: Vec<FeedbackRecord> = self
            .rows
            .read()
            .values()
            .filter(|row| {
                filter
                    .source
                    .as_ref()
                    .map_or(true, |source| &row.source == source)
            })
            .filter(|row| filter.sentiment.map_or(true, |s| row.sentiment == Some(s)))
            .cloned()
            .collect();

        Ok(Self::newest_first(matching)
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn unprocessed_ids(&self) -> Result<Vec<i64>> {
        self.ensure_available()?;
        Ok(self
            .rows
            .read()
            .values()
            .filter(|row| !row.processed)
            .map(|row| row.id)
            .collect())
    }

    async fn recent_processed(&self, limit: i64) -> Result<Vec<FeedbackRecord>> {
        self.ensure_available()?;
        let processed: Vec<FeedbackRecord> = self
            .rows
            .read()
            .values()
            .filter(|row| row.processed)
            .cloned()
            .collect();
        Ok(Self::newest_first(processed)
            .into_iter()
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn stats(&self, trend_window_days: i64) -> Result<FeedbackStats> {
        self.ensure_available()?;
        let rows = self.rows.read();
        let window_start = Utc::now() - Duration::days(trend_window_days);

        let mut by_sentiment: BTreeMap<Option<String>, i64> = BTreeMap::new();
        let mut by_source: BTreeMap<String, i64> = BTreeMap::new();
        let mut trends: BTreeMap<(NaiveDate, Option<String>), i64> = BTreeMap::new();

        for row in rows.values() {
            *by_source.entry(row.source.clone()).or_default() += 1;
            if !row.processed {
                continue;
            }
            let sentiment = row.sentiment.map(|s| s.as_str().to_string());
            *by_sentiment.entry(sentiment.clone()).or_default() += 1;
            if row.timestamp > window_start {
                *trends
                    .entry((row.timestamp.date_naive(), sentiment))
                    .or_default() += 1;
            }
        }

        let mut recent_trends: Vec<TrendPoint> = trends
            .into_iter()
            .map(|((date, sentiment), count)| TrendPoint {
                date,
                sentiment,
                count,
            })
            .collect();
        recent_trends.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(FeedbackStats {
            total: rows.len() as i64,
            by_sentiment: by_sentiment
                .into_iter()
                .map(|(sentiment, count)| SentimentCount { sentiment, count })
                .collect(),
            by_source: by_source
                .into_iter()
                .map(|(source, count)| SourceCount { source, count })
                .collect(),
            recent_trends,
        })
    }

    async fn cache_chat_response(&self, query: &str, response: &str) -> Result<()> {
        self.ensure_available()?;
        self.chat_cache
            .write()
            .push((query.to_string(), response.to_string()));
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.ensure_available()
    }
}
