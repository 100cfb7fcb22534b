//! PostgreSQL-backed feedback store.

use super::FeedbackStore;
use crate::constants::status;
use crate::error::{FeedbackError, Result};
use crate::models::{
    FeedbackAnalysis, FeedbackFilter, FeedbackRecord, FeedbackStats, NewFeedback, Sentiment,
    SentimentCount, SourceCount, TrendPoint,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

const FEEDBACK_COLUMNS: &str =
    "id, source, content, author, timestamp, sentiment, sentiment_score, topics, status, processed";

/// Raw row shape; `sentiment` is free text in the table
#[derive(Debug, FromRow)]
struct FeedbackRow {
    id: i64,
    source: String,
    content: String,
    author: Option<String>,
    timestamp: DateTime<Utc>,
    sentiment: Option<String>,
    sentiment_score: Option<f64>,
    topics: Option<String>,
    status: String,
    processed: bool,
}

impl TryFrom<FeedbackRow> for FeedbackRecord {
    type Error = FeedbackError;

    fn try_from(row: FeedbackRow) -> Result<Self> {
        let sentiment = row
            .sentiment
            .as_deref()
            .map(str::parse::<Sentiment>)
            .transpose()
            .map_err(|e| FeedbackError::CorruptRecord {
                feedback_id: row.id,
                reason: e.to_string(),
            })?;

        Ok(FeedbackRecord {
            id: row.id,
            source: row.source,
            content: row.content,
            author: row.author,
            timestamp: row.timestamp,
            sentiment,
            sentiment_score: row.sentiment_score,
            topics: row.topics,
            status: row.status,
            processed: row.processed,
        })
    }
}

fn into_records(rows: Vec<FeedbackRow>) -> Result<Vec<FeedbackRecord>> {
    rows.into_iter().map(FeedbackRecord::try_from).collect()
}

#[derive(Clone)]
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn insert(&self, new_feedback: &NewFeedback) -> Result<FeedbackRecord> {
        let row = sqlx::query_as::<_, FeedbackRow>(&format!(
            "INSERT INTO feedback (source, content, author, status, processed) \
             VALUES ($1, $2, $3, $4, FALSE) RETURNING {FEEDBACK_COLUMNS}"
        ))
        .bind(&new_feedback.source)
        .bind(&new_feedback.content)
        .bind(&new_feedback.author)
        .bind(new_feedback.initial_status())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FeedbackRecord>> {
        let row = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(FeedbackRecord::try_from).transpose()
    }

    async fn save_analysis(&self, id: i64, analysis: &FeedbackAnalysis) -> Result<()> {
        let result = sqlx::query(
            "UPDATE feedback \
             SET sentiment = $1, sentiment_score = $2, topics = $3, status = $4, processed = TRUE \
             WHERE id = $5",
        )
        .bind(analysis.sentiment.as_str())
        .bind(analysis.sentiment_score)
        .bind(&analysis.topics)
        .bind(status::PROCESSED)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(FeedbackError::not_found(id));
        }
        Ok(())
    }

    async fn list(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackRecord>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE 1=1"));

        if let Some(source) = &filter.source {
            builder.push(" AND source = ").push_bind(source.clone());
        }
        if let Some(sentiment) = filter.sentiment {
            builder
                .push(" AND sentiment = ")
                .push_bind(sentiment.as_str());
        }
        builder
            .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = builder
            .build_query_as::<FeedbackRow>()
            .fetch_all(&self.pool)
            .await?;

        into_records(rows)
    }

    async fn unprocessed_ids(&self) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM feedback WHERE processed = FALSE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn recent_processed(&self, limit: i64) -> Result<Vec<FeedbackRecord>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE processed = TRUE \
             ORDER BY timestamp DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn stats(&self, trend_window_days: i64) -> Result<FeedbackStats> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.pool)
            .await?;

        let by_sentiment = sqlx::query_as::<_, SentimentCount>(
            "SELECT sentiment, COUNT(*) AS count FROM feedback \
             WHERE processed = TRUE GROUP BY sentiment ORDER BY sentiment",
        )
        .fetch_all(&self.pool)
        .await?;

        let by_source = sqlx::query_as::<_, SourceCount>(
            "SELECT source, COUNT(*) AS count FROM feedback GROUP BY source ORDER BY source",
        )
        .fetch_all(&self.pool)
        .await?;

        let window_days = i32::try_from(trend_window_days).unwrap_or(i32::MAX);
        let recent_trends = sqlx::query_as::<_, TrendPoint>(
            "SELECT DATE(timestamp) AS date, sentiment, COUNT(*) AS count FROM feedback \
             WHERE processed = TRUE AND timestamp > NOW() - make_interval(days => $1) \
             GROUP BY DATE(timestamp), sentiment ORDER BY date DESC",
        )
        .bind(window_days)
        .fetch_all(&self.pool)
        .await?;

        Ok(FeedbackStats {
            total,
            by_sentiment,
            by_source,
            recent_trends,
        })
    }

    async fn cache_chat_response(&self, query: &str, response: &str) -> Result<()> {
        sqlx::query("INSERT INTO analysis_cache (query, response) VALUES ($1, $2)")
            .bind(query)
            .bind(response)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
