use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Processed rows grouped by sentiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SentimentCount {
    pub sentiment: Option<String>,
    pub count: i64,
}

/// All rows grouped by source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

/// Daily processed counts per sentiment inside the trend window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub sentiment: Option<String>,
    pub count: i64,
}

/// Aggregate statistics served by `GET /api/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackStats {
    pub total: i64,
    pub by_sentiment: Vec<SentimentCount>,
    pub by_source: Vec<SourceCount>,
    pub recent_trends: Vec<TrendPoint>,
}

impl FeedbackStats {
    pub fn sentiment_count(&self, sentiment: &str) -> i64 {
        self.by_sentiment
            .iter()
            .filter(|entry| entry.sentiment.as_deref() == Some(sentiment))
            .map(|entry| entry.count)
            .sum()
    }
}
