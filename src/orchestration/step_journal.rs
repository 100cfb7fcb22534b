//! # Step Journal
//!
//! Durable record of step results per workflow instance. A completed result is
//! written once and served to every later execution of the same step; failed
//! results are kept for diagnostics but never replayed.

use crate::error::{FeedbackError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid step status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub instance_id: String,
    pub step_name: String,
    pub status: StepStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    /// Number of times the step body ran for this instance
    pub attempts: i32,
    pub recorded_at: DateTime<Utc>,
}

impl StepRecord {
    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }
}

#[async_trait]
pub trait StepJournal: Send + Sync + 'static {
    async fn load(&self, instance_id: &str, step_name: &str) -> Result<Option<StepRecord>>;

    /// Commit a step output; returns the committed record, which is the
    /// earlier one if the step had already completed
    async fn record_completed(
        &self,
        instance_id: &str,
        step_name: &str,
        output: Value,
    ) -> Result<StepRecord>;

    async fn record_failed(
        &self,
        instance_id: &str,
        step_name: &str,
        error: &str,
    ) -> Result<StepRecord>;

    /// All step records of an instance, oldest first
    async fn steps_for(&self, instance_id: &str) -> Result<Vec<StepRecord>>;
}

/// Journal kept in process memory; survives retries but not restarts
#[derive(Debug, Default)]
pub struct InMemoryStepJournal {
    records: DashMap<(String, String), StepRecord>,
}

impl InMemoryStepJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn key(instance_id: &str, step_name: &str) -> (String, String) {
        (instance_id.to_string(), step_name.to_string())
    }
}

#[async_trait]
impl StepJournal for InMemoryStepJournal {
    async fn load(&self, instance_id: &str, step_name: &str) -> Result<Option<StepRecord>> {
        Ok(self
            .records
            .get(&Self::key(instance_id, step_name))
            .map(|entry| entry.value().clone()))
    }

    async fn record_completed(
        &self,
        instance_id: &str,
        step_name: &str,
        output: Value,
    ) -> Result<StepRecord> {
        let mut entry = self
            .records
            .entry(Self::key(instance_id, step_name))
            .or_insert_with(|| StepRecord {
                instance_id: instance_id.to_string(),
                step_name: step_name.to_string(),
                status: StepStatus::Failed,
                output: None,
                error: None,
                attempts: 0,
                recorded_at: Utc::now(),
            });

        let record = entry.value_mut();
        if !record.is_completed() {
            record.status = StepStatus::Completed;
            record.output = Some(output);
            record.error = None;
            record.attempts += 1;
            record.recorded_at = Utc::now();
        }
        Ok(record.clone())
    }

    async fn record_failed(
        &self,
        instance_id: &str,
        step_name: &str,
        error: &str,
    ) -> Result<StepRecord> {
        let mut entry = self
            .records
            .entry(Self::key(instance_id, step_name))
            .or_insert_with(|| StepRecord {
                instance_id: instance_id.to_string(),
                step_name: step_name.to_string(),
                status: StepStatus::Failed,
                output: None,
                error: None,
                attempts: 0,
                recorded_at: Utc::now(),
            });

        let record = entry.value_mut();
        if !record.is_completed() {
            record.status = StepStatus::Failed;
            record.error = Some(error.to_string());
            record.attempts += 1;
            record.recorded_at = Utc::now();
        }
        Ok(record.clone())
    }

    async fn steps_for(&self, instance_id: &str) -> Result<Vec<StepRecord>> {
        let mut steps: Vec<StepRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == instance_id)
            .map(|entry| entry.value().clone())
            .collect();
        steps.sort_by_key(|record| record.recorded_at);
        Ok(steps)
    }
}

#[derive(Debug, FromRow)]
struct StepRow {
    instance_id: String,
    step_name: String,
    status: String,
    output: Option<Value>,
    error: Option<String>,
    attempts: i32,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<StepRow> for StepRecord {
    type Error = FeedbackError;

    fn try_from(row: StepRow) -> Result<Self> {
        let status = row.status.parse().map_err(FeedbackError::StepJournal)?;
        Ok(StepRecord {
            instance_id: row.instance_id,
            step_name: row.step_name,
            status,
            output: row.output,
            error: row.error,
            attempts: row.attempts,
            recorded_at: row.recorded_at,
        })
    }
}

const STEP_COLUMNS: &str = "instance_id, step_name, status, output, error, attempts, recorded_at";

/// Journal stored in `workflow_step_results`
#[derive(Clone)]
pub struct PgStepJournal {
    pool: PgPool,
}

impl PgStepJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert(
        &self,
        instance_id: &str,
        step_name: &str,
        status: StepStatus,
        output: Option<Value>,
        error: Option<&str>,
    ) -> Result<StepRecord> {
        // Completed rows are never overwritten; the RETURNING row is empty then
        let written = sqlx::query_as::<_, StepRow>(&format!(
            "INSERT INTO workflow_step_results (instance_id, step_name, status, output, error, attempts) \
             VALUES ($1, $2, $3, $4, $5, 1) \
             ON CONFLICT (instance_id, step_name) DO UPDATE \
             SET status = EXCLUDED.status, output = EXCLUDED.output, error = EXCLUDED.error, \
                 attempts = workflow_step_results.attempts + 1, recorded_at = NOW() \
             WHERE workflow_step_results.status <> 'completed' \
             RETURNING {STEP_COLUMNS}"
        ))
        .bind(instance_id)
        .bind(step_name)
        .bind(status.as_str())
        .bind(output)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        match written {
            Some(row) => row.try_into(),
            None => self.load(instance_id, step_name).await?.ok_or_else(|| {
                FeedbackError::StepJournal(format!(
                    "step {step_name} of {instance_id} vanished after write"
                ))
            }),
        }
    }
}

#[async_trait]
impl StepJournal for PgStepJournal {
    async fn load(&self, instance_id: &str, step_name: &str) -> Result<Option<StepRecord>> {
        let row = sqlx::query_as::<_, StepRow>(&format!(
            "SELECT {STEP_COLUMNS} FROM workflow_step_results \
             WHERE instance_id = $1 AND step_name = $2"
        ))
        .bind(instance_id)
        .bind(step_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StepRecord::try_from).transpose()
    }

    async fn record_completed(
        &self,
        instance_id: &str,
        step_name: &str,
        output: Value,
    ) -> Result<StepRecord> {
        self.upsert(instance_id, step_name, StepStatus::Completed, Some(output), None)
            .await
    }

    async fn record_failed(
        &self,
        instance_id: &str,
        step_name: &str,
        error: &str,
    ) -> Result<StepRecord> {
        self.upsert(instance_id, step_name, StepStatus::Failed, None, Some(error))
            .await
    }

    async fn steps_for(&self, instance_id: &str) -> Result<Vec<StepRecord>> {
        let rows = sqlx::query_as::<_, StepRow>(&format!(
            "SELECT {STEP_COLUMNS} FROM workflow_step_results \
             WHERE instance_id = $1 ORDER BY recorded_at"
        ))
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StepRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_completed_result_is_write_once() {
        let journal = InMemoryStepJournal::new();
        let first = journal
            .record_completed("feedback-1", "analyze-sentiment", json!({"score": 0.8}))
            .await
            .unwrap();
        let second = journal
            .record_completed("feedback-1", "analyze-sentiment", json!({"score": 0.2}))
            .await
            .unwrap();

        assert_eq!(first.output, Some(json!({"score": 0.8})));
        assert_eq!(second.output, Some(json!({"score": 0.8})));
        assert_eq!(second.attempts, 1);
    }

    #[tokio::test]
    async fn test_failure_then_success_counts_attempts() {
        let journal = InMemoryStepJournal::new();
        let failed = journal
            .record_failed("feedback-2", "save-results", "store offline")
            .await
            .unwrap();
        assert_eq!(failed.status, StepStatus::Failed);
        assert_eq!(failed.attempts, 1);

        let completed = journal
            .record_completed("feedback-2", "save-results", json!({"feedback_id": 2}))
            .await
            .unwrap();
        assert!(completed.is_completed());
        assert_eq!(completed.attempts, 2);
        assert!(completed.error.is_none());
    }

    #[tokio::test]
    async fn test_failure_never_overwrites_completion() {
        let journal = InMemoryStepJournal::new();
        journal
            .record_completed("feedback-3", "extract-topics", json!({"topics": "ui"}))
            .await
            .unwrap();
        let record = journal
            .record_failed("feedback-3", "extract-topics", "late failure")
            .await
            .unwrap();
        assert!(record.is_completed());
    }

    #[tokio::test]
    async fn test_steps_for_is_scoped_to_instance() {
        let journal = InMemoryStepJournal::new();
        journal
            .record_completed("feedback-4", "retrieve-feedback", json!({}))
            .await
            .unwrap();
        journal
            .record_completed("feedback-5", "retrieve-feedback", json!({}))
            .await
            .unwrap();

        let steps = journal.steps_for("feedback-4").await.unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].instance_id, "feedback-4");
    }

    #[test]
    fn test_step_status_parse() {
        assert_eq!("completed".parse::<StepStatus>().unwrap(), StepStatus::Completed);
        assert!("done".parse::<StepStatus>().is_err());
    }
}
