//! End-to-end runs of the feedback workflow over in-memory backends.

mod common;

use common::{drain_event_names, Harness, ScriptedOracle};
use feedback_core::constants::{events, steps};
use feedback_core::error::FeedbackError;
use feedback_core::models::Sentiment;
use feedback_core::oracle::{OracleError, PromptRole};
use feedback_core::orchestration::{
    FeedbackWorkflowParams, StepJournal, StepStatus, WorkflowInstanceId, WorkflowOutcome,
};
use feedback_core::state_machine::WorkflowState;
use feedback_core::store::FeedbackStore;

#[tokio::test]
async fn test_pending_feedback_is_classified_and_saved() {
    let harness = Harness::new(ScriptedOracle::answering("POSITIVE", "  ui, onboarding  "));
    let id = harness.seed("app_store", "Love the new onboarding flow").await;

    let outcome = harness
        .workflow
        .run(FeedbackWorkflowParams::new(id))
        .await
        .unwrap();

    match outcome {
        WorkflowOutcome::Processed(result) => {
            assert_eq!(result.feedback_id, id);
            assert_eq!(result.sentiment, Sentiment::Positive);
            assert_eq!(result.sentiment_score, 0.8);
            assert_eq!(result.topics, "ui, onboarding");
        }
        other => panic!("expected processed outcome, got {other:?}"),
    }

    let row = harness.store.find_by_id(id).await.unwrap().unwrap();
    assert!(row.processed);
    assert_eq!(row.status, "processed");
    assert!(row.is_fully_classified());
    assert_eq!(row.topics.as_deref(), Some("ui, onboarding"));

    let instance_id = WorkflowInstanceId::for_feedback(id);
    let journaled = harness.journal.steps_for(instance_id.as_str()).await.unwrap();
    assert_eq!(journaled.len(), 4);
    assert!(journaled
        .iter()
        .all(|record| record.status == StepStatus::Completed));
}

#[tokio::test]
async fn test_oracle_outage_uses_keyword_fallbacks() {
    let harness = Harness::new(ScriptedOracle::new());
    let id = harness.seed("email", "Found a bug in the dashboard API").await;

    let outcome = harness
        .workflow
        .run(FeedbackWorkflowParams::new(id))
        .await
        .unwrap();

    let WorkflowOutcome::Processed(result) = outcome else {
        panic!("expected processed outcome");
    };
    assert_eq!(result.sentiment, Sentiment::Negative);
    assert_eq!(result.sentiment_score, 0.3);
    assert_eq!(result.topics, "bug, dashboard, api");
    assert_eq!(harness.oracle.calls(PromptRole::SentimentAnalysis), 1);
    assert_eq!(harness.oracle.calls(PromptRole::TopicExtraction), 1);
}

#[tokio::test]
async fn test_oracle_negative_answer_scores_lower_than_fallback() {
    let oracle = ScriptedOracle::new();
    oracle.respond(PromptRole::SentimentAnalysis, "negative.");
    oracle.fail(
        PromptRole::TopicExtraction,
        OracleError::Status {
            status: 500,
            body: "upstream".to_string(),
        },
    );
    let harness = Harness::new(oracle);
    let id = harness.seed("support", "Checkout is slow").await;

    let outcome = harness
        .workflow
        .run(FeedbackWorkflowParams::new(id))
        .await
        .unwrap();

    let WorkflowOutcome::Processed(result) = outcome else {
        panic!("expected processed outcome");
    };
    assert_eq!(result.sentiment, Sentiment::Negative);
    assert_eq!(result.sentiment_score, 0.2);
    assert_eq!(result.topics, "general");
}

#[tokio::test]
async fn test_processed_feedback_is_skipped() {
    let harness = Harness::new(ScriptedOracle::answering("NEUTRAL", "pricing"));
    let id = harness.seed("email", "Pricing page is fine").await;

    harness
        .workflow
        .run_inline(FeedbackWorkflowParams::new(id), false)
        .await
        .unwrap();
    let processed = harness.store.find_by_id(id).await.unwrap().unwrap();

    for _ in 0..2 {
        let outcome = harness
            .workflow
            .run(FeedbackWorkflowParams::new(id))
            .await
            .unwrap();
        assert_eq!(outcome, WorkflowOutcome::AlreadyProcessed { feedback_id: id });
    }

    assert_eq!(harness.oracle.calls(PromptRole::SentimentAnalysis), 1);
    assert_eq!(harness.store.find_by_id(id).await.unwrap().unwrap(), processed);

    let instance_id = WorkflowInstanceId::for_feedback(id);
    let journaled = harness.journal.steps_for(instance_id.as_str()).await.unwrap();
    assert_eq!(journaled.len(), 1);
    assert_eq!(journaled[0].step_name, steps::RETRIEVE_FEEDBACK);
}

#[tokio::test]
async fn test_blank_oracle_answers_use_keyword_fallbacks() {
    let harness = Harness::new(ScriptedOracle::answering("   ", "  "));
    let id = harness.seed("email", "The app crashes on the login page").await;

    let outcome = harness
        .workflow
        .run(FeedbackWorkflowParams::new(id))
        .await
        .unwrap();

    let WorkflowOutcome::Processed(result) = outcome else {
        panic!("expected processed outcome");
    };
    assert_eq!(result.sentiment, Sentiment::Negative);
    assert_eq!(result.sentiment_score, 0.3);
    assert_eq!(result.topics, "login");

    let row = harness.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(row.topics.as_deref(), Some("login"));
}

#[tokio::test]
async fn test_missing_feedback_fails_the_instance() {
    let harness = Harness::new(ScriptedOracle::new());

    let err = harness
        .workflow
        .run(FeedbackWorkflowParams::new(404))
        .await
        .unwrap_err();

    assert!(matches!(err, FeedbackError::NotFound { feedback_id: 404 }));
    let record = harness
        .journal
        .load("feedback-404", steps::RETRIEVE_FEEDBACK)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, StepStatus::Failed);
    assert_eq!(record.attempts, 1);
    assert_eq!(harness.oracle.calls(PromptRole::SentimentAnalysis), 0);
}

#[tokio::test]
async fn test_resumed_instance_skips_committed_steps() {
    let harness = Harness::new(ScriptedOracle::answering("POSITIVE", "mobile"));
    let id = harness.seed("app_store", "Excellent mobile app").await;
    let params = FeedbackWorkflowParams::new(id);

    harness.store.set_writes_available(false);
    let err = harness.workflow.run(params).await.unwrap_err();
    assert!(matches!(err, FeedbackError::StoreUnavailable(_)));

    let row = harness.store.find_by_id(id).await.unwrap().unwrap();
    assert!(!row.processed);
    assert!(row.sentiment.is_none());

    harness.store.set_writes_available(true);
    let mut receiver = harness.events.subscribe();
    let outcome = harness.workflow.run(params).await.unwrap();
    assert!(!outcome.is_already_processed());

    let replayed = drain_event_names(&mut receiver)
        .into_iter()
        .filter(|name| name == events::WORKFLOW_STEP_REPLAYED)
        .count();
    assert_eq!(replayed, 3);

    // Classification steps were committed by the first run and not repeated
    assert_eq!(harness.oracle.calls(PromptRole::SentimentAnalysis), 1);
    assert_eq!(harness.oracle.calls(PromptRole::TopicExtraction), 1);

    let save = harness
        .journal
        .load(params.instance_id().as_str(), steps::SAVE_RESULTS)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(save.status, StepStatus::Completed);
    assert_eq!(save.attempts, 2);

    let row = harness.store.find_by_id(id).await.unwrap().unwrap();
    assert!(row.processed);
    assert_eq!(row.sentiment, Some(Sentiment::Positive));
}

#[tokio::test]
async fn test_finished_instance_reports_already_processed() {
    let harness = Harness::new(ScriptedOracle::answering("POSITIVE", "feature"));
    let id = harness.seed("email", "Great feature").await;
    let params = FeedbackWorkflowParams::new(id);

    let first = harness.workflow.run(params).await.unwrap();
    assert!(!first.is_already_processed());
    let saved = harness.store.find_by_id(id).await.unwrap().unwrap();

    let mut receiver = harness.events.subscribe();
    for _ in 0..2 {
        let again = harness.workflow.run(params).await.unwrap();
        assert_eq!(again, WorkflowOutcome::AlreadyProcessed { feedback_id: id });
    }

    assert_eq!(harness.oracle.calls(PromptRole::SentimentAnalysis), 1);
    assert_eq!(harness.store.find_by_id(id).await.unwrap().unwrap(), saved);

    let names = drain_event_names(&mut receiver);
    assert!(names.iter().any(|name| name == events::WORKFLOW_SKIPPED));
    assert!(!names.iter().any(|name| name == events::WORKFLOW_STEP_COMPLETED));
}

#[tokio::test]
async fn test_forced_inline_run_reclassifies_processed_feedback() {
    let harness = Harness::new(ScriptedOracle::new());
    let id = harness.seed("email", "The login page").await;

    harness
        .workflow
        .run_inline(FeedbackWorkflowParams::new(id), false)
        .await
        .unwrap();
    let before = harness.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(before.sentiment, Some(Sentiment::Neutral));

    harness
        .oracle
        .respond(PromptRole::SentimentAnalysis, "POSITIVE");
    harness.oracle.respond(PromptRole::TopicExtraction, "login");

    let outcome = harness
        .workflow
        .run_inline(FeedbackWorkflowParams::new(id), true)
        .await
        .unwrap();
    assert!(!outcome.is_already_processed());

    let after = harness.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(after.sentiment, Some(Sentiment::Positive));
    assert_eq!(after.topics.as_deref(), Some("login"));
    // Inline runs keep their journal private
    assert!(harness.journal.is_empty());
}

#[tokio::test]
async fn test_lifecycle_events_and_registry_snapshot() {
    let harness = Harness::new(ScriptedOracle::answering("NEUTRAL", "api"));
    let id = harness.seed("api", "The API works").await;
    let params = FeedbackWorkflowParams::new(id);
    let instance_id = params.instance_id();
    let mut receiver = harness.events.subscribe();

    assert!(harness.workflow.registry().try_claim(&instance_id, id));
    harness.workflow.run(params).await.unwrap();

    let names = drain_event_names(&mut receiver);
    assert_eq!(names.first().map(String::as_str), Some(events::WORKFLOW_STARTED));
    assert_eq!(names.last().map(String::as_str), Some(events::WORKFLOW_COMPLETED));
    assert_eq!(
        names
            .iter()
            .filter(|name| name.as_str() == events::WORKFLOW_STEP_COMPLETED)
            .count(),
        4
    );

    let snapshot = harness.workflow.registry().get(&instance_id).unwrap();
    assert_eq!(snapshot.state, WorkflowState::Done);
    assert_eq!(snapshot.transitions.len(), 4);
    assert!(snapshot.error.is_none());
    assert_eq!(harness.workflow.registry().live_count(), 0);
}

#[tokio::test]
async fn test_failed_instance_is_recorded_in_registry() {
    let harness = Harness::new(ScriptedOracle::new());
    let params = FeedbackWorkflowParams::new(77);
    let instance_id = params.instance_id();
    let mut receiver = harness.events.subscribe();

    harness.workflow.registry().try_claim(&instance_id, 77);
    assert!(harness.workflow.run(params).await.is_err());

    let snapshot = harness.workflow.registry().get(&instance_id).unwrap();
    assert_eq!(snapshot.state, WorkflowState::Failed);
    assert!(snapshot.error.unwrap().contains("not found"));

    let names = drain_event_names(&mut receiver);
    assert!(names.iter().any(|name| name == events::WORKFLOW_STEP_FAILED));
    assert_eq!(names.last().map(String::as_str), Some(events::WORKFLOW_FAILED));
}
