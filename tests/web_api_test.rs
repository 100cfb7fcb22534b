//! REST API tests against the router over in-memory backends.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{ScriptedOracle, SystemHarness};
use feedback_core::models::{NewFeedback, Sentiment};
use feedback_core::orchestration::FeedbackWorkflowParams;
use feedback_core::store::FeedbackStore;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_fails_when_store_is_down() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();
    harness.store.set_available(false);

    let (status, body) = send(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn test_created_feedback_is_processed_in_background() {
    let harness = SystemHarness::new(ScriptedOracle::answering("POSITIVE", "dashboard"));
    let app = harness.system.router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/feedback",
        Some(json!({ "source": "email", "content": "Love the dashboard", "author": "sam" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["dispatch"]["mode"], "dispatched_async");
    let id = body["id"].as_i64().unwrap();

    harness.system.trigger().wait_idle().await;

    let (status, row) = send(&app, Method::GET, &format!("/api/feedback/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["processed"], true);
    assert_eq!(row["sentiment"], "POSITIVE");
    assert_eq!(row["topics"], "dashboard");
    assert_eq!(row["author"], "sam");
}

#[tokio::test]
async fn test_create_feedback_rejects_empty_content() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/feedback",
        Some(json!({ "source": "email", "content": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request");
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_unknown_feedback_is_not_found() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();

    let (status, body) = send(&app, Method::GET, "/api/feedback/4242", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_list_filters_by_source_and_sentiment() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();
    let workflow = harness.system.app_state().workflow.clone();

    for (source, content) in [
        ("email", "Love the product"),
        ("email", "App crashes daily"),
        ("twitter", "Love it"),
    ] {
        let row = harness
            .store
            .insert(&NewFeedback::new(source, content))
            .await
            .unwrap();
        workflow
            .run_inline(FeedbackWorkflowParams::new(row.id), false)
            .await
            .unwrap();
    }

    let (status, rows) = send(&app, Method::GET, "/api/feedback?source=email", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 2);

    let (_, rows) = send(
        &app,
        Method::GET,
        "/api/feedback?source=email&sentiment=positive",
        None,
    )
    .await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["content"], "Love the product");

    let (_, rows) = send(&app, Method::GET, "/api/feedback?limit=1", None).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/api/feedback?sentiment=ecstatic", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_reclassifies_one_row() {
    let harness = SystemHarness::new(ScriptedOracle::answering("NEGATIVE", "login"));
    let app = harness.system.router();
    let row = harness
        .store
        .insert(&NewFeedback::new("email", "Login is broken"))
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/analyze",
        Some(json!({ "id": row.id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sentiment"], "NEGATIVE");
    assert_eq!(body["sentiment_score"], 0.2);
    assert_eq!(body["processed"], true);

    let (status, _) = send(&app, Method::POST, "/api/analyze", Some(json!({ "id": 9999 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_process_pending_reports_sweep() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();
    for content in ["one", "two"] {
        harness
            .store
            .insert(&NewFeedback::new("email", content))
            .await
            .unwrap();
    }

    let (status, body) = send(&app, Method::POST, "/api/process-pending", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], 2);
    assert_eq!(body["attempted"], 2);

    harness.system.trigger().wait_idle().await;
    assert!(harness.store.unprocessed_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_answers_from_recent_feedback() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();
    let workflow = harness.system.app_state().workflow.clone();
    let row = harness
        .store
        .insert(&NewFeedback::new("email", "The app has a crash on start"))
        .await
        .unwrap();
    workflow
        .run_inline(FeedbackWorkflowParams::new(row.id), false)
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/chat",
        Some(json!({ "query": "Any complaints?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        "Based on recent feedback, there are 1 negative feedback items. Common issues include bugs, crashes, and feature requests."
    );
    assert_eq!(harness.store.chat_cache_entries().len(), 1);

    let (status, _) = send(&app, Method::POST, "/api/chat", Some(json!({ "query": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_and_outage() {
    let harness = SystemHarness::new(ScriptedOracle::new());
    let app = harness.system.router();
    let workflow = harness.system.app_state().workflow.clone();
    for content in ["Love it", "Great work"] {
        let row = harness
            .store
            .insert(&NewFeedback::new("email", content))
            .await
            .unwrap();
        workflow
            .run_inline(FeedbackWorkflowParams::new(row.id), false)
            .await
            .unwrap();
    }
    harness
        .store
        .insert(&NewFeedback::new("twitter", "pending row"))
        .await
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    let by_sentiment = body["by_sentiment"].as_array().unwrap();
    assert_eq!(by_sentiment.len(), 1);
    assert_eq!(by_sentiment[0]["sentiment"], Sentiment::Positive.as_str());
    assert_eq!(by_sentiment[0]["count"], 2);
    assert_eq!(body["by_source"].as_array().unwrap().len(), 2);

    harness.store.set_available(false);
    let (status, body) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Database error");
}

#[tokio::test]
async fn test_workflow_status_endpoint() {
    let harness = SystemHarness::new(ScriptedOracle::answering("POSITIVE", "api"));
    let app = harness.system.router();
    let row = harness
        .store
        .insert(&NewFeedback::new("api", "Excellent API"))
        .await
        .unwrap();
    harness.system.app_state().dispatcher.dispatch(row.id).await;
    harness.system.trigger().wait_idle().await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/workflows/feedback-{}", row.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["instance"]["state"], "done");
    assert_eq!(body["steps"].as_array().unwrap().len(), 4);

    let (status, _) = send(&app, Method::GET, "/api/workflows/feedback-999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/workflows/not-an-instance", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
