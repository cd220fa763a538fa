//! Generation, export and topic suggestion tests.

mod common;

use blog_service::config::FallbackStrategyKind;
use blog_service::services::email::MockEmailProvider;
use common::{TestApp, DOWN_MODEL, GOOD_MODEL, POST_TEXT, QUOTA_MODEL};
use serde_json::{json, Value};

fn ai_trends() -> Value {
    json!({ "topic": "AI trends", "tone": "professional", "target_length": 500 })
}

#[tokio::test]
async fn primary_success_is_tagged_primary() {
    let app = TestApp::spawn().await;

    let response = app.post_json("/api/v1/posts", "s1", &ai_trends()).await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["provider"], "primary");
    assert_eq!(body["result"]["model"], GOOD_MODEL);
    assert_eq!(body["result"]["text"], POST_TEXT);
    assert_eq!(body["post"]["title"], "Stubbed Insights");
    assert!(body["export_files"]["json"]
        .as_str()
        .unwrap()
        .starts_with("linkedin_post_"));
    assert_eq!(app.stub.calls(), 1);
}

#[tokio::test]
async fn quota_error_falls_back_to_template() {
    let app = TestApp::spawn_with(
        QUOTA_MODEL,
        FallbackStrategyKind::Template,
        MockEmailProvider::new(true),
    )
    .await;

    let response = app.post_json("/api/v1/posts", "s1", &ai_trends()).await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["provider"], "fallback");
    assert!(!body["result"]["text"].as_str().unwrap().trim().is_empty());
    assert_eq!(app.stub.calls(), 1);
}

#[tokio::test]
async fn quota_error_falls_back_to_secondary_model_once() {
    let app = TestApp::spawn_with(
        QUOTA_MODEL,
        FallbackStrategyKind::Model,
        MockEmailProvider::new(true),
    )
    .await;

    let response = app.post_json("/api/v1/posts", "s1", &ai_trends()).await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["provider"], "fallback");
    assert_eq!(body["result"]["model"], GOOD_MODEL);
    assert_eq!(app.stub.calls(), 2);
}

#[tokio::test]
async fn disabled_fallback_surfaces_quota_as_429() {
    let app = TestApp::spawn_with(
        QUOTA_MODEL,
        FallbackStrategyKind::Disabled,
        MockEmailProvider::new(true),
    )
    .await;

    let response = app.post_json("/api/v1/posts", "s1", &ai_trends()).await;

    assert_eq!(response.status(), 429);
    assert!(response.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn disabled_fallback_surfaces_outage_as_503() {
    let app = TestApp::spawn_with(
        DOWN_MODEL,
        FallbackStrategyKind::Disabled,
        MockEmailProvider::new(true),
    )
    .await;

    let response = app.post_json("/api/v1/posts", "s1", &ai_trends()).await;

    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn empty_topic_is_rejected_before_any_network_call() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/api/v1/posts", "s1", &json!({ "topic": "   " }))
        .await;

    assert_eq!(response.status(), 422);
    assert_eq!(app.stub.calls(), 0);
}

#[tokio::test]
async fn unknown_tone_and_bad_length_are_rejected() {
    let app = TestApp::spawn().await;

    let tone = app
        .post_json("/api/v1/posts", "s1", &json!({ "topic": "AI", "tone": "sarcastic" }))
        .await;
    let length = app
        .post_json("/api/v1/posts", "s1", &json!({ "topic": "AI", "target_length": 10 }))
        .await;

    assert_eq!(tone.status(), 422);
    assert_eq!(length.status(), 422);
    assert_eq!(app.stub.calls(), 0);
}

#[tokio::test]
async fn export_round_trips_text_and_provenance() {
    let app = TestApp::spawn().await;
    let result = app.generate("s1", "AI trends").await;

    let response = app
        .post_json("/api/v1/posts/export?format=json", "s1", &json!({ "result": result }))
        .await;

    assert_eq!(response.status(), 200);
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains("linkedin_post_"));
    assert!(disposition.ends_with(".json\""));

    let exported: Value = response.json().await.unwrap();
    assert_eq!(exported["text"], result["text"]);
    assert_eq!(exported["provider"], result["provider"]);
    assert_eq!(exported["timestamp"], result["timestamp"]);
}

#[tokio::test]
async fn text_export_contains_only_the_post() {
    let app = TestApp::spawn().await;
    let result = app.generate("s1", "AI trends").await;

    let response = app
        .post_json("/api/v1/posts/export?format=text", "s1", &json!({ "result": result }))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), POST_TEXT);
}

#[tokio::test]
async fn export_rejects_result_without_provenance() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/posts/export",
            "s1",
            &json!({ "result": {
                "text": "hello",
                "provider": "none",
                "timestamp": "2024-05-01T10:00:00Z"
            }}),
        )
        .await;

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn batch_reports_each_item() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/posts/batch",
            "s1",
            &json!({ "requests": [
                { "topic": "AI trends" },
                { "topic": "" },
                { "topic": "Remote work", "tone": "casual" }
            ]}),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["items"][0]["status"], "ok");
    assert_eq!(body["items"][1]["status"], "error");
    assert_eq!(body["items"][1]["kind"], "invalid_request");
    assert_eq!(app.stub.calls(), 2);
}

#[tokio::test]
async fn topic_suggestions_are_parsed() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/api/v1/topics/suggestions",
            "s1",
            &json!({ "industry": "fintech", "keywords": ["payments"] }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 10);
    assert_eq!(topics[0], "Stub topic 1");
}

#[tokio::test]
async fn topic_suggestions_degrade_to_empty_list() {
    let app = TestApp::spawn_with(
        QUOTA_MODEL,
        FallbackStrategyKind::Template,
        MockEmailProvider::new(true),
    )
    .await;

    let response = app
        .post_json("/api/v1/topics/suggestions", "s1", &json!({ "industry": "fintech" }))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["topics"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn session_tracks_history_per_caller() {
    let app = TestApp::spawn_with(
        QUOTA_MODEL,
        FallbackStrategyKind::Template,
        MockEmailProvider::new(true),
    )
    .await;
    app.generate("alice", "AI trends").await;
    app.generate("alice", "Cloud costs").await;

    let alice: Value = app.get("/api/v1/session", "alice").await.json().await.unwrap();
    let bob: Value = app.get("/api/v1/session", "bob").await.json().await.unwrap();

    assert_eq!(alice["analytics"]["total_requests"], 2);
    assert_eq!(alice["analytics"]["fallback_successes"], 2);
    assert_eq!(alice["history"].as_array().unwrap().len(), 2);
    assert_eq!(alice["history"][1]["provenance"], "fallback");
    assert_eq!(bob["analytics"]["total_requests"], 0);
}
