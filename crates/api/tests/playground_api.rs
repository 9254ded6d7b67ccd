//! Test and optimize endpoints against a stand-in OpenAI-compatible provider.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, body_text, build_app_with_config, build_test_app, post_json};
use serde_json::json;
use sqlx::PgPool;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_BODY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n\
data: [DONE]\n\n";

/// Store one provider pointing at the mock server.
async fn configure_provider(pool: &PgPool, server: &MockServer, system_prompt: Option<&str>) {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/llm-providers",
        json!({
            "providers": [{
                "id": "mock",
                "name": "Mock",
                "api_key": "sk-mock",
                "api_url": format!("{}/v1", server.uri()),
                "model": "mock-model",
                "system_prompt": system_prompt,
                "is_default": true,
            }]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

fn test_request(stream: bool) -> serde_json::Value {
    json!({
        "messages": [{ "role": "user", "content": "Say hello" }],
        "stream": stream,
        "temperature": 0.2,
    })
}

fn app(pool: &PgPool) -> Router {
    build_test_app(pool.clone())
}

// ---------------------------------------------------------------------------
// Test prompt
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_prompt_returns_completion(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-mock"))
        .and(body_partial_json(json!({
            "model": "mock-model",
            "stream": false,
            "temperature": 0.2,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Hello!" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    configure_provider(&pool, &server, None).await;

    let response = post_json(app(&pool), "/api/test-prompt", test_request(false)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["response"], "Hello!");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_prompt_streams_sse_events(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(SSE_BODY),
        )
        .mount(&server)
        .await;
    configure_provider(&pool, &server, None).await;

    let response = post_json(app(&pool), "/api/test-prompt", test_request(true)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let body = body_text(response).await;
    assert!(body.contains("event: message"));
    assert!(body.contains(r#"data: {"text":"Hello"}"#));
    assert!(body.contains(r#"data: {"text":" world"}"#));
    assert_eq!(body.matches("event: done").count(), 1);
    assert!(!body.contains("event: error"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn stream_reports_upstream_failure_as_error_event(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    configure_provider(&pool, &server, None).await;

    let response = post_json(app(&pool), "/api/test-prompt", test_request(true)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert_eq!(body.matches("event: error").count(), 1);
    assert!(!body.contains("event: done"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upstream_failure_maps_to_bad_gateway(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    configure_provider(&pool, &server, None).await;

    let response = post_json(app(&pool), "/api/test-prompt", test_request(false)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "PROVIDER_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_prompt_without_provider_is_rejected(pool: PgPool) {
    let response = post_json(app(&pool), "/api/test-prompt", test_request(false)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "No LLM provider configured"
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_prompt_with_unknown_provider_is_rejected(pool: PgPool) {
    let server = MockServer::start().await;
    configure_provider(&pool, &server, None).await;

    let mut request = test_request(false);
    request["provider_id"] = json!("ghost");
    let response = post_json(app(&pool), "/api/test-prompt", request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid provider id");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_prompt_rejects_empty_messages(pool: PgPool) {
    let response = post_json(
        app(&pool),
        "/api/test-prompt",
        json!({ "messages": [] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn env_provider_is_used_when_none_stored(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-env"))
        .and(body_partial_json(json!({ "model": "env-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "from env" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = common::test_config();
    config.llm.api_key = "sk-env".to_string();
    config.llm.api_url = format!("{}/v1", server.uri());
    config.llm.model = "env-model".to_string();

    let response = post_json(
        build_app_with_config(pool, config),
        "/api/test-prompt",
        test_request(false),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["response"], "from env");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn settings_provider_is_preferred_over_env(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-settings"))
        .and(body_partial_json(json!({ "model": "settings-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "from settings" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = post_json(
        app(&pool),
        "/api/settings",
        json!({
            "llm_api_key": "sk-settings",
            "llm_api_url": format!("{}/v1", server.uri()),
            "llm_model": "settings-model",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = common::test_config();
    config.llm.api_key = "sk-env".to_string();
    let response = post_json(
        build_app_with_config(pool, config),
        "/api/test-prompt",
        test_request(false),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["response"], "from settings");
}

// ---------------------------------------------------------------------------
// Optimize prompt
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn optimize_uses_provider_system_prompt(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "Be terse." },
                { "role": "user", "content": "write a poem" },
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Write a short poem." } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    configure_provider(&pool, &server, Some("Be terse.")).await;

    let response = post_json(
        app(&pool),
        "/api/optimize-prompt",
        json!({ "prompt": "write a poem" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["data"]["optimized_prompt"],
        "Write a short poem."
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn optimize_streams_sse_events(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(SSE_BODY),
        )
        .mount(&server)
        .await;
    configure_provider(&pool, &server, None).await;

    let response = post_json(
        app(&pool),
        "/api/optimize-prompt",
        json!({ "prompt": "write a poem", "stream": true }),
    )
    .await;
    let body = body_text(response).await;
    assert!(body.contains(r#"data: {"text":"Hello"}"#));
    assert_eq!(body.matches("event: done").count(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn optimize_rejects_blank_prompt(pool: PgPool) {
    let response = post_json(
        app(&pool),
        "/api/optimize-prompt",
        json!({ "prompt": "  " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
