//! Prompt test and optimize handlers.
//!
//! With `stream: true` the upstream completion is relayed as server-sent
//! events: `message` events carrying `{"text": ...}`, then exactly one `done`
//! or `error` event. Closing the downstream connection cancels the relay and
//! drops the upstream connection.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use promptvault_core::chat::ChatMessage;
use promptvault_core::error::CoreError;
use promptvault_core::provider::{resolve_provider, ProviderConfig};
use promptvault_llm::client::DEFAULT_OPTIMIZE_SYSTEM_PROMPT;
use promptvault_llm::{spawn_relay, ChatClient, ChatOptions, RelayEvent};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::providers::load_providers;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/test-prompt`.
#[derive(Debug, Deserialize)]
pub struct TestPromptRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    pub provider_id: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Body of `POST /api/optimize-prompt`.
#[derive(Debug, Deserialize)]
pub struct OptimizePromptRequest {
    pub prompt: String,
    #[serde(default)]
    pub stream: bool,
    pub provider_id: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TestPromptResponse {
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct OptimizePromptResponse {
    pub optimized_prompt: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn pick_provider(state: &AppState, provider_id: Option<&str>) -> AppResult<ProviderConfig> {
    let providers = load_providers(state).await?;
    Ok(resolve_provider(&providers, provider_id)?.clone())
}

fn chat_options(
    provider: &ProviderConfig,
    model: Option<String>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_tokens: Option<u32>,
) -> Result<ChatOptions, CoreError> {
    let options = ChatOptions {
        model: model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.model.clone()),
        temperature,
        top_p,
        max_tokens,
    };
    options.validate()?;
    Ok(options)
}

/// Relay a streamed completion to the client as SSE.
fn sse_response(
    state: &AppState,
    client: &ChatClient,
    options: &ChatOptions,
    messages: &[ChatMessage],
) -> Response {
    let relay = spawn_relay(
        client.stream(options, messages),
        state.config.relay_channel_capacity,
    );
    let events = relay.map(|event: RelayEvent| {
        Ok::<_, Infallible>(Event::default().event(event.event_name()).data(event.data()))
    });
    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/test-prompt
pub async fn test_prompt(
    State(state): State<AppState>,
    Json(input): Json<TestPromptRequest>,
) -> AppResult<Response> {
    if input.messages.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one message is required".to_string(),
        )));
    }

    let provider = pick_provider(&state, input.provider_id.as_deref()).await?;
    let options = chat_options(
        &provider,
        input.model,
        input.temperature,
        input.top_p,
        input.max_tokens,
    )?;
    let client = ChatClient::for_provider(state.http.clone(), &provider);

    tracing::info!(
        provider_id = %provider.id,
        model = %options.model,
        messages = input.messages.len(),
        stream = input.stream,
        "Testing prompt"
    );

    if input.stream {
        return Ok(sse_response(&state, &client, &options, &input.messages));
    }

    let response = client.complete(&options, &input.messages).await?;
    Ok(Json(DataResponse::new(TestPromptResponse { response })).into_response())
}

/// POST /api/optimize-prompt
///
/// The system prompt comes from the provider, else `LLM_SYSTEM_PROMPT`, else
/// the built-in optimization prompt.
pub async fn optimize_prompt(
    State(state): State<AppState>,
    Json(input): Json<OptimizePromptRequest>,
) -> AppResult<Response> {
    if input.prompt.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "prompt is required".to_string(),
        )));
    }

    let provider = pick_provider(&state, input.provider_id.as_deref()).await?;
    let options = chat_options(
        &provider,
        input.model,
        input.temperature,
        input.top_p,
        input.max_tokens,
    )?;
    let client = ChatClient::for_provider(state.http.clone(), &provider);

    let system_prompt = provider
        .system_prompt
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .or_else(|| state.config.system_prompt())
        .unwrap_or(DEFAULT_OPTIMIZE_SYSTEM_PROMPT);
    let messages = [
        ChatMessage::system(system_prompt),
        ChatMessage::user(input.prompt),
    ];

    tracing::info!(
        provider_id = %provider.id,
        model = %options.model,
        stream = input.stream,
        "Optimizing prompt"
    );

    if input.stream {
        return Ok(sse_response(&state, &client, &options, &messages));
    }

    let optimized_prompt = client.complete(&options, &messages).await?;
    Ok(Json(DataResponse::new(OptimizePromptResponse { optimized_prompt })).into_response())
}
