//! HTTP client for one OpenAI-compatible `/chat/completions` endpoint.

use futures::stream::{self, BoxStream, StreamExt};
use promptvault_core::chat::ChatMessage;
use promptvault_core::error::CoreError;
use promptvault_core::provider::ProviderConfig;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::sse::decode_stream;

/// Base URL used when a provider has none configured.
pub const DEFAULT_API_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Model used when neither the request nor the provider names one.
pub const DEFAULT_MODEL: &str = "qwen-turbo";

const COMPLETIONS_PATH: &str = "/chat/completions";

/// System prompt for prompt optimization when no provider or server prompt is set.
pub const DEFAULT_OPTIMIZE_SYSTEM_PROMPT: &str = "\
You are an expert in writing prompts for large language models. \
Rewrite the prompt you are given so that it is clear, specific and easy for a model to follow, \
while keeping its original intent.

When improving a prompt:
- State the role the model should take and the expertise it should show.
- Describe the task precisely and split complex work into ordered steps.
- Specify the expected output format, length and tone.
- List constraints and things to avoid.
- Add short examples when they make the expected output clearer.

Answer in this structure:
1. Analysis: the strengths and gaps of the original prompt.
2. Optimized prompt: the full rewritten prompt in a fenced code block.
3. Key changes: three to five improvements and why they help.
4. Usage notes: anything the user may still need to adjust or supply.

Keep the language of the original prompt. If essential information is missing, say what is needed.";

/// Resolve a configured base URL to the full completions endpoint.
///
/// Empty falls back to [`DEFAULT_API_URL`]; a trailing `/` is dropped and
/// `/chat/completions` appended unless already present.
pub fn normalize_api_url(url: Option<&str>) -> String {
    let base = url
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .trim_end_matches('/');
    if base.ends_with(COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{base}{COMPLETIONS_PATH}")
    }
}

// ---------------------------------------------------------------------------
// Options and payloads
// ---------------------------------------------------------------------------

/// Sampling parameters for one completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Reject parameters outside the ranges OpenAI-compatible APIs accept.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(CoreError::Validation(format!(
                    "temperature must be between 0 and 2 (got {t})"
                )));
            }
        }
        if let Some(p) = self.top_p {
            if !(p > 0.0 && p <= 1.0) {
                return Err(CoreError::Validation(format!(
                    "top_p must be in (0, 1] (got {p})"
                )));
            }
        }
        if self.max_tokens == Some(0) {
            return Err(CoreError::Validation(
                "max_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Text chunks of a streamed completion.
pub type ChunkStream = BoxStream<'static, Result<String, LlmError>>;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for a single provider endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ChatClient {
    /// Create a client with its own connection pool.
    pub fn new(api_url: Option<&str>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, api_key)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (shared
    /// connection pool across providers).
    pub fn with_client(
        client: reqwest::Client,
        api_url: Option<&str>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: normalize_api_url(api_url),
            api_key: api_key.into(),
        }
    }

    /// Client for a configured provider.
    pub fn for_provider(client: reqwest::Client, provider: &ProviderConfig) -> Self {
        Self::with_client(client, provider.api_url.as_deref(), provider.api_key.clone())
    }

    /// Full completions URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a completion and return the first choice's message content.
    pub async fn complete(
        &self,
        options: &ChatOptions,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let response = self.request(options, messages, false).send().await?;
        let response = Self::ensure_success(response).await?;

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Malformed(e.to_string()))?;

        let first = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;
        Ok(first.message.and_then(|m| m.content).unwrap_or_default())
    }

    /// Open a streaming completion.
    ///
    /// The connection is made when the stream is first polled. A failure to
    /// connect, or a non-2xx status, arrives as the stream's single item.
    pub fn stream(&self, options: &ChatOptions, messages: &[ChatMessage]) -> ChunkStream {
        let request = self.request(options, messages, true);

        stream::once(async move {
            let response = Self::ensure_success(request.send().await?).await?;
            Ok::<_, LlmError>(decode_stream(response.bytes_stream()))
        })
        .flat_map(|opened| match opened {
            Ok(chunks) => chunks,
            Err(e) => stream::iter([Err(e)]).boxed(),
        })
        .boxed()
    }

    // ---- private helpers ----

    fn request(
        &self,
        options: &ChatOptions,
        messages: &[ChatMessage],
        stream: bool,
    ) -> reqwest::RequestBuilder {
        let model = if options.model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            options.model.as_str()
        };
        let body = ChatRequest {
            model,
            messages,
            stream,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
        };
        self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
    }

    /// Return the response unchanged on success, or an [`LlmError::Api`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {e}>"));
        Err(LlmError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
