//! Playground session: one test run at a time, reassembled from relay events.
//!
//! The session renders message templates, arms a cancellation token for the
//! run, appends streamed chunks to a response buffer, and on completion
//! produces a [`TestHistoryDraft`] ready to be persisted. Starting a new run
//! cancels the previous one, and any relay linked to its token (see
//! [`spawn_linked_relay`]) drops its upstream connection. Chunks from a
//! cancelled run are ignored.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::StreamExt;
use promptvault_core::chat::ChatMessage;
use promptvault_core::error::CoreError;
use promptvault_core::playground::{
    estimate_cost, estimate_message_tokens, estimate_tokens, render_messages, retain_latest,
    VariableDelimiters,
};
use promptvault_core::types::Timestamp;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::client::{ChatClient, ChatOptions};
use crate::relay::{spawn_linked_relay, RelayEvent};

/// Number of drafts a session keeps when no limit is given.
pub const DEFAULT_SESSION_HISTORY: usize = 20;

/// Everything needed to start one playground run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub title: Option<String>,
    /// Message templates, before variable substitution.
    pub messages: Vec<ChatMessage>,
    pub variable_values: BTreeMap<String, String>,
    pub delimiters: VariableDelimiters,
    pub options: ChatOptions,
    pub provider_id: Option<String>,
    pub provider_name: Option<String>,
    /// Price per million input tokens.
    pub input_price: Option<f64>,
    /// Price per million output tokens.
    pub output_price: Option<f64>,
}

/// A completed run, shaped like the test-history request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestHistoryDraft {
    pub title: Option<String>,
    /// Messages after variable substitution.
    pub messages: Vec<ChatMessage>,
    pub response: String,
    pub provider_id: Option<String>,
    pub provider_name: Option<String>,
    pub model: String,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub variable_values: BTreeMap<String, String>,
    pub variable_prefix: String,
    pub variable_suffix: String,
    pub token_count: usize,
    pub cost: f64,
    pub input_price: Option<f64>,
    pub output_price: Option<f64>,
    #[serde(skip)]
    pub created_at: Timestamp,
}

/// Handle for the run started by [`PlaygroundSession::begin`].
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub run_id: u64,
    /// Rendered messages to send upstream.
    pub messages: Vec<ChatMessage>,
    /// Cancelled when the run is superseded or cancelled. Pass it to
    /// [`spawn_linked_relay`] so the upstream goes with the run.
    pub cancel: CancellationToken,
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(TestHistoryDraft),
    Failed(String),
    Cancelled,
}

#[derive(Debug)]
struct ActiveRun {
    id: u64,
    cancel: CancellationToken,
    request: RunRequest,
    messages: Vec<ChatMessage>,
    response: String,
}

/// Client-side state of the prompt playground.
#[derive(Debug)]
pub struct PlaygroundSession {
    active: Option<ActiveRun>,
    next_run_id: u64,
    history: Vec<TestHistoryDraft>,
    max_history: usize,
}

impl Default for PlaygroundSession {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_HISTORY)
    }
}

impl PlaygroundSession {
    pub fn new(max_history: usize) -> Self {
        Self {
            active: None,
            next_run_id: 0,
            history: Vec::new(),
            max_history,
        }
    }

    /// Start a run, cancelling any run still in flight.
    ///
    /// Fails without touching the current run if the options are invalid.
    pub fn begin(&mut self, request: RunRequest) -> Result<RunHandle, CoreError> {
        request.options.validate()?;
        if request.messages.is_empty() {
            return Err(CoreError::Validation(
                "At least one message is required".to_string(),
            ));
        }

        self.cancel();

        let messages = render_messages(
            &request.messages,
            &request.variable_values,
            &request.delimiters,
        );
        self.next_run_id += 1;
        let run = ActiveRun {
            id: self.next_run_id,
            cancel: CancellationToken::new(),
            request,
            messages: messages.clone(),
            response: String::new(),
        };
        let handle = RunHandle {
            run_id: run.id,
            messages,
            cancel: run.cancel.clone(),
        };
        self.active = Some(run);
        Ok(handle)
    }

    /// Cancel the run in flight, if any. Its buffer is discarded.
    pub fn cancel(&mut self) {
        if let Some(run) = self.active.take() {
            run.cancel.cancel();
            tracing::debug!(run_id = run.id, "Playground run cancelled");
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    /// Response text received so far for the current run.
    pub fn response(&self) -> &str {
        self.active.as_ref().map_or("", |run| run.response.as_str())
    }

    /// Completed drafts, newest first.
    pub fn history(&self) -> &[TestHistoryDraft] {
        &self.history
    }

    /// Apply one relay event to run `run_id`.
    ///
    /// Events for a run that is no longer current are ignored and return
    /// `None`, as do chunks. A terminal event ends the run.
    pub fn apply(&mut self, run_id: u64, event: RelayEvent) -> Option<RunOutcome> {
        let run = self.active.as_mut().filter(|run| run.id == run_id)?;

        match event {
            RelayEvent::Chunk(text) => {
                run.response.push_str(&text);
                None
            }
            RelayEvent::Error(message) => {
                self.active = None;
                Some(RunOutcome::Failed(message))
            }
            RelayEvent::Done => {
                let run = self.active.take()?;
                let draft = Self::draft(run);
                self.record(draft.clone());
                Some(RunOutcome::Completed(draft))
            }
        }
    }

    /// Drive a full streaming run against `client`.
    pub async fn run(
        &mut self,
        client: &ChatClient,
        request: RunRequest,
        capacity: usize,
    ) -> Result<RunOutcome, CoreError> {
        let handle = self.begin(request)?;
        let options = self
            .active
            .as_ref()
            .map(|run| run.request.options.clone())
            .unwrap_or_default();

        // The relay stops when `handle.cancel` fires or when this future is
        // dropped along with `events`.
        let mut events = spawn_linked_relay(
            client.stream(&options, &handle.messages),
            capacity,
            &handle.cancel,
        );
        while let Some(event) = events.next().await {
            if let Some(outcome) = self.apply(handle.run_id, event) {
                return Ok(outcome);
            }
        }
        self.cancel();
        Ok(RunOutcome::Cancelled)
    }

    fn draft(run: ActiveRun) -> TestHistoryDraft {
        let ActiveRun {
            request, messages, response, ..
        } = run;

        let input_tokens = estimate_message_tokens(&messages);
        let output_tokens = estimate_tokens(&response);
        let cost = estimate_cost(
            input_tokens,
            output_tokens,
            request.input_price,
            request.output_price,
        );

        TestHistoryDraft {
            title: request.title,
            messages,
            response,
            provider_id: request.provider_id,
            provider_name: request.provider_name,
            model: request.options.model,
            temperature: request.options.temperature,
            top_p: request.options.top_p,
            max_tokens: request.options.max_tokens,
            variable_values: request.variable_values,
            variable_prefix: request.delimiters.prefix,
            variable_suffix: request.delimiters.suffix,
            token_count: input_tokens + output_tokens,
            cost,
            input_price: request.input_price,
            output_price: request.output_price,
            created_at: Utc::now(),
        }
    }

    fn record(&mut self, draft: TestHistoryDraft) {
        self.history.insert(0, draft);
        let evicted = retain_latest(&mut self.history, self.max_history, |d| d.created_at);
        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), "Playground history trimmed");
        }
    }
}
