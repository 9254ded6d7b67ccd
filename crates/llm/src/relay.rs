//! Bounded, cancellable relay from one upstream chunk stream to one consumer.
//!
//! [`spawn_relay`] moves the upstream stream into a task that forwards
//! chunks into a bounded channel. The consumer side is a [`RelayStream`];
//! dropping it cancels the task, which drops the upstream stream and with it
//! the provider connection. [`spawn_linked_relay`] ties the task to a parent
//! token as well.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::LlmError;

/// Default capacity of the relay channel.
pub const DEFAULT_RELAY_CAPACITY: usize = 32;

/// SSE data sent with the completion event.
pub const DONE_DATA: &str = "[DONE]";

/// One event delivered to the downstream consumer.
///
/// A relay yields any number of `Chunk`s followed by exactly one of `Done`
/// or `Error`, unless it is cancelled first.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Chunk(String),
    Done,
    Error(String),
}

impl RelayEvent {
    /// SSE `event:` name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Chunk(_) => "message",
            Self::Done => "done",
            Self::Error(_) => "error",
        }
    }

    /// SSE `data:` payload. Chunks are wrapped as `{"text": ...}`.
    pub fn data(&self) -> String {
        match self {
            Self::Chunk(text) => json!({ "text": text }).to_string(),
            Self::Done => DONE_DATA.to_string(),
            Self::Error(message) => message.clone(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Chunk(_))
    }
}

/// Consumer half of a relay. Dropping it cancels the relay task.
pub struct RelayStream {
    rx: mpsc::Receiver<RelayEvent>,
    _cancel_on_drop: DropGuard,
}

impl Stream for RelayStream {
    type Item = RelayEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Spawn a relay task forwarding `upstream` through a channel of `capacity`.
///
/// Must be called within a Tokio runtime.
pub fn spawn_relay<S>(upstream: S, capacity: usize) -> RelayStream
where
    S: Stream<Item = Result<String, LlmError>> + Send + 'static,
{
    spawn_linked_relay(upstream, capacity, &CancellationToken::new())
}

/// Like [`spawn_relay`], but the relay also stops when `parent` is
/// cancelled. Cancelling the relay never cancels `parent`.
pub fn spawn_linked_relay<S>(
    upstream: S,
    capacity: usize,
    parent: &CancellationToken,
) -> RelayStream
where
    S: Stream<Item = Result<String, LlmError>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let cancel = parent.child_token();
    tokio::spawn(run_relay(upstream, tx, cancel.clone()));

    RelayStream {
        rx,
        _cancel_on_drop: cancel.drop_guard(),
    }
}

async fn run_relay<S>(upstream: S, tx: mpsc::Sender<RelayEvent>, cancel: CancellationToken)
where
    S: Stream<Item = Result<String, LlmError>> + Send + 'static,
{
    let mut upstream = Box::pin(upstream);
    let mut forwarded = 0_usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(forwarded, "Relay cancelled by consumer");
                return;
            }
            item = upstream.next() => item,
        };

        let event = match next {
            Some(Ok(text)) => RelayEvent::Chunk(text),
            Some(Err(e)) => {
                tracing::warn!(error = %e, forwarded, "Upstream stream failed");
                RelayEvent::Error(e.to_string())
            }
            None => RelayEvent::Done,
        };
        let terminal = event.is_terminal();

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            result = tx.send(event) => result.is_ok(),
        };
        if !sent {
            tracing::debug!(forwarded, "Relay consumer gone");
            return;
        }
        if terminal {
            tracing::debug!(forwarded, "Relay finished");
            return;
        }
        forwarded += 1;
    }
}
