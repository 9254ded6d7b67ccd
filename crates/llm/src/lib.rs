//! Client for OpenAI-compatible chat completion providers.
//!
//! - [`client`]: request building, blocking and streaming completions
//! - [`sse`]: decoding of the provider's server-sent-event body
//! - [`relay`]: bounded, cancellable pipe from one upstream stream to one
//!   downstream consumer
//! - [`session`]: playground run state that reassembles relayed chunks

pub mod client;
pub mod error;
pub mod relay;
pub mod session;
pub mod sse;

pub use client::{ChatClient, ChatOptions, ChunkStream};
pub use error::LlmError;
pub use relay::{spawn_linked_relay, spawn_relay, RelayEvent, RelayStream};
