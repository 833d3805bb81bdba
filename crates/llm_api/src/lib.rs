//! Transport-only chat-completions API client primitives.
//!
//! This crate owns request building, SSE stream parsing, retry policy and
//! error classification for an OpenAI-style `/chat/completions` endpoint
//! only. It intentionally contains no conversation state, no prompt
//! management and no line-protocol coupling.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use client::{CancellationSignal, LlmApiClient, StreamResult};
pub use config::LlmApiConfig;
pub use error::LlmApiError;
pub use events::{ChatStreamEvent, FinishReason};
pub use payload::{ChatMessage, ChatRequest};
pub use sse::SseStreamParser;
pub use url::normalize_chat_url;

/// Status type surfaced by [`LlmApiError::Status`], re-exported so consumers
/// do not need a direct `reqwest` dependency.
pub use reqwest::StatusCode;
