//! Chat-completions-backed implementation of the shared `chat_responder`
//! contract.
//!
//! This adapter translates `llm_api` stream semantics into the fragment
//! reply shape expected by the bridge core, and maps transport failures onto
//! the contract's three error classes.

use std::sync::Arc;
use std::time::Duration;

use chat_responder::{Responder, ResponderError, ResponderReply, Turn};
use llm_api::{ChatMessage, ChatStreamEvent, LlmApiClient, LlmApiConfig, LlmApiError, StreamResult};

/// Stable responder identifier used for explicit startup selection.
pub const LLM_API_RESPONDER_ID: &str = "llm-api";

/// Runtime configuration for the chat-completions responder.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmApiResponderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub timeout: Option<Duration>,
}

impl LlmApiResponderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            max_tokens: None,
            temperature: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_llm_api_config(self) -> LlmApiConfig {
        let mut config = LlmApiConfig::new(self.api_key, self.model);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn stream(&self, messages: Vec<ChatMessage>) -> Result<StreamResult, LlmApiError>;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: LlmApiClient,
}

impl StreamClient for DefaultStreamClient {
    fn stream(&self, messages: Vec<ChatMessage>) -> Result<StreamResult, LlmApiError> {
        // The responder seam is synchronous by contract; each call owns a
        // short-lived current-thread runtime.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                LlmApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        let request = self.client.request_for_messages(messages);
        runtime.block_on(self.client.stream(&request, None))
    }
}

/// `Responder` adapter backed by `llm_api` transport primitives.
pub struct LlmApiResponder {
    stream_client: Arc<dyn StreamClient>,
}

impl LlmApiResponder {
    /// Creates a responder using real chat-completions transport.
    pub fn new(config: LlmApiResponderConfig) -> Result<Self, ResponderError> {
        let client = LlmApiClient::new(config.into_llm_api_config()).map_err(map_error)?;
        Ok(Self {
            stream_client: Arc::new(DefaultStreamClient { client }),
        })
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(stream_client: Arc<dyn StreamClient>) -> Self {
        Self { stream_client }
    }
}

impl Responder for LlmApiResponder {
    fn respond(&self, turns: &[Turn]) -> Result<ResponderReply, ResponderError> {
        let messages = turns
            .iter()
            .map(|turn| ChatMessage::new(turn.role.as_str(), turn.text.clone()))
            .collect();

        let result = self.stream_client.stream(messages).map_err(map_error)?;

        let fragments: Vec<String> = result
            .events
            .into_iter()
            .filter_map(|event| match event {
                ChatStreamEvent::ContentDelta { delta } => Some(delta),
                _ => None,
            })
            .collect();

        if fragments.is_empty() && result.finish.is_none() {
            return Err(ResponderError::Backend(
                "stream ended without content".to_string(),
            ));
        }

        Ok(ResponderReply::from_fragments(fragments))
    }
}

fn map_error(error: LlmApiError) -> ResponderError {
    if error.is_auth() {
        ResponderError::Auth
    } else if error.is_rate_limit() {
        ResponderError::RateLimit
    } else {
        ResponderError::Backend(error.to_string())
    }
}
