use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};

use crate::config::LlmApiConfig;
use crate::error::{parse_error_message, LlmApiError};
use crate::events::{ChatStreamEvent, FinishReason};
use crate::payload::{ChatMessage, ChatRequest};
use crate::retry::{backoff_delay, should_retry, MAX_RETRIES};
use crate::sse::SseStreamParser;
use crate::url::normalize_chat_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct LlmApiClient {
    http: Client,
    config: LlmApiConfig,
}

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<ChatStreamEvent>,
    pub finish: Option<FinishReason>,
}

impl LlmApiClient {
    pub fn new(config: LlmApiConfig) -> Result<Self, LlmApiError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmApiError::MissingApiKey);
        }
        if config.model.trim().is_empty() {
            return Err(LlmApiError::MissingModel);
        }
        reqwest::Url::parse(&normalize_chat_url(&config.base_url))
            .map_err(|error| LlmApiError::InvalidBaseUrl(format!("{}: {error}", config.base_url)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(LlmApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LlmApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_url(&self.config.base_url)
    }

    /// Builds a request for `messages` with the configured transport defaults
    /// applied (model id, streaming on, completion cap, temperature).
    pub fn request_for_messages(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        let mut request = ChatRequest::new(self.config.model.clone(), messages);
        request.max_tokens = Some(self.config.max_tokens);
        request.temperature = self.config.temperature;
        request
    }

    pub fn build_headers(&self) -> Result<HeaderMap, LlmApiError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", self.config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|_| LlmApiError::Unknown("API key is not a valid header value".to_owned()))?,
        );

        if let Some(user_agent) = self.config.user_agent.as_deref() {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(user_agent).map_err(|_| {
                    LlmApiError::Unknown("user agent is not a valid header value".to_owned())
                })?,
            );
        }

        for (key, value) in &self.config.extra_headers {
            headers.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| LlmApiError::Unknown(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(value)
                    .map_err(|_| LlmApiError::Unknown(format!("invalid header value for {key}")))?,
            );
        }

        Ok(headers)
    }

    pub fn build_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, LlmApiError> {
        let headers = self.build_headers()?;
        let mut payload = request.clone();
        payload.stream = true;

        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(&payload))
    }

    pub async fn send_with_retry(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, LlmApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(LlmApiError::Cancelled);
            }

            let response = self.build_request(request)?.send();
            let response = await_or_cancel(response, cancellation)
                .await?
                .map_err(LlmApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_else(|_| {
                            status
                                .canonical_reason()
                                .unwrap_or("request failed")
                                .to_string()
                        });
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && should_retry(status.as_u16(), &body) {
                        await_or_cancel(tokio::time::sleep(backoff_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(LlmApiError::Status(status, message));
                }
                Err(error) => {
                    let message = error.to_string();
                    last_error = Some(message.clone());
                    if attempt < MAX_RETRIES {
                        await_or_cancel(tokio::time::sleep(backoff_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                    return Err(LlmApiError::RetryExhausted {
                        status: last_status,
                        last_error,
                    });
                }
            }
        }

        Err(LlmApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    pub async fn stream_with_handler<F>(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<Option<FinishReason>, LlmApiError>
    where
        F: FnMut(ChatStreamEvent),
    {
        let response = self.send_with_retry(request, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut finish = None;

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(LlmApiError::Cancelled);
            }
            let chunk = chunk.map_err(LlmApiError::from)?;
            for event in parser.feed(&chunk) {
                process_stream_event(event, &mut finish, &mut on_event)?;
            }
        }

        if is_cancelled(cancellation) {
            return Err(LlmApiError::Cancelled);
        }
        if !parser.is_empty_buffer() {
            return Err(LlmApiError::MalformedSse(
                "response stream ended inside an unterminated frame".to_owned(),
            ));
        }

        Ok(finish)
    }

    pub async fn stream(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamResult, LlmApiError> {
        let mut events = Vec::new();
        let finish = self
            .stream_with_handler(request, cancellation, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamResult { events, finish })
    }
}

fn process_stream_event<F>(
    event: ChatStreamEvent,
    finish: &mut Option<FinishReason>,
    on_event: &mut F,
) -> Result<(), LlmApiError>
where
    F: FnMut(ChatStreamEvent),
{
    if let ChatStreamEvent::Error { code, message } = &event {
        return Err(LlmApiError::StreamFailed {
            code: code.clone(),
            message: message
                .clone()
                .or_else(|| code.clone())
                .unwrap_or_else(|| "backend stream error".to_owned()),
        });
    }

    if let ChatStreamEvent::Finished { reason } = &event {
        *finish = *reason;
    }

    on_event(event);
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, LlmApiError>
where
    F: Future,
{
    let Some(cancellation) = cancellation else {
        return Ok(future.await);
    };

    let mut future = Box::pin(future);
    loop {
        if cancellation.load(Ordering::Acquire) {
            return Err(LlmApiError::Cancelled);
        }

        match tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            Ok(output) => return Ok(output),
            Err(_) => continue,
        }
    }
}
