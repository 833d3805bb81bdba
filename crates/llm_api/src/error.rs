use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum LlmApiError {
    MissingApiKey,
    MissingModel,
    InvalidBaseUrl(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    MalformedSse(String),
    Serde(JsonError),
    RetryExhausted {
        status: Option<StatusCode>,
        last_error: Option<String>,
    },
    StreamFailed {
        code: Option<String>,
        message: String,
    },
    Cancelled,
    Unknown(String),
}

impl LlmApiError {
    /// True when the failure is a rejected credential.
    pub fn is_auth(&self) -> bool {
        match self {
            Self::MissingApiKey => true,
            Self::Status(status, _) => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }

    /// True when the failure is a rate or usage limit.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::Status(status, _) => *status == StatusCode::TOO_MANY_REQUESTS,
            Self::RetryExhausted { status, .. } => *status == Some(StatusCode::TOO_MANY_REQUESTS),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(rename = "error")]
    pub value: Option<ErrorPayloadFields>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
}

impl fmt::Display for LlmApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "API key is required"),
            Self::MissingModel => write!(f, "model id is required"),
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::MalformedSse(message) => write!(f, "malformed SSE event: {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::RetryExhausted { status, last_error } => {
                let status = status
                    .map(|status| status.as_u16().to_string())
                    .unwrap_or_else(|| "n/a".to_owned());
                write!(
                    f,
                    "retry exhausted after max attempts (status: {status}, last_error: {last_error:?})"
                )
            }
            Self::StreamFailed { code, message } => match code {
                Some(code) if !code.trim().is_empty() => {
                    write!(f, "stream failed ({code}): {message}")
                }
                _ => write!(f, "stream failed: {message}"),
            },
            Self::Cancelled => write!(f, "request was cancelled"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for LlmApiError {}

impl From<reqwest::Error> for LlmApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for LlmApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extracts the most useful human-readable message from an HTTP error body.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let parsed = match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload,
        Err(_) => {
            return if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.to_string()
            };
        }
    };

    if let Some(message) = parsed
        .value
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
    {
        return message;
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}
