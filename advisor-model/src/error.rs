//! Error types for the `advisor-model` crate.

use serde_json::Value;
use thiserror::Error;

use crate::backend::Endpoint;

/// Errors surfaced by completion backends and the [`CompletionClient`](crate::CompletionClient).
///
/// Every variant is classified: only [`Transient`](CompletionError::Transient)
/// is retried, and only [`EndpointUnsupported`](CompletionError::EndpointUnsupported)
/// switches a fallback-enabled call to the text endpoint.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompletionError {
    /// A failure that retrying may resolve: network error, timeout, HTTP
    /// 408, 429 or 5xx.
    #[error("Transient failure: {message}")]
    Transient {
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// A description of the failure.
        message: String,
    },

    /// A failure retrying cannot resolve: malformed request, rejected
    /// credentials, other 4xx responses.
    #[error("Fatal request error: {message}")]
    Fatal {
        /// HTTP status, when the server answered.
        status: Option<u16>,
        /// A description of the failure.
        message: String,
    },

    /// The server does not serve this endpoint (HTTP 404, 405 or 501).
    #[error("{endpoint} endpoint unsupported (HTTP {status}): {message}")]
    EndpointUnsupported {
        /// The endpoint that was rejected.
        endpoint: Endpoint,
        /// The HTTP status returned.
        status: u16,
        /// The server's error message.
        message: String,
    },

    /// The provider answered, but with neither a chat nor a text completion.
    #[error("Unexpected response shape: {body}")]
    UnexpectedResponseShape {
        /// The raw response body.
        body: String,
    },

    /// The caller cancelled the call.
    #[error("Completion cancelled")]
    Cancelled,

    /// The request was rejected before anything was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CompletionError {
    /// Whether the retry loop should try again after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether this error moves a fallback-enabled call to the text endpoint.
    pub fn triggers_fallback(&self) -> bool {
        matches!(self, Self::EndpointUnsupported { endpoint: Endpoint::Chat, .. })
    }

    /// Classify a non-success HTTP status returned by `endpoint`.
    ///
    /// `body` is reduced to the provider's error message when it has the
    /// usual `{"error": {"message": ..}}` or `{"message": ..}` form.
    pub fn from_status(endpoint: Endpoint, status: u16, body: &str) -> Self {
        let message = error_message(body);
        match status {
            404 | 405 | 501 => Self::EndpointUnsupported { endpoint, status, message },
            408 | 429 | 500..=599 => Self::Transient {
                status: Some(status),
                message: format!("HTTP {status}: {message}"),
            },
            _ => Self::Fatal { status: Some(status), message: format!("HTTP {status}: {message}") },
        }
    }

    /// Classify a transport-level `reqwest` failure.
    ///
    /// Request construction and redirect errors are fatal; everything else
    /// (connect, timeout, broken body) is transient.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_builder() || error.is_redirect() {
            return Self::Fatal { status: None, message: error.to_string() };
        }
        if let Some(status) = error.status() {
            return Self::Transient {
                status: Some(status.as_u16()),
                message: error.to_string(),
            };
        }
        let kind = if error.is_timeout() {
            "timeout"
        } else if error.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        Self::Transient { status: None, message: format!("{kind}: {error}") }
    }
}

/// Pull the human-readable message out of a provider error body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.pointer("/error/message").or_else(|| v.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

/// A convenience result type for completion operations.
pub type Result<T> = std::result::Result<T, CompletionError>;
