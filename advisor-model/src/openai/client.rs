//! `async-openai` backed completion backend.

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{CreateChatCompletionRequest, CreateCompletionRequest},
};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::backend::{CompletionBackend, Endpoint};
use crate::config::CompletionConfig;
use crate::error::{CompletionError, Result};

const CHAT_SUFFIX: &str = "/chat/completions";
const TEXT_SUFFIX: &str = "/completions";

/// Error types a provider reports for a failure worth retrying.
const TRANSIENT_TYPES: [&str; 4] = ["server_error", "rate_limit", "overloaded", "timeout"];

/// A [`CompletionBackend`] that goes through the `async-openai` SDK.
///
/// The wire body is decoded into the SDK's request types, so provider
/// extensions the SDK does not model are dropped.
///
/// The SDK fixes the endpoint suffixes, so `chat_path` must end in
/// `/chat/completions` and `text_path` must be the same prefix followed by
/// `/completions`.
///
/// The SDK reports API errors without their HTTP status. They are
/// classified from the provider's error type: server errors, rate limits and
/// errors with no type at all are transient, and a reply body the SDK cannot
/// decode (a plain-text error page, for instance) is transient as well. An
/// unsupported endpoint therefore surfaces as a fatal error rather than
/// triggering fallback. The SDK also retries HTTP 429 on its own schedule
/// before the client's retry policy sees it.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
}

impl OpenAiBackend {
    /// Create a backend from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Config`] if the endpoint paths do not fit
    /// the SDK's layout, or if the HTTP client cannot be built.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let prefix = api_prefix(&config.chat_path, &config.text_path)?;
        let api_base = format!("{}{}", config.base_url.as_str().trim_end_matches('/'), prefix);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Config(format!("failed to build HTTP client: {e}")))?;

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(config.api_key.clone().unwrap_or_default());

        Ok(Self { client: Client::with_config(openai_config).with_http_client(http) })
    }
}

/// The path prefix shared by both endpoints, e.g. `/v1`.
fn api_prefix<'a>(chat_path: &'a str, text_path: &str) -> Result<&'a str> {
    let prefix = chat_path.strip_suffix(CHAT_SUFFIX).ok_or_else(|| {
        CompletionError::Config(format!(
            "the openai backend needs a chat path ending in '{CHAT_SUFFIX}', got '{chat_path}'"
        ))
    })?;
    if text_path.strip_suffix(TEXT_SUFFIX) != Some(prefix) {
        return Err(CompletionError::Config(format!(
            "the openai backend needs text path '{prefix}{TEXT_SUFFIX}', got '{text_path}'"
        )));
    }
    Ok(prefix)
}

fn decode<T: DeserializeOwned>(body: &Value) -> Result<T> {
    serde_json::from_value(body.clone())
        .map_err(|e| CompletionError::InvalidRequest(format!("body rejected by SDK types: {e}")))
}

fn encode<T: Serialize>(response: &T) -> Result<Value> {
    serde_json::to_value(response).map_err(|e| CompletionError::Fatal {
        status: None,
        message: format!("failed to encode SDK response: {e}"),
    })
}

fn is_transient(api: &ApiError) -> bool {
    match api.r#type.as_deref() {
        None => true,
        Some("insufficient_quota") => false,
        Some(kind) => TRANSIENT_TYPES.iter().any(|t| kind.contains(t)),
    }
}

fn classify(error: OpenAIError) -> CompletionError {
    match error {
        OpenAIError::Reqwest(e) => CompletionError::from_reqwest(&e),
        OpenAIError::ApiError(api) if is_transient(&api) => {
            CompletionError::Transient { status: None, message: api.message }
        }
        OpenAIError::ApiError(api) => CompletionError::Fatal { status: None, message: api.message },
        // The SDK drops the bytes; only a reply it could not parse gets here.
        OpenAIError::JSONDeserialize(e) => CompletionError::Transient {
            status: None,
            message: format!("undecodable provider reply: {e}"),
        },
        other => CompletionError::Fatal { status: None, message: other.to_string() },
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn send(&self, endpoint: Endpoint, body: &Value) -> Result<Value> {
        debug!(backend = "openai", %endpoint, "sending request");

        let result = match endpoint {
            Endpoint::Chat => {
                let request: CreateChatCompletionRequest = decode(body)?;
                self.client.chat().create(request).await.map(|r| encode(&r))
            }
            Endpoint::Text => {
                let request: CreateCompletionRequest = decode(body)?;
                self.client.completions().create(request).await.map(|r| encode(&r))
            }
        };

        result.map_err(|e| {
            error!(backend = "openai", %endpoint, error = %e, "OpenAI API error");
            classify(e)
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(kind: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "engine crashed".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: None,
        })
    }

    fn config(chat_path: &str, text_path: &str) -> CompletionConfig {
        CompletionConfig::builder()
            .base_url("http://localhost:8000")
            .model("m")
            .chat_path(chat_path)
            .text_path(text_path)
            .build()
            .unwrap()
    }

    #[test]
    fn untyped_and_server_errors_are_transient() {
        for kind in [None, Some("server_error"), Some("rate_limit_exceeded"), Some("overloaded_error")] {
            assert_eq!(
                classify(api_error(kind)),
                CompletionError::Transient { status: None, message: "engine crashed".into() },
                "type {kind:?}"
            );
        }
    }

    #[test]
    fn request_errors_are_fatal() {
        for kind in ["invalid_request_error", "authentication_error", "insufficient_quota"] {
            assert!(matches!(classify(api_error(Some(kind))), CompletionError::Fatal { .. }), "type {kind}");
        }
    }

    #[test]
    fn undecodable_reply_is_retried_not_a_shape_error() {
        let serde_err = serde_json::from_str::<Value>("Service Unavailable").unwrap_err();
        let err = classify(OpenAIError::JSONDeserialize(serde_err));
        assert!(err.is_transient(), "unexpected error: {err:?}");
        assert!(!matches!(err, CompletionError::UnexpectedResponseShape { .. }));
    }

    #[test]
    fn default_paths_share_the_v1_prefix() {
        assert_eq!(api_prefix("/v1/chat/completions", "/v1/completions").unwrap(), "/v1");
        assert_eq!(api_prefix("/chat/completions", "/completions").unwrap(), "");
        assert!(OpenAiBackend::new(&config("/v1/chat/completions", "/v1/completions")).is_ok());
    }

    #[test]
    fn paths_outside_the_sdk_layout_are_rejected() {
        for (chat, text) in [
            ("/v1/chat", "/v1/completions"),
            ("/v1/chat/completions", "/v2/completions"),
            ("/v1/chat/completions", "/v1/generate"),
        ] {
            let err = OpenAiBackend::new(&config(chat, text)).err().unwrap();
            assert!(matches!(err, CompletionError::Config(_)), "{chat} {text}: {err:?}");
        }
    }
}
