//! Completion client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CompletionError, Result};

/// Default completion service location.
pub const DEFAULT_BASE_URL: &str = "http://vllm:8000";
/// Default chat completion path.
pub const DEFAULT_CHAT_PATH: &str = "/v1/chat/completions";
/// Default legacy text completion path.
pub const DEFAULT_TEXT_PATH: &str = "/v1/completions";

/// A response layout the client knows how to read the answer from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// `choices[0].message.content`
    Chat,
    /// `choices[0].text`
    Text,
}

impl FromStr for ResponseShape {
    type Err = CompletionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "text" => Ok(Self::Text),
            other => Err(CompletionError::Config(format!("unknown response shape '{other}'"))),
        }
    }
}

/// Which [`CompletionBackend`](crate::CompletionBackend) a client is built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Raw HTTP calls with `reqwest`.
    #[default]
    Http,
    /// The `async-openai` SDK (feature `openai`).
    OpenAi,
}

impl FromStr for BackendKind {
    type Err = CompletionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "openai" => Ok(Self::OpenAi),
            other => Err(CompletionError::Config(format!("unknown backend '{other}'"))),
        }
    }
}

/// Exponential backoff between attempts of one logical call.
///
/// Attempt `n` (1-based) that fails transiently is followed by a sleep of
/// `base_delay * 2^(n-1)`, capped at `max_delay`. No jitter is applied, so
/// the schedule is fully determined by the attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Sleep after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound for any single sleep.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy with `max_attempts` attempts and the given base delay.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay, ..Self::default() }
    }

    /// Override the delay cap.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Sleep after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Settings for a [`CompletionClient`](crate::CompletionClient).
///
/// Built explicitly and passed to the client; nothing in this crate reads
/// the process environment.
#[derive(Clone, PartialEq)]
pub struct CompletionConfig {
    /// Service root, e.g. `http://vllm:8000`.
    pub base_url: Url,
    /// Bearer token. No `Authorization` header is sent when `None`.
    pub api_key: Option<String>,
    /// Model used when a request does not name one.
    pub model: String,
    /// Path of the chat completion endpoint.
    pub chat_path: String,
    /// Path of the legacy text completion endpoint.
    pub text_path: String,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retry schedule for transient failures.
    pub retry: RetryPolicy,
    /// Order in which response shapes are tried.
    pub shape_priority: Vec<ResponseShape>,
    /// Backend implementation to use.
    pub backend: BackendKind,
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("chat_path", &self.chat_path)
            .field("text_path", &self.text_path)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("shape_priority", &self.shape_priority)
            .field("backend", &self.backend)
            .finish()
    }
}

impl CompletionConfig {
    /// Create a new builder for constructing a [`CompletionConfig`].
    pub fn builder() -> CompletionConfigBuilder {
        CompletionConfigBuilder::default()
    }

    /// Full URL of the endpoint at `path`, keeping any path prefix of the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Config`] if the joined URL does not parse.
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| CompletionError::Config(format!("invalid URL '{joined}': {e}")))
    }
}

/// Builder for constructing a validated [`CompletionConfig`].
#[derive(Debug, Clone)]
pub struct CompletionConfigBuilder {
    base_url: String,
    api_key: Option<String>,
    model: Option<String>,
    chat_path: String,
    text_path: String,
    timeout: Duration,
    retry: RetryPolicy,
    shape_priority: Vec<ResponseShape>,
    backend: BackendKind,
}

impl Default for CompletionConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: None,
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            text_path: DEFAULT_TEXT_PATH.to_string(),
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            shape_priority: vec![ResponseShape::Chat, ResponseShape::Text],
            backend: BackendKind::default(),
        }
    }
}

impl CompletionConfigBuilder {
    /// Set the service root URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the bearer token. Empty strings are treated as no token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }

    /// Set the default model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the chat completion path.
    pub fn chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    /// Set the text completion path.
    pub fn text_path(mut self, path: impl Into<String>) -> Self {
        self.text_path = path.into();
        self
    }

    /// Set the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the response shape priority.
    pub fn shape_priority(mut self, priority: Vec<ResponseShape>) -> Self {
        self.shape_priority = priority;
        self
    }

    /// Set the backend implementation.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Build the [`CompletionConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Config`] if:
    /// - the base URL does not parse
    /// - no model or an empty model is set
    /// - `retry.max_attempts == 0`
    /// - the shape priority is empty
    pub fn build(self) -> Result<CompletionConfig> {
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            CompletionError::Config(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| CompletionError::Config("model is required".to_string()))?;
        if self.retry.max_attempts == 0 {
            return Err(CompletionError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.shape_priority.is_empty() {
            return Err(CompletionError::Config("shape_priority must not be empty".to_string()));
        }

        Ok(CompletionConfig {
            base_url,
            api_key: self.api_key,
            model,
            chat_path: self.chat_path,
            text_path: self.text_path,
            timeout: self.timeout,
            retry: self.retry,
            shape_priority: self.shape_priority,
            backend: self.backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
    }

    #[test]
    fn backoff_is_capped() {
        let policy =
            RetryPolicy::new(50, Duration::from_secs(1)).with_max_delay(Duration::from_secs(5));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(5));
        assert_eq!(policy.delay_for(40), Duration::from_secs(5));
    }

    #[test]
    fn builder_requires_model() {
        let err = CompletionConfig::builder().build().unwrap_err();
        assert_eq!(err, CompletionError::Config("model is required".to_string()));
    }

    #[test]
    fn builder_rejects_zero_attempts_and_empty_priority() {
        let base = CompletionConfig::builder().model("m");
        assert!(base.clone().retry(RetryPolicy::new(0, Duration::ZERO)).build().is_err());
        assert!(base.shape_priority(Vec::new()).build().is_err());
    }

    #[test]
    fn empty_api_key_means_no_key() {
        let config = CompletionConfig::builder().model("m").api_key("").build().unwrap();
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn endpoint_url_keeps_base_prefix() {
        let config = CompletionConfig::builder()
            .base_url("http://gateway:8080/llm/")
            .model("m")
            .build()
            .unwrap();
        assert_eq!(
            config.endpoint_url(&config.chat_path).unwrap().as_str(),
            "http://gateway:8080/llm/v1/chat/completions"
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = CompletionConfig::builder().model("m").api_key("sk-secret").build().unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn parses_shape_and_backend_names() {
        assert_eq!("Chat".parse::<ResponseShape>().unwrap(), ResponseShape::Chat);
        assert_eq!(" text ".parse::<ResponseShape>().unwrap(), ResponseShape::Text);
        assert!("xml".parse::<ResponseShape>().is_err());
        assert_eq!("openai".parse::<BackendKind>().unwrap(), BackendKind::OpenAi);
    }
}
