//! Completion client with retry, backoff, cancellation and endpoint fallback.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::{CompletionBackend, Endpoint};
use crate::chat::ChatRequest;
use crate::config::{BackendKind, CompletionConfig};
use crate::error::{CompletionError, Result};
use crate::http::HttpBackend;
use crate::response::extract_text;

/// The normalized outcome of one logical completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionResult {
    /// The answer text.
    pub text: String,
    /// The provider's response body, kept for diagnostics.
    pub raw: Value,
    /// The endpoint that produced the answer.
    pub endpoint: Endpoint,
    /// Attempts spent on `endpoint`.
    pub attempts: u32,
    /// Whether the call switched from the chat to the text endpoint.
    pub fell_back: bool,
}

/// Delivers chat requests to a completion service.
///
/// Each call runs `PENDING → ATTEMPTING → SUCCESS | TRANSIENT → (backoff) →
/// ATTEMPTING | FATAL`. Transient failures are retried up to
/// [`RetryPolicy::max_attempts`](crate::RetryPolicy) with exponential backoff;
/// the last failure is returned unchanged. Anything else ends the call at
/// once. The client keeps no per-call state, so one instance can serve many
/// concurrent calls.
///
/// # Example
///
/// ```rust,ignore
/// use advisor_model::{ChatRequest, CompletionClient, CompletionConfig};
///
/// let client = CompletionClient::from_config(
///     CompletionConfig::builder().base_url("http://localhost:8000").model("my-model").build()?,
/// )?;
/// let result = client.complete(&ChatRequest::user("Say hello in one sentence.")).await?;
/// println!("{}", result.text);
/// ```
#[derive(Clone)]
pub struct CompletionClient {
    config: CompletionConfig,
    backend: Arc<dyn CompletionBackend>,
}

impl std::fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClient")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

struct Answer {
    text: String,
    raw: Value,
    attempts: u32,
}

impl CompletionClient {
    /// Create a client over an explicit backend.
    pub fn new(config: CompletionConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { config, backend }
    }

    /// Create a client with the backend named by `config.backend`.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Config`] if the backend cannot be built or
    /// was not compiled in.
    pub fn from_config(config: CompletionConfig) -> Result<Self> {
        let backend: Arc<dyn CompletionBackend> = match config.backend {
            BackendKind::Http => Arc::new(HttpBackend::new(&config)?),
            #[cfg(feature = "openai")]
            BackendKind::OpenAi => Arc::new(crate::openai::OpenAiBackend::new(&config)?),
            #[cfg(not(feature = "openai"))]
            BackendKind::OpenAi => {
                return Err(CompletionError::Config(
                    "the openai backend requires the `openai` feature".to_string(),
                ));
            }
        };
        Ok(Self::new(config, backend))
    }

    /// The client configuration.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Send `request` to the chat endpoint.
    ///
    /// # Errors
    ///
    /// Returns the last transient error once retries are exhausted, or the
    /// first non-transient error.
    pub async fn complete(&self, request: &ChatRequest) -> Result<CompletionResult> {
        self.complete_cancellable(request, CancellationToken::new()).await
    }

    /// [`complete`](Self::complete), aborted with
    /// [`CompletionError::Cancelled`] as soon as `cancel` fires.
    pub async fn complete_cancellable(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<CompletionResult> {
        request.validate()?;
        let body = request.chat_body(&self.config.model);
        let answer = self.run(Endpoint::Chat, &body, &cancel).await?;
        Ok(answer.into_result(Endpoint::Chat, false))
    }

    /// Send `request` to the chat endpoint and, if the server does not
    /// support it, once to the text endpoint with the turns flattened into a
    /// single prompt.
    ///
    /// Only [`CompletionError::EndpointUnsupported`] from the chat endpoint
    /// triggers the switch; outages and malformed responses are returned as-is.
    pub async fn complete_with_fallback(&self, request: &ChatRequest) -> Result<CompletionResult> {
        self.complete_with_fallback_cancellable(request, CancellationToken::new()).await
    }

    /// [`complete_with_fallback`](Self::complete_with_fallback) with cancellation.
    pub async fn complete_with_fallback_cancellable(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> Result<CompletionResult> {
        request.validate()?;
        let chat_body = request.chat_body(&self.config.model);

        match self.run(Endpoint::Chat, &chat_body, &cancel).await {
            Ok(answer) => Ok(answer.into_result(Endpoint::Chat, false)),
            Err(e) if e.triggers_fallback() => {
                info!(backend = self.backend.name(), error = %e, "chat endpoint unsupported, falling back to text");
                let text_body = request.text_body(&self.config.model);
                let answer = self.run(Endpoint::Text, &text_body, &cancel).await?;
                Ok(answer.into_result(Endpoint::Text, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Attempt `body` against `endpoint` until success, a non-transient
    /// error, retry exhaustion or cancellation.
    async fn run(&self, endpoint: Endpoint, body: &Value, cancel: &CancellationToken) -> Result<Answer> {
        let policy = self.config.retry;
        let backend = self.backend.name();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(backend, %endpoint, attempt, "attempting completion");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(backend, %endpoint, attempt, "completion cancelled during attempt");
                    return Err(CompletionError::Cancelled);
                }
                outcome = self.backend.send(endpoint, body) => outcome,
            };

            let error = match outcome
                .and_then(|raw| extract_text(&raw, &self.config.shape_priority).map(|text| (text, raw)))
            {
                Ok((text, raw)) => {
                    debug!(backend, %endpoint, attempt, "completion succeeded");
                    return Ok(Answer { text, raw, attempts: attempt });
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                error!(backend, %endpoint, attempt, error = %error, "completion failed");
                return Err(error);
            }
            if attempt >= policy.max_attempts {
                error!(backend, %endpoint, attempts = attempt, error = %error, "retries exhausted");
                return Err(error);
            }

            let delay = policy.delay_for(attempt);
            warn!(backend, %endpoint, attempt, ?delay, error = %error, "transient failure, backing off");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(backend, %endpoint, attempt, "completion cancelled during backoff");
                    return Err(CompletionError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl Answer {
    fn into_result(self, endpoint: Endpoint, fell_back: bool) -> CompletionResult {
        CompletionResult { text: self.text, raw: self.raw, endpoint, attempts: self.attempts, fell_back }
    }
}
