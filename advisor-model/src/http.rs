//! Raw HTTP backend for OpenAI-compatible servers.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use crate::backend::{CompletionBackend, Endpoint};
use crate::config::CompletionConfig;
use crate::error::{CompletionError, Result};

/// A [`CompletionBackend`] that posts JSON bodies with `reqwest`.
///
/// Works against vLLM, OpenAI and any other server exposing
/// `/v1/chat/completions` and `/v1/completions`.
///
/// # Example
///
/// ```rust,ignore
/// use advisor_model::{CompletionConfig, HttpBackend};
///
/// let config = CompletionConfig::builder()
///     .base_url("http://localhost:8000")
///     .model("mistralai/Mistral-7B-Instruct-v0.2")
///     .build()?;
/// let backend = HttpBackend::new(&config)?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    chat_url: Url,
    text_url: Url,
    api_key: Option<String>,
}

impl HttpBackend {
    /// Create a backend from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Config`] if an endpoint URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            chat_url: config.endpoint_url(&config.chat_path)?,
            text_url: config.endpoint_url(&config.text_path)?,
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Chat => &self.chat_url,
            Endpoint::Text => &self.text_url,
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, endpoint: Endpoint, body: &Value) -> Result<Value> {
        let url = self.url(endpoint);
        debug!(backend = "http", %endpoint, url = %url, "sending request");

        let mut request = self.client.post(url.clone()).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(backend = "http", %endpoint, error = %e, "request failed");
            CompletionError::from_reqwest(&e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| CompletionError::from_reqwest(&e))?;

        if !status.is_success() {
            error!(backend = "http", %endpoint, %status, "API error");
            return Err(CompletionError::from_status(endpoint, status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(backend = "http", %endpoint, error = %e, "response is not JSON");
            CompletionError::UnexpectedResponseShape { body: text }
        })
    }
}
