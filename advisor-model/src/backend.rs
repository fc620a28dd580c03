//! Completion backend trait.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The two completion endpoints an OpenAI-compatible server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// `/v1/chat/completions`, takes `messages`.
    Chat,
    /// `/v1/completions`, takes a flat `prompt`.
    Text,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Chat => f.write_str("chat"),
            Endpoint::Text => f.write_str("text"),
        }
    }
}

/// A transport that delivers one request body to one endpoint.
///
/// A backend performs exactly one attempt per [`send`](CompletionBackend::send)
/// and classifies its failure; retries, fallback, cancellation and answer
/// extraction are layered on top by [`CompletionClient`](crate::CompletionClient),
/// so every implementation behaves the same under the client.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Send `body` to `endpoint` and return the provider's JSON response.
    async fn send(&self, endpoint: Endpoint, body: &Value) -> Result<Value>;
}
