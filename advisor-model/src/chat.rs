//! Conversation types and their wire encodings.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{CompletionError, Result};

/// The author of a [`ChatTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions for the model.
    System,
    /// The person asking.
    User,
    /// A previous model answer.
    Assistant,
}

impl ChatRole {
    /// The wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who wrote the message.
    pub role: ChatRole,
    /// The message text.
    pub content: String,
}

impl ChatTurn {
    /// Create a turn with the given role.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Generation parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Model identifier. Falls back to the client's configured model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Provider-specific fields copied into the request body as-is.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { model: None, max_tokens: 512, temperature: 0.0, extensions: Map::new() }
    }
}

/// An ordered conversation plus generation parameters.
///
/// # Example
///
/// ```rust
/// use advisor_model::{ChatRequest, ChatTurn};
///
/// let request = ChatRequest::new(vec![
///     ChatTurn::system("You are a BI analyst."),
///     ChatTurn::user("Which dimensions explain churn?"),
/// ])
/// .with_max_tokens(1024)
/// .with_extension("top_p", serde_json::json!(0.9));
///
/// assert_eq!(request.turns.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation turns in order. Must not be empty.
    pub turns: Vec<ChatTurn>,
    /// Generation parameters.
    #[serde(default)]
    pub params: GenerationParams,
}

impl ChatRequest {
    /// Create a request with default generation parameters.
    pub fn new(turns: Vec<ChatTurn>) -> Self {
        Self { turns, params: GenerationParams::default() }
    }

    /// Create a single-turn user request.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(vec![ChatTurn::user(content)])
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.params.model = Some(model.into());
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.params.temperature = temperature;
        self
    }

    /// Add a provider-specific field to the request body.
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.extensions.insert(key.into(), value);
        self
    }

    /// Check the request before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::InvalidRequest`] if there are no turns.
    pub fn validate(&self) -> Result<()> {
        if self.turns.is_empty() {
            return Err(CompletionError::InvalidRequest(
                "a chat request needs at least one turn".to_string(),
            ));
        }
        Ok(())
    }

    /// Flatten the conversation into a single prompt for text completion.
    ///
    /// Each turn renders as `[role] content`; turns are joined by newlines in
    /// their original order.
    pub fn flattened_prompt(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("[{}] {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Wire body for the chat completion endpoint.
    pub fn chat_body(&self, default_model: &str) -> Value {
        let messages: Vec<Value> = self
            .turns
            .iter()
            .map(|turn| json!({ "role": turn.role.as_str(), "content": turn.content }))
            .collect();
        self.body_with(default_model, "messages", Value::Array(messages))
    }

    /// Wire body for the legacy text completion endpoint.
    pub fn text_body(&self, default_model: &str) -> Value {
        self.body_with(default_model, "prompt", Value::String(self.flattened_prompt()))
    }

    fn body_with(&self, default_model: &str, key: &str, payload: Value) -> Value {
        // Extensions go in first so the required fields always win.
        let mut body = self.params.extensions.clone();
        body.insert(
            "model".to_string(),
            Value::String(self.params.model.as_deref().unwrap_or(default_model).to_string()),
        );
        body.insert(key.to_string(), payload);
        body.insert("max_tokens".to_string(), json!(self.params.max_tokens));
        body.insert("temperature".to_string(), json!(self.params.temperature));
        Value::Object(body)
    }
}
