//! # advisor-model
//!
//! Resilient client for OpenAI-compatible completion services.
//!
//! ## Overview
//!
//! - [`CompletionClient`] - retry with exponential backoff, cancellation,
//!   chat → text endpoint fallback, answer normalization
//! - [`CompletionBackend`] - one attempt against one endpoint
//!   - [`HttpBackend`] - raw `reqwest` calls (vLLM, OpenAI, ...)
//!   - `OpenAiBackend` - the `async-openai` SDK (feature `openai`)
//!   - [`MockBackend`] - scripted replies for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use advisor_model::{ChatRequest, ChatTurn, CompletionClient, CompletionConfig, RetryPolicy};
//! use std::time::Duration;
//!
//! let config = CompletionConfig::builder()
//!     .base_url("http://vllm:8000")
//!     .model("mistralai/Mistral-7B-Instruct-v0.2")
//!     .retry(RetryPolicy::new(3, Duration::from_millis(500)))
//!     .build()?;
//! let client = CompletionClient::from_config(config)?;
//!
//! let request = ChatRequest::new(vec![ChatTurn::user("Say hello in one sentence.")])
//!     .with_max_tokens(20);
//! let result = client.complete_with_fallback(&request).await?;
//! println!("{} (via {} endpoint)", result.text, result.endpoint);
//! ```
//!
//! ## Response shapes
//!
//! | Shape | Location of the answer |
//! |-------|------------------------|
//! | [`ResponseShape::Chat`] | `choices[0].message.content` |
//! | [`ResponseShape::Text`] | `choices[0].text` |
//!
//! Shapes are tried in [`CompletionConfig::shape_priority`] order, chat first
//! by default.

pub mod backend;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;
pub mod response;

pub use backend::{CompletionBackend, Endpoint};
pub use chat::{ChatRequest, ChatRole, ChatTurn, GenerationParams};
pub use client::{CompletionClient, CompletionResult};
pub use config::{BackendKind, CompletionConfig, CompletionConfigBuilder, ResponseShape, RetryPolicy};
pub use error::{CompletionError, Result};
pub use http::HttpBackend;
pub use mock::{MockBackend, MockReply};
#[cfg(feature = "openai")]
pub use openai::OpenAiBackend;
pub use response::extract_text;
pub use tokio_util::sync::CancellationToken;
