//! OpenAI SDK backend.
//!
//! Available with the `openai` feature. Select it at runtime with
//! [`BackendKind::OpenAi`](crate::BackendKind::OpenAi).

mod client;

pub use client::OpenAiBackend;
