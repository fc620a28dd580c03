//! Scripted backend for tests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::backend::{CompletionBackend, Endpoint};
use crate::error::{CompletionError, Result};

/// One scripted outcome of [`MockBackend::send`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this JSON body.
    Respond(Value),
    /// Fail with this error.
    Fail(CompletionError),
    /// Never complete; only cancellation ends the attempt.
    Hang,
}

/// A [`CompletionBackend`] that replays a fixed script of replies in call
/// order and records every request it receives.
///
/// Once the script runs out every further call fails with a fatal error, so
/// an unexpected extra attempt shows up in the test instead of hanging.
///
/// # Example
///
/// ```rust
/// use advisor_model::{CompletionError, MockBackend};
/// use serde_json::json;
///
/// let backend = MockBackend::new()
///     .then_fail(CompletionError::Transient { status: Some(503), message: "busy".into() })
///     .then_respond(json!({"choices": [{"text": "hi"}]}));
/// assert_eq!(backend.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<(Endpoint, Value)>>,
}

impl MockBackend {
    /// Create a backend with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reply to the script.
    pub fn then(self, reply: MockReply) -> Self {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(reply);
        self
    }

    /// Append a successful JSON response.
    pub fn then_respond(self, body: Value) -> Self {
        self.then(MockReply::Respond(body))
    }

    /// Append a failure.
    pub fn then_fail(self, error: CompletionError) -> Self {
        self.then(MockReply::Fail(error))
    }

    /// Append a reply that never completes.
    pub fn then_hang(self) -> Self {
        self.then(MockReply::Hang)
    }

    /// Every `(endpoint, body)` received so far, in order.
    pub fn calls(&self) -> Vec<(Endpoint, Value)> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, endpoint: Endpoint, body: &Value) -> Result<Value> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push((endpoint, body.clone()));
        let reply = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();

        match reply {
            Some(MockReply::Respond(body)) => Ok(body),
            Some(MockReply::Fail(error)) => Err(error),
            Some(MockReply::Hang) => std::future::pending().await,
            None => Err(CompletionError::Fatal {
                status: None,
                message: "mock script exhausted".to_string(),
            }),
        }
    }
}
