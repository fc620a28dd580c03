//! Retrieve, prompt, complete.

use std::sync::Arc;

use advisor_model::{CancellationToken, CompletionClient, CompletionError};
use advisor_rag::{RagError, SummaryIndex};
use serde::Serialize;
use tracing::{info, instrument};

use crate::prompt::analyst_request;

/// Errors from one `ask`.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RagError),

    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),
}

/// What `ask` returns: the retrieved context and the model's answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorAnswer {
    pub best_summary_file: String,
    pub schema_summary: String,
    pub response: String,
}

/// Answers business questions against a loaded corpus.
#[derive(Debug, Clone)]
pub struct Advisor {
    index: Arc<SummaryIndex>,
    client: CompletionClient,
    max_tokens: u32,
    fallback: bool,
}

impl Advisor {
    pub fn new(index: Arc<SummaryIndex>, client: CompletionClient, max_tokens: u32) -> Self {
        Self { index, client, max_tokens, fallback: false }
    }

    /// Retry against the legacy text endpoint when chat is unsupported.
    pub fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Answer `question` with the closest summary as schema context.
    #[instrument(name = "advisor.ask", skip_all)]
    pub async fn ask(
        &self,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<AdvisorAnswer, AdvisorError> {
        let best = self
            .index
            .find_closest(question, 1)?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Initialization("corpus is empty".to_string()))?;
        info!(file = best.id, score = best.score, "retrieved schema summary");

        let request = analyst_request(best.summary, question, self.max_tokens);
        let result = if self.fallback {
            self.client.complete_with_fallback_cancellable(&request, cancel).await?
        } else {
            self.client.complete_cancellable(&request, cancel).await?
        };
        info!(
            endpoint = %result.endpoint,
            attempts = result.attempts,
            fell_back = result.fell_back,
            "completion received"
        );

        Ok(AdvisorAnswer {
            best_summary_file: best.id.to_string(),
            schema_summary: best.summary.to_string(),
            response: result.text,
        })
    }
}
