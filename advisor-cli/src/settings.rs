//! Command-line and environment settings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use advisor_model::config::DEFAULT_BASE_URL;
use advisor_model::{BackendKind, CompletionConfig, ResponseShape, RetryPolicy};
use advisor_rag::{HashingEmbedder, IndexConfig, SummaryIndex};
use anyhow::{Context, Result};
use clap::Args;

/// Where the corpus lives and how it is embedded.
#[derive(Debug, Clone, Args)]
pub struct CorpusArgs {
    /// Directory of schema chunk files
    #[arg(long, env = "ADVISOR_CORPUS_DIR", default_value = "schema_chunks")]
    pub dir: PathBuf,

    /// Embedding dimensions of the hashing embedder
    #[arg(long, env = "ADVISOR_EMBEDDING_DIM", default_value_t = 384)]
    pub dimensions: usize,
}

impl CorpusArgs {
    /// Index settings for `top_k` results.
    pub fn index_config(&self, top_k: usize) -> Result<IndexConfig> {
        IndexConfig::builder()
            .top_k(top_k)
            .dimensions(self.dimensions)
            .build()
            .context("invalid index settings")
    }

    /// Load the corpus into a shared index.
    pub fn load_index(&self, config: &IndexConfig) -> Result<Arc<SummaryIndex>> {
        let embedder = HashingEmbedder::new(config.dimensions).context("invalid embedder settings")?;
        let index = SummaryIndex::load(&self.dir, Arc::new(embedder))
            .with_context(|| format!("failed to load corpus from {}", self.dir.display()))?;
        Ok(Arc::new(index))
    }
}

/// Completion service connection and retry settings.
#[derive(Debug, Clone, Args)]
pub struct CompletionArgs {
    /// Root URL of the OpenAI-compatible service
    #[arg(long = "url", env = "VLLM_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Bearer token; omitted from requests when unset or empty
    #[arg(long, env = "VLLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model id sent with every request
    #[arg(long, env = "VLLM_MODEL")]
    pub model: String,

    /// Attempts per endpoint, including the first
    #[arg(long, env = "ADVISOR_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Backoff after the first failed attempt, doubled on each retry
    #[arg(long, env = "ADVISOR_BACKOFF_MS", default_value_t = 500)]
    pub backoff_ms: u64,

    /// Per-attempt timeout
    #[arg(long, env = "ADVISOR_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Response shapes to read the answer from, in order
    #[arg(long, env = "ADVISOR_SHAPE_PRIORITY", value_delimiter = ',', default_value = "chat,text")]
    pub shape_priority: Vec<ResponseShape>,

    /// Backend implementation (`http` or `openai`)
    #[arg(long, env = "ADVISOR_BACKEND", default_value = "http")]
    pub backend: BackendKind,

    /// Completion length limit
    #[arg(long, env = "ADVISOR_MAX_TOKENS", default_value_t = 1024)]
    pub max_tokens: u32,
}

impl CompletionArgs {
    /// Build the validated client configuration.
    pub fn completion_config(&self) -> Result<CompletionConfig> {
        let mut builder = CompletionConfig::builder()
            .base_url(&self.base_url)
            .model(&self.model)
            .timeout(Duration::from_secs(self.timeout_secs))
            .retry(RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms)))
            .shape_priority(self.shape_priority.clone())
            .backend(self.backend);
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        builder.build().context("invalid completion settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        completion: CompletionArgs,
    }

    fn parse(args: &[&str]) -> CompletionArgs {
        let argv = std::iter::once("advisor").chain(args.iter().copied());
        Harness::try_parse_from(argv).unwrap().completion
    }

    #[test]
    fn defaults_match_the_service_layout() {
        let config = parse(&["--model", "mistral"]).completion_config().unwrap();
        assert_eq!(config.base_url.as_str(), "http://vllm:8000/");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.shape_priority, vec![ResponseShape::Chat, ResponseShape::Text]);
        assert_eq!(config.backend, BackendKind::Http);
    }

    #[test]
    fn shape_priority_is_comma_separated() {
        let args = parse(&["--model", "m", "--shape-priority", "text,chat"]);
        assert_eq!(args.shape_priority, vec![ResponseShape::Text, ResponseShape::Chat]);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let argv = ["advisor", "--model", "m", "--backend", "grpc"];
        assert!(Harness::try_parse_from(argv).is_err());
    }

    #[test]
    fn zero_attempts_fail_validation() {
        let args = parse(&["--model", "m", "--max-attempts", "0"]);
        assert!(args.completion_config().is_err());
    }

    #[test]
    fn empty_api_key_is_dropped() {
        let config = parse(&["--model", "m", "--api-key", ""]).completion_config().unwrap();
        assert!(config.api_key.is_none());
    }
}
