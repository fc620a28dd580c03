//! Subcommand handlers. Results go to stdout as JSON, logs to stderr.

use std::path::{Path, PathBuf};

use advisor_model::{CancellationToken, CompletionClient};
use advisor_rag::IndexConfig;
use advisor_rag::summary::{default_summaries_path, summarize_directory, write_summaries};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::advisor::{Advisor, AdvisorAnswer};
use crate::cli::Commands;
use crate::settings::{CompletionArgs, CorpusArgs};

/// Run one parsed command, stopping early when `cancel` fires.
pub async fn run(command: Commands, cancel: CancellationToken) -> Result<()> {
    match command {
        Commands::Summarize { dir, out } => {
            let path = summarize(&dir, out)?;
            print_json(&serde_json::json!({ "written": path }))
        }
        Commands::Search { query, corpus, top_k, min_score } => {
            let hits = search(&query, &corpus, top_k, min_score)?;
            print_json(&hits)
        }
        Commands::Ask { question, corpus, completion, fallback } => {
            let answer = ask(&question, &corpus, &completion, fallback, cancel).await?;
            print_json(&answer)
        }
    }
}

/// Write summaries for every chunk in `dir`; returns the output path.
pub fn summarize(dir: &Path, out: Option<PathBuf>) -> Result<PathBuf> {
    let summaries = summarize_directory(dir)
        .with_context(|| format!("failed to summarize {}", dir.display()))?;
    let path = out.unwrap_or_else(|| default_summaries_path(dir));
    write_summaries(&path, &summaries)?;
    info!(path = %path.display(), count = summaries.len(), "summaries written");
    Ok(path)
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

pub fn search(
    query: &str,
    corpus: &CorpusArgs,
    top_k: usize,
    min_score: Option<f32>,
) -> Result<Vec<SearchHit>> {
    let mut builder = IndexConfig::builder().top_k(top_k).dimensions(corpus.dimensions);
    if let Some(threshold) = min_score {
        builder = builder.similarity_threshold(threshold);
    }
    let config = builder.build().context("invalid search settings")?;
    let index = corpus.load_index(&config)?;

    let hits = index
        .query(query, &config)?
        .into_iter()
        .map(|hit| SearchHit { id: hit.id.to_string(), score: hit.score })
        .collect();
    Ok(hits)
}

pub async fn ask(
    question: &str,
    corpus: &CorpusArgs,
    completion: &CompletionArgs,
    fallback: bool,
    cancel: CancellationToken,
) -> Result<AdvisorAnswer> {
    let config = completion.completion_config()?;
    let index = corpus.load_index(&corpus.index_config(1)?)?;
    info!(documents = index.len(), model = %config.model, url = %config.base_url, "advisor ready");

    let client = CompletionClient::from_config(config).context("failed to build completion client")?;
    let advisor = Advisor::new(index, client, completion.max_tokens).with_fallback(fallback);

    advisor.ask(question, cancel).await.map_err(|e| {
        warn!(error = %e, "ask failed");
        anyhow::Error::new(e)
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
