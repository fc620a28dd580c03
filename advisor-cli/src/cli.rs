//! Argument definitions for the `advisor` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::settings::{CompletionArgs, CorpusArgs};

/// Schema advisor: retrieval-grounded BI analysis from an LLM
#[derive(Debug, Parser)]
#[command(name = "advisor", version, about, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize every schema chunk in a directory into summaries.json
    Summarize {
        /// Directory of schema chunk files
        #[arg(long, env = "ADVISOR_CORPUS_DIR", default_value = "schema_chunks")]
        dir: PathBuf,

        /// Output file (defaults to <dir>/summaries.json)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rank corpus files against a query
    Search {
        query: String,

        #[command(flatten)]
        corpus: CorpusArgs,

        /// Number of results
        #[arg(long, default_value_t = 3)]
        top_k: usize,

        /// Drop results scoring below this value
        #[arg(long)]
        min_score: Option<f32>,
    },
    /// Answer a business question using the closest schema summary
    Ask {
        question: String,

        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        completion: CompletionArgs,

        /// Fall back to the legacy completions endpoint if chat is unsupported
        #[arg(long)]
        fallback: bool,
    },
}
