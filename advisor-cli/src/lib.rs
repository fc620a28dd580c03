//! # advisor-cli
//!
//! The `advisor` command and the pieces it is assembled from.
//!
//! | Command | Does |
//! |---------|------|
//! | `advisor summarize` | derive one-line summaries for a directory of schema chunks |
//! | `advisor search <QUERY>` | rank corpus files against a question |
//! | `advisor ask <QUESTION>` | retrieve the best summary and ask the completion service |
//!
//! Configuration comes from flags or the environment (`VLLM_URL`,
//! `VLLM_MODEL`, ...) and is turned into explicit
//! [`CompletionConfig`](advisor_model::CompletionConfig) and
//! [`IndexConfig`](advisor_rag::IndexConfig) values before any component is
//! built.

pub mod advisor;
pub mod cli;
pub mod commands;
pub mod prompt;
pub mod settings;

pub use advisor::{Advisor, AdvisorAnswer, AdvisorError};
pub use cli::{Cli, Commands};
pub use prompt::build_prompt;
pub use settings::{CompletionArgs, CorpusArgs};
