//! # advisor-rag
//!
//! Nearest-summary retrieval over a fixed corpus of schema summaries.
//!
//! The corpus is a directory of schema chunk files (see [`corpus`]). At
//! startup [`SummaryIndex::load`] resolves one summary per file, embeds it
//! with a single [`EmbeddingProvider`] and keeps everything in memory.
//! [`SummaryIndex::find_closest`] then ranks the corpus against a free-text
//! question with a linear cosine-similarity scan.
//!
//! The [`summary`] module holds the offline batch that derives summaries
//! from schema chunks and writes `summaries.json`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use advisor_rag::{HashingEmbedder, SummaryDocument, SummaryIndex};
//!
//! let index = SummaryIndex::from_documents(
//!     vec![
//!         SummaryDocument::new("sales.json", "1 FactTable(s) e.g. [fact_sales]"),
//!         SummaryDocument::new("hr.json", "2 Dimension(s) e.g. [dim_employee, dim_department]"),
//!     ],
//!     Arc::new(HashingEmbedder::new(128)?),
//! )?;
//!
//! let best = index.find_closest("1 FactTable(s) e.g. [fact_sales]", 1)?;
//! assert_eq!(best[0].id, "sales.json");
//! # Ok::<(), advisor_rag::RagError>(())
//! ```

pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod summary;

pub use config::{IndexConfig, IndexConfigBuilder};
pub use document::{ScoredDocument, SummaryDocument};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{RagError, Result};
pub use index::SummaryIndex;
