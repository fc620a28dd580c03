//! Data types for summary documents and search results.

use serde::{Deserialize, Serialize};

/// A precomputed schema summary with its embedding vector.
///
/// Documents are created once when the index is built and never change
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryDocument {
    /// Unique identifier, normally the schema chunk file name.
    pub id: String,
    /// The textual summary of the schema chunk.
    pub summary: String,
    /// The vector embedding of `summary`.
    pub embedding: Vec<f32>,
}

impl SummaryDocument {
    /// Create a document that still needs an embedding.
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self { id: id.into(), summary: summary.into(), embedding: Vec::new() }
    }

    /// Attach a precomputed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// A retrieved [`SummaryDocument`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredDocument<'a> {
    /// Identifier of the matched document.
    pub id: &'a str,
    /// Summary text of the matched document.
    #[serde(skip)]
    pub summary: &'a str,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}
