//! Configuration for the summary index.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for building and querying a [`SummaryIndex`](crate::SummaryIndex).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    /// Number of top results returned by [`SummaryIndex::query`](crate::SummaryIndex::query).
    pub top_k: usize,
    /// Minimum similarity score; results below it are dropped by `query`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
    /// Vector size of the [`HashingEmbedder`](crate::HashingEmbedder).
    pub dimensions: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { top_k: 1, similarity_threshold: None, dimensions: 384 }
    }
}

impl IndexConfig {
    /// Create a new builder for constructing an [`IndexConfig`].
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`IndexConfig`].
#[derive(Debug, Clone, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the number of top results to return.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = Some(threshold);
        self
    }

    /// Set the embedding dimensionality.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Build the [`IndexConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `top_k == 0`
    /// - `dimensions == 0`
    /// - the threshold is NaN
    pub fn build(self) -> Result<IndexConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.dimensions == 0 {
            return Err(RagError::Config("dimensions must be greater than zero".to_string()));
        }
        if self.config.similarity_threshold.is_some_and(f32::is_nan) {
            return Err(RagError::Config("similarity_threshold must be a number".to_string()));
        }
        Ok(self.config)
    }
}
