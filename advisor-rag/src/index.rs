//! In-memory summary index using cosine similarity.
//!
//! [`SummaryIndex`] owns the whole corpus and the single
//! [`EmbeddingProvider`] used for both corpus and query text. It is
//! immutable once built, so it can be shared behind an `Arc` and queried
//! concurrently without locking.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::IndexConfig;
use crate::corpus::{CorpusEntry, read_corpus};
use crate::document::{ScoredDocument, SummaryDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude, or if the result is not
/// finite because a component overflowed.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a * norm_b);
    if score.is_finite() { score } else { 0.0 }
}

/// Whether `vector` can be scored: right length and every component finite.
fn is_usable(vector: &[f32], dimensions: usize) -> bool {
    vector.len() == dimensions && vector.iter().all(|v| v.is_finite())
}

/// A read-only nearest-summary index.
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use advisor_rag::{HashingEmbedder, SummaryIndex};
///
/// let embedder = Arc::new(HashingEmbedder::new(384)?);
/// let index = SummaryIndex::load(Path::new("schema_chunks"), embedder)?;
/// let best = index.find_closest("monthly revenue by region", 1)?;
/// println!("{} ({:.3})", best[0].id, best[0].score);
/// # Ok::<(), advisor_rag::RagError>(())
/// ```
pub struct SummaryIndex {
    documents: Vec<SummaryDocument>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for SummaryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryIndex")
            .field("documents", &self.documents.len())
            .field("embedder", &self.embedder.model_id())
            .finish()
    }
}

impl SummaryIndex {
    /// Load every document of a corpus directory and embed it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Initialization`] if the directory is missing or
    /// empty, or if no document could be embedded.
    pub fn load(corpus_dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let entries = read_corpus(corpus_dir)?;
        let index = Self::from_entries(entries, embedder)?;
        info!(
            dir = %corpus_dir.display(),
            documents = index.len(),
            embedder = index.embedder.model_id(),
            "summary index loaded"
        );
        Ok(index)
    }

    /// Build an index from documents already held in memory.
    ///
    /// Documents whose embedding is empty are embedded here; documents that
    /// arrive with a vector must match the provider's dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Initialization`] if `documents` is empty, an id is
    /// duplicated, or no document could be embedded.
    pub fn from_documents(
        documents: Vec<SummaryDocument>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let entries = documents
            .into_iter()
            .map(|doc| {
                let stored_embedding = (!doc.embedding.is_empty()).then(|| {
                    crate::corpus::StoredEmbedding {
                        model: embedder.model_id().to_string(),
                        vector: doc.embedding,
                    }
                });
                CorpusEntry { id: doc.id, summary: doc.summary, stored_embedding }
            })
            .collect();
        Self::from_entries(entries, embedder)
    }

    fn from_entries(entries: Vec<CorpusEntry>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if entries.is_empty() {
            return Err(RagError::Initialization("corpus contains no documents".to_string()));
        }

        let dimensions = embedder.dimensions();
        let mut documents: Vec<SummaryDocument> = Vec::with_capacity(entries.len());
        let mut seen: HashSet<String> = HashSet::with_capacity(entries.len());

        for entry in entries {
            if !seen.insert(entry.id.clone()) {
                return Err(RagError::Initialization(format!(
                    "duplicate document id '{}'",
                    entry.id
                )));
            }

            let reusable = entry.stored_embedding.and_then(|stored| {
                if stored.model == embedder.model_id() && is_usable(&stored.vector, dimensions) {
                    Some(stored.vector)
                } else {
                    debug!(
                        document = %entry.id,
                        stored_model = %stored.model,
                        "stored embedding does not match provider, re-embedding"
                    );
                    None
                }
            });

            let embedding = match reusable {
                Some(vector) => vector,
                None => match embedder.embed(&entry.summary) {
                    Ok(vector) if is_usable(&vector, dimensions) => vector,
                    Ok(vector) => {
                        warn!(
                            document = %entry.id,
                            expected = dimensions,
                            actual = vector.len(),
                            "embedding has wrong dimensionality or non-finite values, skipping document"
                        );
                        continue;
                    }
                    Err(e) => {
                        warn!(document = %entry.id, error = %e, "failed to embed document, skipping");
                        continue;
                    }
                },
            };

            documents.push(SummaryDocument { id: entry.id, summary: entry.summary, embedding });
        }

        if documents.is_empty() {
            return Err(RagError::Initialization("no document could be embedded".to_string()));
        }

        Ok(Self { documents, embedder })
    }

    /// Return the `top_k` documents most similar to `query`.
    ///
    /// Results are ordered by descending cosine similarity; equal scores keep
    /// corpus order. `top_k` is clamped to the corpus size.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidQuery`] if the query is empty or whitespace,
    /// without embedding or scoring anything.
    pub fn find_closest(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument<'_>>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query must not be empty".to_string()));
        }

        let query_embedding = self.embedder.embed(query)?;

        let mut scored: Vec<ScoredDocument<'_>> = self
            .documents
            .iter()
            .map(|doc| ScoredDocument {
                id: &doc.id,
                summary: &doc.summary,
                score: cosine_similarity(&doc.embedding, &query_embedding),
            })
            .collect();

        // `sort_by` is stable, which keeps corpus order among equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k.min(self.documents.len()));

        debug!(query_len = query.len(), top_k, returned = scored.len(), "find_closest");
        Ok(scored)
    }

    /// Run [`find_closest`](Self::find_closest) with the configured `top_k`,
    /// then drop results below the configured similarity threshold.
    ///
    /// # Errors
    ///
    /// Same as [`find_closest`](Self::find_closest).
    pub fn query(&self, query: &str, config: &IndexConfig) -> Result<Vec<ScoredDocument<'_>>> {
        let mut results = self.find_closest(query, config.top_k)?;
        if let Some(threshold) = config.similarity_threshold {
            results.retain(|r| r.score >= threshold);
        }
        Ok(results)
    }

    /// Look up a document by id.
    pub fn get(&self, id: &str) -> Option<&SummaryDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// All documents in corpus order.
    pub fn documents(&self) -> &[SummaryDocument] {
        &self.documents
    }

    /// The embedding provider shared by corpus and queries.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Always `false` for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
