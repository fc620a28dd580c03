//! Embedding provider trait and the local hashing embedder.

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// The index holds exactly one provider and routes both corpus and query
/// text through it, so the vectors it compares always come from the same
/// function. [`model_id`](EmbeddingProvider::model_id) names that function;
/// precomputed vectors tagged with a different id are not trusted.
///
/// # Example
///
/// ```rust
/// use advisor_rag::{EmbeddingProvider, HashingEmbedder};
///
/// let provider = HashingEmbedder::new(64).unwrap();
/// let embedding = provider.embed("fact_sales by region").unwrap();
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Return an identifier for the embedding function, stable across runs.
    fn model_id(&self) -> &str;
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME))
}

/// A deterministic feature-hashing embedder that runs entirely in memory.
///
/// Text is lower-cased and split into alphanumeric words (`_` counts as a
/// word character so `fact_sales` stays one token). Each word and each
/// adjacent word pair is hashed into one of `dimensions` buckets with a sign
/// taken from the hash, and the resulting vector is L2-normalized.
/// Text without any word yields the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::Config("embedding dimensions must be greater than zero".into()));
        }
        Ok(Self { dimensions, model_id: format!("hashing-fnv1a-{dimensions}") })
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

/// Split text into lower-cased word tokens.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dimensions];

        for token in &tokens {
            self.add_feature(&mut vector, token);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]));
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
