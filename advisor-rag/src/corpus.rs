//! Corpus directory enumeration.
//!
//! A corpus directory holds one `*.json` schema chunk file per document and
//! optionally a `summaries.json` file mapping chunk file names to their
//! precomputed summaries. The summary for a chunk resolves in this order:
//!
//! 1. its entry in `summaries.json`
//! 2. the chunk file's own `"summary"` string
//! 3. [`summarize_schema`](crate::summary::summarize_schema) over its nodes and relationships
//!
//! A chunk file may also carry a precomputed `"embedding"` together with the
//! `"embedding_model"` that produced it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{RagError, Result};
use crate::summary::{SchemaChunk, summarize_schema};

/// File name of the summary index inside a corpus directory.
pub const SUMMARIES_FILE: &str = "summaries.json";

/// A precomputed embedding read from disk, tagged with its producer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    /// Identifier of the embedding function that produced `vector`.
    pub model: String,
    /// The vector itself.
    pub vector: Vec<f32>,
}

/// One document discovered in a corpus directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    /// Chunk file name.
    pub id: String,
    /// Resolved summary text.
    pub summary: String,
    /// Embedding stored alongside the chunk, if any.
    pub stored_embedding: Option<StoredEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ChunkFile {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    embedding_model: Option<String>,
    #[serde(flatten)]
    schema: SchemaChunk,
}

/// List the `*.json` chunk files of a directory sorted by file name.
///
/// The summary index file is not a chunk and is left out.
///
/// # Errors
///
/// Returns [`RagError::Io`] if the directory cannot be read.
pub fn list_chunk_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let io_err = |source| RagError::Io { path: dir.to_path_buf(), source };
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            warn!(path = %path.display(), "skipping file with non UTF-8 name");
            continue;
        };
        if name == SUMMARIES_FILE {
            continue;
        }
        files.push((name, path));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn read_summary_index(dir: &Path) -> Result<BTreeMap<String, String>> {
    let path = dir.join(SUMMARIES_FILE);
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(&path).map_err(|source| RagError::Io { path: path.clone(), source })?;
    serde_json::from_str(&raw).map_err(|source| RagError::Json { path, source })
}

/// Read every document of a corpus directory in file-name order.
///
/// Chunk files that cannot be read or parsed are skipped with a warning.
///
/// # Errors
///
/// Returns [`RagError::Initialization`] if the directory is missing, is not
/// a directory, its summary index is corrupt, or no document could be read.
pub fn read_corpus(dir: &Path) -> Result<Vec<CorpusEntry>> {
    if !dir.is_dir() {
        return Err(RagError::Initialization(format!(
            "corpus directory '{}' does not exist or is not a directory",
            dir.display()
        )));
    }

    let summaries = read_summary_index(dir)
        .map_err(|e| RagError::Initialization(format!("failed to read summary index: {e}")))?;
    let files = list_chunk_files(dir)
        .map_err(|e| RagError::Initialization(format!("failed to list corpus: {e}")))?;

    let mut entries = Vec::with_capacity(files.len());
    for (id, path) in files {
        let chunk = match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<ChunkFile>(&raw).map_err(|e| e.to_string()))
        {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(file = %id, error = %e, "skipping unreadable schema chunk");
                continue;
            }
        };

        let summary = match summaries.get(&id).cloned().or(chunk.summary) {
            Some(summary) => summary,
            None => summarize_schema(&chunk.schema),
        };
        let stored_embedding = match (chunk.embedding, chunk.embedding_model) {
            (Some(vector), Some(model)) => Some(StoredEmbedding { model, vector }),
            (Some(_), None) => {
                debug!(file = %id, "ignoring stored embedding without embedding_model");
                None
            }
            _ => None,
        };

        entries.push(CorpusEntry { id, summary, stored_embedding });
    }

    for id in summaries.keys() {
        if !entries.iter().any(|e| &e.id == id) {
            warn!(file = %id, "summary index entry has no readable chunk file");
        }
    }

    if entries.is_empty() {
        return Err(RagError::Initialization(format!(
            "corpus directory '{}' contains no readable documents",
            dir.display()
        )));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn missing_directory_is_initialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_corpus(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, RagError::Initialization(_)));
    }

    #[test]
    fn empty_directory_is_initialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_corpus(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::Initialization(_)));
    }

    #[test]
    fn summary_resolution_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"summary": "from file"}"#);
        write(dir.path(), "b.json", r#"{"summary": "shadowed"}"#);
        write(dir.path(), "c.json", r#"{"nodes": [{"type": "Fact", "name": "f"}]}"#);
        write(dir.path(), SUMMARIES_FILE, r#"{"b.json": "from index"}"#);

        let entries = read_corpus(dir.path()).unwrap();
        let summaries: Vec<&str> = entries.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries[0], "from file");
        assert_eq!(summaries[1], "from index");
        assert!(summaries[2].starts_with("1 Fact(s) e.g. [f]"));
    }

    #[test]
    fn entries_are_sorted_and_broken_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "z.json", r#"{"summary": "z"}"#);
        write(dir.path(), "m.json", "[1, 2");
        write(dir.path(), "a.json", r#"{"summary": "a"}"#);

        let ids: Vec<String> = read_corpus(dir.path()).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a.json", "z.json"]);
    }

    #[test]
    fn only_broken_files_is_initialization_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "m.json", "not json");
        assert!(matches!(read_corpus(dir.path()), Err(RagError::Initialization(_))));
    }

    #[test]
    fn corrupt_summary_index_is_initialization_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", r#"{"summary": "a"}"#);
        write(dir.path(), SUMMARIES_FILE, "{");
        assert!(matches!(read_corpus(dir.path()), Err(RagError::Initialization(_))));
    }

    #[test]
    fn stored_embedding_requires_model_tag() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"{"summary": "a", "embedding": [1.0, 0.0], "embedding_model": "m"}"#,
        );
        write(dir.path(), "b.json", r#"{"summary": "b", "embedding": [1.0, 0.0]}"#);

        let entries = read_corpus(dir.path()).unwrap();
        assert_eq!(
            entries[0].stored_embedding,
            Some(StoredEmbedding { model: "m".into(), vector: vec![1.0, 0.0] })
        );
        assert_eq!(entries[1].stored_embedding, None);
    }
}
