//! Schema chunk summarization.
//!
//! Turns the node/relationship graph of a schema chunk file into the short
//! one-line summary that the index embeds. [`summarize_directory`] and
//! [`write_summaries`] form the offline batch that produces
//! `summaries.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::corpus::{SUMMARIES_FILE, list_chunk_files};
use crate::error::{RagError, Result};

/// Maximum number of sample node names listed per node type.
const MAX_SAMPLES: usize = 3;

/// A schema chunk as written by the schema exporter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaChunk {
    /// Tables, views and other schema objects.
    #[serde(default)]
    pub nodes: Vec<SchemaNode>,
    /// Edges between nodes; only their count is summarized.
    #[serde(default)]
    pub relationships: Vec<Value>,
}

/// A single node of a [`SchemaChunk`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaNode {
    /// Node kind, e.g. `FactTable` or `Dimension`.
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    /// Node name.
    #[serde(default)]
    pub name: Option<String>,
    /// Measures attached to the node. Only arrays are counted.
    #[serde(default)]
    pub measures: Option<Value>,
}

struct TypeStats<'a> {
    node_type: &'a str,
    count: usize,
    samples: Vec<&'a str>,
}

/// Render the one-line summary of a schema chunk.
///
/// Node types appear in first-seen order as
/// `"{count} {type}(s) e.g. [{samples}]"`, followed by the total number of
/// measures and of relationships, all joined by `"; "`.
///
/// ```rust
/// use advisor_rag::summary::{SchemaChunk, summarize_schema};
///
/// let chunk: SchemaChunk = serde_json::from_str(
///     r#"{"nodes": [{"type": "Fact", "name": "fact_sales", "measures": ["amount"]}],
///         "relationships": []}"#,
/// ).unwrap();
/// assert_eq!(
///     summarize_schema(&chunk),
///     "1 Fact(s) e.g. [fact_sales]; Total measures across nodes: 1; Total relationships: 0",
/// );
/// ```
pub fn summarize_schema(chunk: &SchemaChunk) -> String {
    let mut stats: Vec<TypeStats<'_>> = Vec::new();
    let mut total_measures = 0;

    for node in &chunk.nodes {
        let node_type = node.node_type.as_deref().unwrap_or("Unknown");
        let position = match stats.iter().position(|s| s.node_type == node_type) {
            Some(position) => position,
            None => {
                stats.push(TypeStats { node_type, count: 0, samples: Vec::new() });
                stats.len() - 1
            }
        };
        let entry = &mut stats[position];
        entry.count += 1;
        if entry.samples.len() < MAX_SAMPLES {
            entry.samples.push(node.name.as_deref().unwrap_or("Unnamed"));
        }

        if let Some(Value::Array(measures)) = &node.measures {
            total_measures += measures.len();
        }
    }

    let mut lines: Vec<String> = stats
        .iter()
        .map(|s| format!("{} {}(s) e.g. [{}]", s.count, s.node_type, s.samples.join(", ")))
        .collect();
    lines.push(format!("Total measures across nodes: {total_measures}"));
    lines.push(format!("Total relationships: {}", chunk.relationships.len()));
    lines.join("; ")
}

/// Summarize every schema chunk file in `dir`, keyed by file name.
///
/// A file that cannot be read or is not a valid schema chunk gets the
/// summary `"Error parsing JSON: {error}"` instead of aborting the batch.
///
/// # Errors
///
/// Returns [`RagError::Io`] if the directory cannot be listed.
pub fn summarize_directory(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut summaries = BTreeMap::new();

    for (name, path) in list_chunk_files(dir)? {
        let parsed = fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_slice::<SchemaChunk>(&raw).map_err(|e| e.to_string()));
        let summary = match parsed {
            Ok(chunk) => summarize_schema(&chunk),
            Err(e) => {
                warn!(file = %name, error = %e, "schema chunk is not valid JSON");
                format!("Error parsing JSON: {e}")
            }
        };
        summaries.insert(name, summary);
    }

    info!(dir = %dir.display(), count = summaries.len(), "summarized schema chunks");
    Ok(summaries)
}

/// Write summaries as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`RagError::Io`] if the file cannot be written.
pub fn write_summaries(path: &Path, summaries: &BTreeMap<String, String>) -> Result<()> {
    let body = serde_json::to_string_pretty(summaries)
        .map_err(|source| RagError::Json { path: path.to_path_buf(), source })?;
    fs::write(path, body).map_err(|source| RagError::Io { path: path.to_path_buf(), source })
}

/// Default location of the summary file inside a corpus directory.
pub fn default_summaries_path(dir: &Path) -> std::path::PathBuf {
    dir.join(SUMMARIES_FILE)
}
