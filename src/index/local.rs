use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::index::VectorIndex;
use crate::models::{IndexMatch, Metadata};

/// A stored vector entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalEntry {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// In-memory index with cosine similarity search, loaded from a pre-built
/// JSON snapshot. Never written to.
pub struct LocalIndex {
    entries: Vec<LocalEntry>,
}

impl LocalIndex {
    pub fn new(entries: Vec<LocalEntry>) -> Self {
        Self { entries }
    }

    /// Load a snapshot: a JSON array of `{id, values, metadata}` objects.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read index snapshot {}", path.display()))?;
        let entries: Vec<LocalEntry> = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse index snapshot {}", path.display()))?;
        Ok(Self::new(entries))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl VectorIndex for LocalIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<IndexMatch>> {
        let mut scored: Vec<(f32, &LocalEntry)> = self
            .entries
            .iter()
            .map(|e| (cosine_similarity(vector, &e.values), e))
            .collect();

        // Stable: equal scores keep snapshot order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, e)| IndexMatch {
                id: e.id.clone(),
                score,
                metadata: if include_metadata {
                    e.metadata.clone()
                } else {
                    Metadata::new()
                },
            })
            .collect())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
