//! Taxonomy model and embedding cache.
//!
//! A taxonomy is one top-level label plus an ordered list of second-level
//! node names. Matching is flat: only the second-level names are embedded
//! and scored, the top-level label is display-only.

use crate::embedding::Embedder;
use crate::error::{KlippError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A two-level topic taxonomy as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Top-level label, used only to render dimension paths.
    pub level1: String,
    /// Ordered second-level node names. Duplicates are allowed in input and
    /// collapsed before embedding.
    pub level2: Vec<String>,
}

impl Taxonomy {
    /// Create a taxonomy, rejecting empty input.
    pub fn new(level1: impl Into<String>, level2: Vec<String>) -> Result<Self> {
        let level1 = level1.into();
        if level1.trim().is_empty() {
            return Err(KlippError::InvalidInput(
                "taxonomy level1 label must not be empty".to_string(),
            ));
        }
        let level2: Vec<String> = level2
            .into_iter()
            .filter(|n| !n.trim().is_empty())
            .collect();
        if level2.is_empty() {
            return Err(KlippError::InvalidInput(
                "taxonomy must have at least one second-level node".to_string(),
            ));
        }
        Ok(Self { level1, level2 })
    }

    /// Load a taxonomy from a JSON file ({"level1": ..., "level2": [...]}).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: Taxonomy = serde_json::from_str(&content)?;
        Self::new(raw.level1, raw.level2)
    }

    /// Second-level names with duplicates collapsed, first occurrence wins.
    pub fn unique_level2(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.level2
            .iter()
            .filter(|n| seen.insert(n.as_str()))
            .cloned()
            .collect()
    }
}

/// A matched dimension as a structured pair.
///
/// The `"<level1> > <level2>"` string is a rendering detail; nothing parses
/// it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionPath {
    pub level1: String,
    pub level2: String,
}

impl std::fmt::Display for DimensionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} > {}", self.level1, self.level2)
    }
}

/// A taxonomy node with its embedding vector.
#[derive(Debug, Clone)]
pub struct TaxonomyNode {
    /// Node display name, unique within the cache.
    pub name: String,
    /// Embedding vector, computed once and immutable afterwards.
    pub embedding: Vec<f32>,
}

/// The fully populated taxonomy embedding cache.
///
/// Read-only once built; safe to share across concurrent matching calls.
#[derive(Debug, Clone)]
pub struct TaxonomyEmbeddings {
    level1: String,
    nodes: Vec<TaxonomyNode>,
}

impl TaxonomyEmbeddings {
    /// The top-level label used when rendering dimension paths.
    pub fn level1(&self) -> &str {
        &self.level1
    }

    /// Nodes in the taxonomy's declared order.
    pub fn nodes(&self) -> &[TaxonomyNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// An empty cache, for exercising the matcher's hard-failure guard.
    #[cfg(test)]
    pub(crate) fn empty_for_tests(level1: &str) -> Self {
        Self {
            level1: level1.to_string(),
            nodes: Vec::new(),
        }
    }

    /// Render the display path for a node of this taxonomy.
    pub fn path_for(&self, node_name: &str) -> DimensionPath {
        DimensionPath {
            level1: self.level1.clone(),
            level2: node_name.to_string(),
        }
    }
}

/// Embeds taxonomy node names into the cache the matcher runs against.
pub struct TaxonomyEmbedder {
    embedder: Arc<dyn Embedder>,
}

impl TaxonomyEmbedder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Build the embedding cache for a taxonomy.
    ///
    /// Duplicate node names are collapsed before the batch call so identical
    /// names are embedded once. Embeddings are deterministic functions of the
    /// text, so rebuilding from the same taxonomy yields the same cache. On
    /// backend failure no cache is produced; any previously built cache held
    /// by the caller stays as it was.
    #[instrument(skip(self, taxonomy), fields(level1 = %taxonomy.level1))]
    pub async fn build(&self, taxonomy: &Taxonomy) -> Result<TaxonomyEmbeddings> {
        let names = taxonomy.unique_level2();
        debug!(
            "Embedding {} taxonomy nodes ({} before dedup)",
            names.len(),
            taxonomy.level2.len()
        );

        let embeddings = self.embedder.embed_batch(&names).await?;
        if embeddings.len() != names.len() {
            return Err(KlippError::EmbeddingBackend(format!(
                "Backend returned {} embeddings for {} taxonomy nodes",
                embeddings.len(),
                names.len()
            )));
        }

        let nodes: Vec<TaxonomyNode> = names
            .into_iter()
            .zip(embeddings)
            .map(|(name, embedding)| TaxonomyNode { name, embedding })
            .collect();

        info!("Taxonomy embedding cache built ({} nodes)", nodes.len());

        Ok(TaxonomyEmbeddings {
            level1: taxonomy.level1.clone(),
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::mock::{FailingEmbedder, MockEmbedder};

    #[test]
    fn test_taxonomy_rejects_empty() {
        assert!(Taxonomy::new("", vec!["a".into()]).is_err());
        assert!(Taxonomy::new("Brand", vec![]).is_err());
        assert!(Taxonomy::new("Brand", vec!["  ".into()]).is_err());
    }

    #[test]
    fn test_unique_level2_keeps_first_occurrence_order() {
        let taxonomy = Taxonomy::new(
            "Brand",
            vec![
                "Durability".into(),
                "Price".into(),
                "Durability".into(),
                "Design".into(),
            ],
        )
        .unwrap();

        assert_eq!(taxonomy.unique_level2(), vec!["Durability", "Price", "Design"]);
    }

    #[test]
    fn test_dimension_path_display() {
        let path = DimensionPath {
            level1: "Brand".to_string(),
            level2: "Durability".to_string(),
        };
        assert_eq!(path.to_string(), "Brand > Durability");
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let embedder = Arc::new(MockEmbedder::default());
        let taxonomy_embedder = TaxonomyEmbedder::new(embedder);
        let taxonomy = Taxonomy::new("Brand", vec!["Durability".into(), "Price".into()]).unwrap();

        let first = taxonomy_embedder.build(&taxonomy).await.unwrap();
        let second = taxonomy_embedder.build(&taxonomy).await.unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.nodes().iter().zip(second.nodes()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.embedding, b.embedding);
        }
    }

    #[tokio::test]
    async fn test_duplicates_embedded_once() {
        let embedder = Arc::new(MockEmbedder::default());
        let taxonomy_embedder = TaxonomyEmbedder::new(embedder.clone());
        let taxonomy = Taxonomy::new(
            "Brand",
            vec!["Durability".into(), "Durability".into(), "Price".into()],
        )
        .unwrap();

        let cache = taxonomy_embedder.build(&taxonomy).await.unwrap();
        assert_eq!(cache.len(), 2);
        // Two unique names means exactly two texts hit the backend
        assert_eq!(embedder.texts_embedded(), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_previous_cache_intact() {
        let taxonomy = Taxonomy::new("Brand", vec!["Durability".into()]).unwrap();

        let good = TaxonomyEmbedder::new(Arc::new(MockEmbedder::default()));
        let cache = good.build(&taxonomy).await.unwrap();

        let bad = TaxonomyEmbedder::new(Arc::new(FailingEmbedder));
        let err = bad.build(&taxonomy).await.unwrap_err();
        assert!(matches!(err, KlippError::EmbeddingBackend(_)));

        // The previously built cache is untouched by the failed rebuild
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.nodes()[0].name, "Durability");
    }
}
