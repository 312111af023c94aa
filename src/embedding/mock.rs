//! Deterministic embedders for tests.

use super::Embedder;
use crate::error::{KlippError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Embedder backed by a fixed map, with a deterministic fallback for
/// unregistered texts. Also counts how many texts hit the backend.
#[derive(Default)]
pub struct MockEmbedder {
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    embedded: AtomicUsize,
}

impl MockEmbedder {
    /// Register a fixed vector for a text.
    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors
            .write()
            .unwrap()
            .insert(text.to_string(), vector);
        self
    }

    /// Total number of texts embedded across all calls.
    pub fn texts_embedded(&self) -> usize {
        self.embedded.load(Ordering::SeqCst)
    }

    /// Deterministic 8-dim vector derived from the text bytes.
    fn derive(text: &str) -> Vec<f32> {
        let mut v = [0.0f32; 8];
        for (i, b) in text.bytes().enumerate() {
            v[i % 8] += b as f32 / 255.0;
        }
        // Avoid the zero vector for empty text
        v[0] += 1.0;
        v.to_vec()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let batch = self.embed_batch(&[text.to_string()]).await?;
        Ok(batch.into_iter().next().unwrap())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        let vectors = self.vectors.read().unwrap();
        Ok(texts
            .iter()
            .map(|t| vectors.get(t).cloned().unwrap_or_else(|| Self::derive(t)))
            .collect())
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Embedder that always fails, for backend-outage paths.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(KlippError::EmbeddingBackend("backend unavailable".into()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(KlippError::EmbeddingBackend("backend unavailable".into()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}
