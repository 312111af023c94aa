//! Embedding generation for taxonomy and segment matching.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

#[cfg(test)]
pub(crate) mod mock;

/// Trait for embedding generation.
///
/// The matcher treats the backend as a black box: vectors only need to be
/// deterministic functions of the input text, and a batch call must produce
/// the same vectors as per-item calls.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}
