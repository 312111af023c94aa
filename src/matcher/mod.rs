//! Semantic matching of segments against the taxonomy embedding cache.

use crate::embedding::Embedder;
use crate::error::{KlippError, Result};
use crate::segment::Segment;
use crate::taxonomy::TaxonomyEmbeddings;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Matches transcript segments to taxonomy nodes by embedding similarity.
pub struct SegmentMatcher {
    embedder: Arc<dyn Embedder>,
}

impl SegmentMatcher {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Score segments against the taxonomy and return the ranked survivors.
    ///
    /// Each segment with non-empty text is embedded (one batch call) and
    /// compared against every taxonomy node. The best node wins, ties broken
    /// by the taxonomy's declared order. Segments scoring below `threshold`
    /// are dropped; survivors get their `score` and `dimension` set and come
    /// back sorted by score descending, input order preserved on ties.
    #[instrument(skip(self, segments, cache), fields(segments = segments.len(), nodes = cache.len()))]
    pub async fn match_segments(
        &self,
        segments: Vec<Segment>,
        cache: &TaxonomyEmbeddings,
        threshold: f32,
    ) -> Result<Vec<Segment>> {
        if cache.is_empty() {
            return Err(KlippError::NoTaxonomy);
        }

        // Empty-text segments never participate in matching
        let candidates: Vec<Segment> = segments
            .into_iter()
            .filter(|s| !s.text.trim().is_empty())
            .collect();

        if candidates.is_empty() {
            debug!("No segments with text to match");
            return Ok(Vec::new());
        }

        let texts: Vec<String> = candidates.iter().map(|s| s.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != candidates.len() {
            return Err(KlippError::InternalConsistency(format!(
                "Backend returned {} embeddings for {} segments",
                embeddings.len(),
                candidates.len()
            )));
        }

        let mut matched: Vec<Segment> = Vec::new();
        for (mut segment, embedding) in candidates.into_iter().zip(embeddings) {
            let (best_node, best_score) = Self::best_node(cache, &embedding)?;

            if best_score >= threshold {
                segment.score = best_score;
                segment.dimension = Some(cache.path_for(best_node));
                matched.push(segment);
            }
        }

        // Vec::sort_by is stable, so ties keep input order
        matched.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            "Matched {} segments above threshold {:.2}",
            matched.len(),
            threshold
        );

        Ok(matched)
    }

    /// Pick the taxonomy node with maximum similarity.
    ///
    /// Strictly-greater comparison against nodes in declared order, so an
    /// exact tie goes to the earlier node.
    fn best_node<'a>(
        cache: &'a TaxonomyEmbeddings,
        segment_embedding: &[f32],
    ) -> Result<(&'a str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for node in cache.nodes() {
            let score = cosine_similarity(segment_embedding, &node.embedding);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((&node.name, score)),
            }
        }
        best.ok_or_else(|| {
            KlippError::InternalConsistency("taxonomy cache has no usable nodes".to_string())
        })
    }
}
