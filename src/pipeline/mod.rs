//! Pipeline orchestrator for Klipp.
//!
//! Coordinates the run from taxonomy embedding through matching, clip
//! extraction, and composition.

use crate::clip::ClipExtractor;
use crate::compose::{Composer, CompositionSettings};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{KlippError, Result};
use crate::fetch::SourceFetcher;
use crate::matcher::SegmentMatcher;
use crate::report::AnalysisReport;
use crate::segment::Segment;
use crate::taxonomy::{Taxonomy, TaxonomyEmbedder};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of a full pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// Matched segments with their clip files, in ranked order.
    pub segments: Vec<Segment>,
    /// The composed output video.
    pub output_video: PathBuf,
    /// The analysis report written alongside it.
    pub report_path: PathBuf,
}

/// The main orchestrator for the Klipp pipeline.
pub struct Pipeline {
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    matcher: SegmentMatcher,
    fetcher: SourceFetcher,
    extractor: ClipExtractor,
    composer: Composer,
}

impl Pipeline {
    /// Create a pipeline with the default embedding backend.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));
        Self::with_embedder(settings, embedder)
    }

    /// Create a pipeline with a custom embedding backend.
    pub fn with_embedder(settings: Settings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let fetcher = SourceFetcher::new(&settings.fetch, settings.temp_dir())?;
        let extractor = ClipExtractor::new(settings.clips_dir())?;
        let composer = Composer::new(settings.temp_dir(), settings.output_dir())?;
        let matcher = SegmentMatcher::new(embedder.clone());

        Ok(Self {
            settings,
            embedder,
            matcher,
            fetcher,
            extractor,
            composer,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Match segments against the taxonomy, without extracting anything.
    ///
    /// Builds the embedding cache first; an unavailable backend or an empty
    /// taxonomy is fatal.
    #[instrument(skip(self, taxonomy, segments), fields(segments = segments.len()))]
    pub async fn analyze(
        &self,
        taxonomy: &Taxonomy,
        segments: Vec<Segment>,
    ) -> Result<Vec<Segment>> {
        let cache = TaxonomyEmbedder::new(self.embedder.clone())
            .build(taxonomy)
            .await?;

        self.matcher
            .match_segments(segments, &cache, self.settings.matching.threshold)
            .await
    }

    /// Run the full pipeline: match, extract clips, compose, report.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        taxonomy: &Taxonomy,
        segments: Vec<Segment>,
        composition: &CompositionSettings,
    ) -> Result<RunResult> {
        let matched = self.analyze(taxonomy, segments).await?;
        if matched.is_empty() {
            return Err(KlippError::NoSegments);
        }
        info!("{} segments matched", matched.len());

        let extracted = self.extract_clips(matched).await?;
        if extracted.is_empty() {
            return Err(KlippError::NoSegments);
        }
        info!("{} clips extracted", extracted.len());

        let report_path = AnalysisReport::from_segments(&extracted)
            .write(&self.settings.output_dir())?;

        let output_video = self.composer.compose(&extracted, composition).await?;

        Ok(RunResult {
            segments: extracted,
            output_video,
            report_path,
        })
    }

    /// Compose pre-extracted clips without matching or extraction.
    pub async fn compose(
        &self,
        segments: &[Segment],
        composition: &CompositionSettings,
    ) -> Result<PathBuf> {
        self.composer.compose(segments, composition).await
    }

    /// Fetch each segment's source and cut its clip.
    ///
    /// Runs with bounded concurrency; each worker owns one segment and
    /// writes uniquely named files, and the results are re-sorted to the
    /// matched order so the final timeline is deterministic regardless of
    /// completion order. A failed segment is logged and dropped without
    /// touching its siblings; a downloaded source is deleted once its
    /// extraction finishes, successful or not.
    async fn extract_clips(&self, matched: Vec<Segment>) -> Result<Vec<Segment>> {
        let label_clips = self.settings.extraction.label_clips;
        let fetcher = &self.fetcher;
        let extractor = &self.extractor;

        let results: Vec<Result<Option<(usize, Segment)>>> =
            futures::stream::iter(matched.into_iter().enumerate())
                .map(|(index, mut segment)| async move {
                    let fetched = match fetcher.fetch(&segment.source).await {
                        Ok(f) => f,
                        Err(e) if e.is_local() => {
                            warn!("Skipping segment {}: {}", index, e);
                            return Ok(None);
                        }
                        Err(e) => return Err(e),
                    };

                    let label = label_clips.then(|| segment.dimension_path());
                    let extraction = extractor
                        .extract(
                            fetched.path(),
                            segment.start,
                            segment.end,
                            label.as_deref().filter(|l| !l.is_empty()),
                        )
                        .await;
                    // Temp download is removed here whether or not the cut worked
                    drop(fetched);

                    match extraction {
                        Ok(clip_path) => {
                            segment.clip_path = Some(clip_path);
                            Ok(Some((index, segment)))
                        }
                        Err(e) if e.is_local() => {
                            warn!("Skipping segment {}: {}", index, e);
                            Ok(None)
                        }
                        Err(e) => Err(e),
                    }
                })
                .buffer_unordered(self.settings.extraction.max_concurrent)
                .collect()
                .await;

        let mut extracted: Vec<(usize, Segment)> = Vec::new();
        for result in results {
            if let Some(item) = result? {
                extracted.push(item);
            }
        }

        // Completion order is nondeterministic; matched order is not
        extracted.sort_by_key(|(index, _)| *index);
        Ok(extracted.into_iter().map(|(_, segment)| segment).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::mock::{FailingEmbedder, MockEmbedder};

    fn test_settings(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.join("data").to_string_lossy().to_string();
        settings.general.temp_dir = dir.join("tmp").to_string_lossy().to_string();
        settings
    }

    fn scenario_pipeline(dir: &std::path::Path) -> Pipeline {
        let embedder = Arc::new(
            MockEmbedder::default()
                .with_vector("Durability", vec![1.0, 0.0])
                .with_vector("Price", vec![0.0, 1.0])
                .with_vector("This phone survives drops easily", vec![0.9, 0.1])
                .with_vector("Cheapest option on the market", vec![0.05, 0.95])
                .with_vector("totally unrelated", vec![-1.0, 0.0]),
        );
        Pipeline::with_embedder(test_settings(dir), embedder).unwrap()
    }

    fn taxonomy() -> Taxonomy {
        Taxonomy::new("Brand", vec!["Durability".into(), "Price".into()]).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_tags_and_ranks() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = scenario_pipeline(dir.path());

        let segments = vec![
            Segment::new(0.0, 5.0, "This phone survives drops easily", "a.mp4").unwrap(),
            Segment::new(5.0, 9.0, "Cheapest option on the market", "a.mp4").unwrap(),
            Segment::new(9.0, 12.0, "totally unrelated", "a.mp4").unwrap(),
        ];

        let matched = pipeline.analyze(&taxonomy(), segments).await.unwrap();
        assert_eq!(matched.len(), 2);
        assert!(matched[0].score >= matched[1].score);
        assert!(matched
            .iter()
            .all(|s| s.dimension_path().starts_with("Brand > ")));
    }

    #[tokio::test]
    async fn test_run_with_no_matches_is_no_segments() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = scenario_pipeline(dir.path());
        let composition =
            CompositionSettings::from_defaults(&pipeline.settings().composition).unwrap();

        let segments =
            vec![Segment::new(0.0, 5.0, "totally unrelated", "a.mp4").unwrap()];

        let err = pipeline
            .run(&taxonomy(), segments, &composition)
            .await
            .unwrap_err();
        assert!(matches!(err, KlippError::NoSegments));
    }

    #[tokio::test]
    async fn test_run_with_failing_backend_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline =
            Pipeline::with_embedder(test_settings(dir.path()), Arc::new(FailingEmbedder)).unwrap();
        let composition =
            CompositionSettings::from_defaults(&pipeline.settings().composition).unwrap();

        let segments = vec![Segment::new(0.0, 5.0, "text", "a.mp4").unwrap()];
        let err = pipeline
            .run(&taxonomy(), segments, &composition)
            .await
            .unwrap_err();
        assert!(matches!(err, KlippError::EmbeddingBackend(_)));
    }

    #[tokio::test]
    async fn test_unfetchable_sources_skipped_then_no_segments() {
        // Every source is missing, so extraction skips them all and the run
        // fails only at the "nothing survived" boundary.
        let dir = tempfile::tempdir().unwrap();
        let pipeline = scenario_pipeline(dir.path());
        let composition =
            CompositionSettings::from_defaults(&pipeline.settings().composition).unwrap();

        let segments = vec![
            Segment::new(0.0, 5.0, "This phone survives drops easily", "/missing/a.mp4").unwrap(),
            Segment::new(5.0, 9.0, "Cheapest option on the market", "/missing/b.mp4").unwrap(),
        ];

        let err = pipeline
            .run(&taxonomy(), segments, &composition)
            .await
            .unwrap_err();
        assert!(matches!(err, KlippError::NoSegments));
    }
}
