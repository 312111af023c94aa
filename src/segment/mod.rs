//! Segment model: a timed transcript excerpt tied to a video source.

use crate::error::{KlippError, Result};
use crate::taxonomy::DimensionPath;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A timed transcript excerpt from a video source.
///
/// Created by the transcript-generation collaborator with `score` zero and no
/// dimension; the matcher fills `score` and `dimension`, the extractor fills
/// `clip_path`, and the composer reads the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds (exclusive, > start).
    pub end: f64,
    /// Transcript text. Segments with empty text are excluded from matching.
    #[serde(default)]
    pub text: String,
    /// Video source: remote URL or local file path.
    pub source: String,
    /// Best similarity score, set by the matcher.
    #[serde(default)]
    pub score: f32,
    /// Matched taxonomy dimension, set by the matcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<DimensionPath>,
    /// Extracted clip file, set by the extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<PathBuf>,
}

impl Segment {
    /// Create a validated segment.
    pub fn new(start: f64, end: f64, text: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let segment = Self {
            start,
            end,
            text: text.into(),
            source: source.into(),
            score: 0.0,
            dimension: None,
            clip_path: None,
        };
        segment.validate()?;
        Ok(segment)
    }

    /// Check the timing and source invariants.
    pub fn validate(&self) -> Result<()> {
        if self.start < 0.0 {
            return Err(KlippError::InvalidInput(format!(
                "segment start must be >= 0, got {}",
                self.start
            )));
        }
        if self.end <= self.start {
            return Err(KlippError::InvalidInput(format!(
                "segment end ({}) must be greater than start ({})",
                self.end, self.start
            )));
        }
        if self.source.trim().is_empty() {
            return Err(KlippError::InvalidInput(
                "segment source must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// The rendered dimension path, empty until matched.
    pub fn dimension_path(&self) -> String {
        self.dimension
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default()
    }
}

/// Load and validate a segment list from a JSON file.
///
/// The file holds the collaborator's output: an array of
/// `{start, end, text, source}` records.
pub fn load_segments(path: &Path) -> Result<Vec<Segment>> {
    let content = std::fs::read_to_string(path)?;
    let segments: Vec<Segment> = serde_json::from_str(&content)?;
    for (i, segment) in segments.iter().enumerate() {
        segment
            .validate()
            .map_err(|e| KlippError::InvalidInput(format!("segment {}: {}", i, e)))?;
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_validation() {
        assert!(Segment::new(0.0, 5.0, "text", "a.mp4").is_ok());
        assert!(Segment::new(-1.0, 5.0, "text", "a.mp4").is_err());
        assert!(Segment::new(5.0, 5.0, "text", "a.mp4").is_err());
        assert!(Segment::new(6.0, 5.0, "text", "a.mp4").is_err());
        assert!(Segment::new(0.0, 5.0, "text", "  ").is_err());
    }

    #[test]
    fn test_duration() {
        let segment = Segment::new(2.5, 9.0, "", "a.mp4").unwrap();
        assert!((segment.duration() - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dimension_path_empty_until_matched() {
        let mut segment = Segment::new(0.0, 5.0, "text", "a.mp4").unwrap();
        assert_eq!(segment.dimension_path(), "");

        segment.dimension = Some(crate::taxonomy::DimensionPath {
            level1: "Brand".to_string(),
            level2: "Price".to_string(),
        });
        assert_eq!(segment.dimension_path(), "Brand > Price");
    }

    #[test]
    fn test_load_segments_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.json");
        std::fs::write(
            &path,
            r#"[
                {"start": 0.0, "end": 5.0, "text": "hello", "source": "https://example.com/a.mp4"},
                {"start": 5.0, "end": 9.0, "text": "", "source": "/videos/b.mp4"}
            ]"#,
        )
        .unwrap();

        let segments = load_segments(&path).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello");
        assert_eq!(segments[1].score, 0.0);
        assert!(segments[1].clip_path.is_none());
    }

    #[test]
    fn test_load_segments_rejects_invalid_timing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.json");
        std::fs::write(
            &path,
            r#"[{"start": 9.0, "end": 5.0, "text": "x", "source": "a.mp4"}]"#,
        )
        .unwrap();

        assert!(load_segments(&path).is_err());
    }
}
