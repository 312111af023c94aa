//! Analysis report written after a pipeline run.
//!
//! The record summarizes what was matched and extracted; its schema belongs
//! to the surrounding application, not the core pipeline.

use crate::segment::Segment;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub version: String,
    pub analysis_date: String,
    /// Number of distinct video sources the segments came from.
    pub video_count: usize,
    pub segments: Vec<SegmentRecord>,
    /// Average clip duration in seconds, rounded to two decimals.
    pub average_duration: f64,
}

/// One matched segment as it appears in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub score: f32,
    pub source: String,
    pub dimension: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<PathBuf>,
}

impl From<&Segment> for SegmentRecord {
    fn from(segment: &Segment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            text: segment.text.clone(),
            score: segment.score,
            source: segment.source.clone(),
            dimension: segment.dimension_path(),
            clip_path: segment.clip_path.clone(),
        }
    }
}

impl AnalysisReport {
    /// Build a report from the segments that survived the run.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let sources: HashSet<&str> = segments.iter().map(|s| s.source.as_str()).collect();

        let average_duration = if segments.is_empty() {
            0.0
        } else {
            let total: f64 = segments.iter().map(|s| s.duration()).sum();
            (total / segments.len() as f64 * 100.0).round() / 100.0
        };

        Self {
            version: "1.0".to_string(),
            analysis_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            video_count: sources.len(),
            segments: segments.iter().map(SegmentRecord::from).collect(),
            average_duration,
        }
    }

    /// Write the report as `analysis_<timestamp>.json` under `dir`.
    pub fn write(&self, dir: &Path) -> crate::error::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("analysis_{}.json", timestamp));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::DimensionPath;

    fn matched_segment(start: f64, end: f64, source: &str, score: f32) -> Segment {
        let mut segment = Segment::new(start, end, "text", source).unwrap();
        segment.score = score;
        segment.dimension = Some(DimensionPath {
            level1: "Brand".to_string(),
            level2: "Price".to_string(),
        });
        segment
    }

    #[test]
    fn test_report_summary_fields() {
        let segments = vec![
            matched_segment(0.0, 4.0, "a.mp4", 0.9),
            matched_segment(5.0, 11.0, "a.mp4", 0.8),
            matched_segment(0.0, 5.0, "b.mp4", 0.7),
        ];

        let report = AnalysisReport::from_segments(&segments);
        assert_eq!(report.version, "1.0");
        assert_eq!(report.video_count, 2);
        assert_eq!(report.segments.len(), 3);
        // (4 + 6 + 5) / 3 = 5.0
        assert_eq!(report.average_duration, 5.0);
        assert_eq!(report.segments[0].dimension, "Brand > Price");
    }

    #[test]
    fn test_report_empty_segments() {
        let report = AnalysisReport::from_segments(&[]);
        assert_eq!(report.video_count, 0);
        assert_eq!(report.average_duration, 0.0);
    }

    #[test]
    fn test_report_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let segments = vec![matched_segment(0.0, 4.0, "a.mp4", 0.9)];

        let report = AnalysisReport::from_segments(&segments);
        let path = report.write(dir.path()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert_eq!(parsed.segments[0].score, 0.9);
    }
}
