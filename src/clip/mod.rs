//! Clip extraction: cut a time range out of a source video into its own file.

use crate::error::{KlippError, Result};
use crate::ffmpeg::{self, quote_drawtext};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Seconds salvaged from the tail when the requested start is past the end.
const TAIL_SALVAGE_SECONDS: f64 = 5.0;

/// Minimum clip length forced when clamping collapses the range.
const MIN_CLIP_SECONDS: f64 = 3.0;

/// Clamp a requested `[start, end)` range to a source of length `duration`.
///
/// A start at or past the end of the video salvages the trailing five
/// seconds instead of failing; the end is capped at the video duration; and
/// a collapsed range is forced back open to a three second clip.
pub fn clamp_range(start: f64, end: f64, duration: f64) -> (f64, f64) {
    let start = if start >= duration {
        warn!(
            "Requested start {:.2}s is past the {:.2}s source, salvaging tail",
            start, duration
        );
        (duration - TAIL_SALVAGE_SECONDS).max(0.0)
    } else {
        start
    };

    let mut end = end.min(duration);
    if end <= start {
        warn!("Empty range after clamping ({:.2}-{:.2})", start, end);
        end = start + MIN_CLIP_SECONDS;
    }

    (start, end)
}

/// Cuts precise time ranges out of local video files.
pub struct ClipExtractor {
    clips_dir: PathBuf,
}

impl ClipExtractor {
    pub fn new(clips_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&clips_dir)?;
        Ok(Self { clips_dir })
    }

    /// Extract `[start, end)` from `source` into a new clip file.
    ///
    /// The range is clamped to the source duration per [`clamp_range`]. When
    /// a label is given it is burned in as a semi-transparent overlay
    /// anchored bottom-left for the clip's whole duration. Output names are
    /// unique per call, so repeated or concurrent runs never collide.
    #[instrument(skip(self, source), fields(source = %source.display()))]
    pub async fn extract(
        &self,
        source: &Path,
        start: f64,
        end: f64,
        label: Option<&str>,
    ) -> Result<PathBuf> {
        if !source.is_file() {
            return Err(KlippError::ClipExtraction(format!(
                "source file missing: {}",
                source.display()
            )));
        }

        let duration = ffmpeg::probe_duration(source)
            .await
            .map_err(|e| KlippError::ClipExtraction(format!("unreadable source: {}", e)))?;

        let (start, end) = clamp_range(start, end, duration);
        let output_path = self.clips_dir.join(unique_clip_name(start, end));

        let start_arg = format!("{:.3}", start);
        let length_arg = format!("{:.3}", end - start);
        let source_arg = source.to_string_lossy().to_string();
        let output_arg = output_path.to_string_lossy().to_string();

        let mut args: Vec<&str> = vec![
            "-ss", &start_arg,
            "-i", &source_arg,
            "-t", &length_arg,
        ];

        let label_filter = label.filter(|l| !l.is_empty()).map(label_overlay_filter);
        if let Some(filter) = &label_filter {
            args.extend(["-vf", filter.as_str()]);
        }

        args.extend([
            "-c:v", "libx264",
            "-preset", "veryfast",
            "-c:a", "aac",
            "-y",
            "-loglevel", "error",
            &output_arg,
        ]);

        if let Err(e) = ffmpeg::run_ffmpeg(&args).await {
            // Never leave a half-written clip behind
            let _ = std::fs::remove_file(&output_path);
            return Err(KlippError::ClipExtraction(e.to_string()));
        }

        info!(
            "Extracted clip [{:.2}s, {:.2}s) to {}",
            start,
            end,
            output_path.display()
        );
        Ok(output_path)
    }
}

/// Opaque, collision-free clip file name carrying the rounded range.
fn unique_clip_name(start: f64, end: f64) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.mp4", &id[..8], start as i64, end as i64)
}

/// Semi-transparent label overlay anchored bottom-left.
fn label_overlay_filter(label: &str) -> String {
    format!(
        "drawtext=text={}:x=10:y=h-text_h-10:fontsize=24:fontcolor=white:box=1:boxcolor=black@0.5:boxborderw=8",
        quote_drawtext(label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_start_past_duration_salvages_tail() {
        // start=D+10, end=D+20 covers [max(0, D-5), D)
        let (start, end) = clamp_range(70.0, 80.0, 60.0);
        assert_eq!((start, end), (55.0, 60.0));

        // Short sources clamp the salvage start to zero
        let (start, end) = clamp_range(10.0, 12.0, 3.0);
        assert_eq!(start, 0.0);
        assert_eq!(end, 3.0);
    }

    #[test]
    fn test_clamp_end_capped_at_duration() {
        let (start, end) = clamp_range(2.0, 100.0, 10.0);
        assert_eq!((start, end), (2.0, 10.0));
    }

    #[test]
    fn test_clamp_collapsed_range_forces_minimum_clip() {
        // start=5, end=5 yields [5, 8)
        let (start, end) = clamp_range(5.0, 5.0, 60.0);
        assert_eq!((start, end), (5.0, 8.0));

        let (start, end) = clamp_range(5.0, 4.0, 60.0);
        assert_eq!((start, end), (5.0, 8.0));
    }

    #[test]
    fn test_clamp_valid_range_untouched() {
        let (start, end) = clamp_range(3.0, 9.5, 60.0);
        assert_eq!((start, end), (3.0, 9.5));
    }

    #[test]
    fn test_unique_clip_names_never_collide() {
        let a = unique_clip_name(5.0, 9.9);
        let b = unique_clip_name(5.0, 9.9);
        assert_ne!(a, b);
        assert!(a.ends_with("_5_9.mp4"));
    }

    #[test]
    fn test_label_overlay_filter_quotes_text() {
        let filter = label_overlay_filter("Brand > Price");
        assert!(filter.contains("text='Brand > Price'"));
        assert!(filter.contains("boxcolor=black@0.5"));
    }

    #[tokio::test]
    async fn test_missing_source_is_clip_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = ClipExtractor::new(dir.path().join("clips")).unwrap();

        let err = extractor
            .extract(Path::new("/nonexistent/a.mp4"), 0.0, 5.0, None)
            .await
            .unwrap_err();
        assert!(matches!(err, KlippError::ClipExtraction(_)));
        assert!(err.is_local());
    }
}
