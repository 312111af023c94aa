//! Run command implementation: the full match-extract-compose pipeline.

use crate::cli::output::format_range;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::compose::CompositionSettings;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::segment::load_segments;
use anyhow::Result;
use std::path::Path;

/// CLI overrides applied on top of the configured composition defaults.
pub struct ComposeOverrides {
    pub transition: Option<String>,
    pub transition_duration: Option<f64>,
    pub slogan: Option<String>,
    pub output: Option<String>,
}

impl ComposeOverrides {
    pub fn apply(self, settings: &mut Settings) {
        if let Some(t) = self.transition {
            settings.composition.transition = t;
        }
        if let Some(d) = self.transition_duration {
            settings.composition.transition_duration = Some(d);
        }
        if let Some(s) = self.slogan {
            settings.composition.slogan = Some(s);
        }
        if let Some(o) = self.output {
            settings.composition.output_name = o;
        }
    }
}

/// Run the full pipeline command.
pub async fn run_pipeline(
    segments_path: &str,
    taxonomy_path: Option<&str>,
    threshold: Option<f32>,
    overrides: ComposeOverrides,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Run) {
        Output::error(&format!("{}", e));
        Output::info("Run 'klipp doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(t) = threshold {
        settings.matching.threshold = t;
    }
    overrides.apply(&mut settings);
    settings.validate()?;

    let segments = load_segments(Path::new(segments_path))?;
    Output::info(&format!(
        "Loaded {} segments from {}",
        segments.len(),
        segments_path
    ));

    let taxonomy = super::load_taxonomy(&settings, taxonomy_path)?;
    Output::info(&format!(
        "Matching against '{}' ({} dimensions)",
        taxonomy.level1,
        taxonomy.unique_level2().len()
    ));

    let composition = CompositionSettings::from_defaults(&settings.composition)?;
    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Matching, extracting and composing...");
    let result = pipeline.run(&taxonomy, segments, &composition).await?;
    spinner.finish_and_clear();

    Output::header("Clips in timeline");
    for (i, segment) in result.segments.iter().enumerate() {
        Output::matched_segment(
            i + 1,
            &segment.dimension_path(),
            segment.score,
            &format_range(segment.start, segment.end),
            &segment.text,
        );
    }
    println!();

    Output::success(&format!("Video rendered to {}", result.output_video.display()));
    Output::success(&format!("Report written to {}", result.report_path.display()));

    Ok(())
}
