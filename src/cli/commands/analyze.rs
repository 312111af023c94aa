//! Analyze command implementation.

use crate::cli::output::format_range;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::report::AnalysisReport;
use crate::segment::load_segments;
use anyhow::Result;
use std::path::Path;

/// Run the analyze command: match segments without cutting anything.
pub async fn run_analyze(
    segments_path: &str,
    taxonomy_path: Option<&str>,
    threshold: Option<f32>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Analyze) {
        Output::error(&format!("{}", e));
        Output::info("Run 'klipp doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(t) = threshold {
        settings.matching.threshold = t;
        settings.validate()?;
    }

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

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner("Matching segments...");
    let matched = pipeline.analyze(&taxonomy, segments).await?;
    spinner.finish_and_clear();

    if matched.is_empty() {
        Output::warning(&format!(
            "No segments scored above threshold {:.2}.",
            pipeline.settings().matching.threshold
        ));
        return Ok(());
    }

    Output::header("Matched segments");
    for (i, segment) in matched.iter().enumerate() {
        Output::matched_segment(
            i + 1,
            &segment.dimension_path(),
            segment.score,
            &format_range(segment.start, segment.end),
            &segment.text,
        );
    }
    println!();

    let report_path =
        AnalysisReport::from_segments(&matched).write(&pipeline.settings().output_dir())?;
    Output::success(&format!("Report written to {}", report_path.display()));

    Ok(())
}
