//! Compose command implementation: stitch existing clip files.

use super::ComposeOverrides;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::compose::{Composer, CompositionSettings};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the compose command on a list of clip files, in timeline order.
pub async fn run_compose(
    clips: &[String],
    overrides: ComposeOverrides,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Compose) {
        Output::error(&format!("{}", e));
        Output::info("Run 'klipp doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if clips.is_empty() {
        Output::error("No clip files given.");
        return Err(anyhow::anyhow!("no clip files given"));
    }

    overrides.apply(&mut settings);
    settings.validate()?;

    // Bare clip files carry no transcript text, so no captions are drawn
    let clip_paths: Vec<PathBuf> = clips.iter().map(PathBuf::from).collect();

    let composition = CompositionSettings::from_defaults(&settings.composition)?;
    let composer = Composer::new(settings.temp_dir(), settings.output_dir())?;

    Output::info(&format!("Composing {} clips", clips.len()));
    let spinner = Output::spinner("Rendering...");
    let output_path = composer.compose_files(&clip_paths, &composition).await?;
    spinner.finish_and_clear();

    Output::success(&format!("Video rendered to {}", output_path.display()));

    Ok(())
}
