//! CLI command implementations.

mod analyze;
mod compose;
mod config;
mod doctor;
mod init;
mod run;

pub use analyze::run_analyze;
pub use compose::run_compose;
pub use config::run_config;
pub use doctor::run_doctor;
pub use init::run_init;
pub use run::{run_pipeline, ComposeOverrides};

use crate::config::Settings;
use crate::error::Result;
use crate::taxonomy::Taxonomy;
use std::path::Path;

/// Load the taxonomy from a file, or fall back to the configured default.
fn load_taxonomy(settings: &Settings, path: Option<&str>) -> Result<Taxonomy> {
    match path {
        Some(p) => Taxonomy::from_file(Path::new(p)),
        None => Taxonomy::new(
            settings.matching.default_level1.clone(),
            settings.matching.default_level2.clone(),
        ),
    }
}
