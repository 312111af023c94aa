//! Klipp CLI entry point.

use anyhow::Result;
use clap::Parser;
use klipp::cli::{commands, Cli, Commands};
use klipp::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("klipp={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directories exist
    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Analyze {
            segments,
            taxonomy,
            threshold,
        } => {
            commands::run_analyze(segments, taxonomy.as_deref(), *threshold, settings).await?;
        }

        Commands::Run {
            segments,
            taxonomy,
            threshold,
            transition,
            transition_duration,
            slogan,
            output,
        } => {
            let overrides = commands::ComposeOverrides {
                transition: transition.clone(),
                transition_duration: *transition_duration,
                slogan: slogan.clone(),
                output: output.clone(),
            };
            commands::run_pipeline(segments, taxonomy.as_deref(), *threshold, overrides, settings)
                .await?;
        }

        Commands::Compose {
            clips,
            transition,
            transition_duration,
            slogan,
            output,
        } => {
            let overrides = commands::ComposeOverrides {
                transition: transition.clone(),
                transition_duration: *transition_duration,
                slogan: slogan.clone(),
                output: output.clone(),
            };
            commands::run_compose(clips, overrides, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
