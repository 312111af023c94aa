//! CLI module for Klipp.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Klipp - Semantic Video Clipping
///
/// A CLI tool that matches transcript segments against a marketing taxonomy,
/// cuts the matching moments out of their source videos, and composes them
/// into a single video. The name "Klipp" comes from the Norwegian word
/// for "cut."
#[derive(Parser, Debug)]
#[command(name = "klipp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Klipp and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Match segments against a taxonomy and write an analysis report
    Analyze {
        /// Path to a JSON file of transcript segments
        segments: String,

        /// Path to a JSON taxonomy file (defaults from config if omitted)
        #[arg(short, long)]
        taxonomy: Option<String>,

        /// Minimum similarity score (0.0-1.0)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Run the full pipeline: match, extract clips, compose
    Run {
        /// Path to a JSON file of transcript segments
        segments: String,

        /// Path to a JSON taxonomy file (defaults from config if omitted)
        #[arg(short, long)]
        taxonomy: Option<String>,

        /// Minimum similarity score (0.0-1.0)
        #[arg(long)]
        threshold: Option<f32>,

        /// Transition type (fade, slide, zoom, none)
        #[arg(long)]
        transition: Option<String>,

        /// Transition duration in seconds (defaults per transition type)
        #[arg(long)]
        transition_duration: Option<f64>,

        /// Slogan text for the end-card (omit for no end-card)
        #[arg(short, long)]
        slogan: Option<String>,

        /// Output file name
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compose existing clip files into a single video
    Compose {
        /// Clip files, in timeline order
        clips: Vec<String>,

        /// Transition type (fade, slide, zoom, none)
        #[arg(long)]
        transition: Option<String>,

        /// Transition duration in seconds (defaults per transition type)
        #[arg(long)]
        transition_duration: Option<f64>,

        /// Slogan text for the end-card (omit for no end-card)
        #[arg(short, long)]
        slogan: Option<String>,

        /// Output file name
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
