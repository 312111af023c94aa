//! Klipp - Semantic Video Clipping
//!
//! A CLI tool that turns transcribed video footage into a short composed
//! marketing video.
//!
//! The name "Klipp" comes from the Norwegian word for "cut."
//!
//! # Overview
//!
//! Klipp allows you to:
//! - Match transcript segments against a two-level topic taxonomy using
//!   cosine similarity over text embeddings
//! - Cut the matching time ranges out of local or remote source videos
//! - Compose the clips, with positional fades and an optional slogan
//!   end-card, into a single output video
//! - Write a JSON analysis report of what matched and why
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `taxonomy` - Taxonomy model and embedding cache
//! - `segment` - Transcript segment model and loading
//! - `embedding` - Embedding generation
//! - `matcher` - Segment-to-taxonomy matching
//! - `fetch` - Source video fetching (local files, HTTP downloads)
//! - `clip` - Clip extraction with range clamping
//! - `compose` - Composition and rendering
//! - `report` - Analysis report
//! - `pipeline` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use klipp::compose::CompositionSettings;
//! use klipp::config::Settings;
//! use klipp::pipeline::Pipeline;
//! use klipp::segment::Segment;
//! use klipp::taxonomy::Taxonomy;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let composition = CompositionSettings::from_defaults(&settings.composition)?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let taxonomy = Taxonomy::new(
//!         "Brand awareness",
//!         vec!["Durability".to_string(), "Price".to_string()],
//!     )?;
//!     let segments = vec![Segment::new(
//!         12.0,
//!         19.5,
//!         "it survives a two meter drop",
//!         "footage/review.mp4",
//!     )?];
//!
//!     let result = pipeline.run(&taxonomy, segments, &composition).await?;
//!     println!("Rendered {}", result.output_video.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod clip;
pub mod compose;
pub mod config;
pub mod embedding;
pub mod error;
pub mod fetch;
pub mod ffmpeg;
pub mod matcher;
pub mod pipeline;
pub mod report;
pub mod segment;
pub mod taxonomy;

pub use error::{KlippError, Result};
