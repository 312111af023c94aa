//! Configuration settings for Klipp.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub matching: MatchingSettings,
    pub fetch: FetchSettings,
    pub extraction: ExtractionSettings,
    pub composition: CompositionDefaults,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (clips, output videos, reports).
    pub data_dir: String,
    /// Directory for temporary files (downloads, intermediate renders).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.klipp".to_string(),
            temp_dir: "/tmp/klipp".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai).
    pub provider: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Segment matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Minimum cosine similarity for a segment to be kept (0.0-1.0).
    pub threshold: f32,
    /// Default top-level taxonomy label when no taxonomy file is given.
    pub default_level1: String,
    /// Default second-level taxonomy node names.
    pub default_level2: Vec<String>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            default_level1: "Brand awareness".to_string(),
            default_level2: vec!["Product features".to_string(), "User needs".to_string()],
        }
    }
}

/// Remote source fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Connect timeout for remote downloads (seconds).
    pub connect_timeout_seconds: u64,
    /// Read timeout between received chunks (seconds).
    pub read_timeout_seconds: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 10,
            read_timeout_seconds: 30,
        }
    }
}

/// Clip extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Maximum concurrent download+extract workers.
    pub max_concurrent: usize,
    /// Burn the matched dimension path into each clip as a label overlay.
    pub label_clips: bool,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            label_clips: true,
        }
    }
}

/// Default composition settings, overridable per run from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionDefaults {
    /// Transition type (fade, slide, zoom, none).
    pub transition: String,
    /// Transition duration in seconds. None = the type's own default.
    pub transition_duration: Option<f64>,
    /// Optional end-card slogan text.
    pub slogan: Option<String>,
    /// Target output width in pixels.
    pub width: u32,
    /// Target output height in pixels.
    pub height: u32,
    /// Target output frame rate.
    pub fps: u32,
    /// Output file name (placed in the output directory).
    pub output_name: String,
}

impl Default for CompositionDefaults {
    fn default() -> Self {
        Self {
            transition: "fade".to_string(),
            transition_duration: None,
            slogan: None,
            width: 1280,
            height: 720,
            fps: 30,
            output_name: "final_video.mp4".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::KlippError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("klipp")
            .join("config.toml")
    }

    /// Reject values that would silently break a run later.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.matching.threshold) {
            return Err(crate::error::KlippError::Config(format!(
                "matching.threshold must be in [0.0, 1.0], got {}",
                self.matching.threshold
            )));
        }
        if self.composition.width == 0 || self.composition.height == 0 {
            return Err(crate::error::KlippError::Config(
                "composition resolution must be non-zero".to_string(),
            ));
        }
        if self.composition.fps == 0 {
            return Err(crate::error::KlippError::Config(
                "composition.fps must be non-zero".to_string(),
            ));
        }
        if self.extraction.max_concurrent == 0 {
            return Err(crate::error::KlippError::Config(
                "extraction.max_concurrent must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Directory where extracted clips are written.
    pub fn clips_dir(&self) -> PathBuf {
        self.data_dir().join("clips")
    }

    /// Directory where composed videos and analysis reports are written.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir().join("output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.matching.threshold, 0.7);
        assert_eq!(settings.embedding.dimensions, 1536);
        assert_eq!(settings.composition.width, 1280);
        assert_eq!(settings.composition.height, 720);
        assert_eq!(settings.composition.fps, 30);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
            [matching]
            threshold = 0.5
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.matching.threshold, 0.5);
        // Untouched sections fall back to defaults
        assert_eq!(settings.embedding.model, "text-embedding-3-small");
        assert_eq!(settings.composition.output_name, "final_video.mp4");
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut settings = Settings::default();
        settings.matching.threshold = 1.5;
        assert!(settings.validate().is_err());

        settings.matching.threshold = -0.1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_resolution() {
        let mut settings = Settings::default();
        settings.composition.width = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_clips_dir_under_data_dir() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/var/klipp".to_string();
        assert_eq!(settings.clips_dir(), PathBuf::from("/var/klipp/clips"));
        assert_eq!(settings.output_dir(), PathBuf::from("/var/klipp/output"));
    }
}
