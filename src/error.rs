//! Error types for Klipp.

use thiserror::Error;

/// Library-level error type for Klipp operations.
#[derive(Error, Debug)]
pub enum KlippError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding backend failed: {0}")]
    EmbeddingBackend(String),

    #[error("No taxonomy embeddings available; build the taxonomy cache before matching")]
    NoTaxonomy,

    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Clip extraction failed: {0}")]
    ClipExtraction(String),

    #[error("Composition failed: {0}")]
    Composition(String),

    #[error("No segments provided for composition")]
    NoSegments,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl KlippError {
    /// Whether this error is local to a single segment.
    ///
    /// Local errors (a failed download, a bad source file) are logged and the
    /// segment is skipped; everything else aborts the pipeline run.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            KlippError::Download(_) | KlippError::ClipExtraction(_) | KlippError::Http(_)
        )
    }
}

/// Result type alias for Klipp operations.
pub type Result<T> = std::result::Result<T, KlippError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_vs_fatal_classification() {
        assert!(KlippError::Download("timeout".into()).is_local());
        assert!(KlippError::ClipExtraction("no such file".into()).is_local());

        assert!(!KlippError::NoTaxonomy.is_local());
        assert!(!KlippError::EmbeddingBackend("down".into()).is_local());
        assert!(!KlippError::Composition("render".into()).is_local());
        assert!(!KlippError::NoSegments.is_local());
    }
}
