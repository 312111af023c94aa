//! Configuration management for Klipp.

mod settings;

pub use settings::{
    CompositionDefaults, EmbeddingSettings, ExtractionSettings, FetchSettings, GeneralSettings,
    MatchingSettings, Settings,
};
