//! Server configuration: YAML file with environment overrides.

pub mod settings;

pub use settings::{AppConfig, AuthSettings, PredictionSettings, ServerSettings, StorageSettings};
