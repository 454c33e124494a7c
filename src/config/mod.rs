//! Analyzer options and settings, optionally loaded from a TOML file.

mod loader;
mod types;

pub use loader::{ConfigError, CONFIG_ENV_VAR};
pub use types::{AnalyzerSettings, Config, Mode, Options};
