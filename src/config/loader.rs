use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::{AnalyzerSettings, Config, Options};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV_VAR: &str = "RSMYSTEM_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// `$RSMYSTEM_CONFIG` wins when set. Otherwise uses
    /// `~/.config/rsmystem/config.toml` on Unix, or the platform equivalent
    /// via `dirs::config_dir()`, falling back to the current directory.
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("rsmystem").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `Config::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(&path)
    }

    /// Loads, parses and validates the config file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyzer.validate()?;
        self.options.validate()
    }
}

impl AnalyzerSettings {
    /// Rejects a zero response timeout, which would fail every multi-chunk
    /// response.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "response_timeout_seconds must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Options {
    /// Checks that a configured fixlist exists.
    ///
    /// Flag combinations the analyzer ignores (`-g` without `-i`, `-s`
    /// without `-c`) are logged, not rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(fixlist) = &self.fixlist {
            if !fixlist.is_file() {
                return Err(ConfigError::ValidationError {
                    message: format!("fixlist '{}' is not a file", fixlist.display()),
                });
            }
        }
        if self.glue_grammar_info && !self.grammar_info {
            tracing::debug!("glue_grammar_info has no effect without grammar_info");
        }
        if self.end_of_sentence && !self.entire_input {
            tracing::warn!("end_of_sentence has no effect without entire_input");
        }
        Ok(())
    }
}
