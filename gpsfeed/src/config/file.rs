//! Configuration file loading.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::feed::FeedConfig;
use crate::stream::ClientConfig;

/// Errors that can occur when loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings loaded from `config.ini`.
///
/// Every key is optional; anything missing keeps its default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    /// `[feed]` and `[route]` sections.
    pub feed: FeedConfig,
    /// `[stream]` section.
    pub stream: ClientConfig,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.gpsfeed/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigFileError> {
        let ini =
            Ini::load_from_str(text).map_err(|e| ConfigFileError::ReadError(ini::Error::Parse(e)))?;
        super::parser::parse_ini(&ini)
    }

    pub fn feed_config(&self) -> FeedConfig {
        self.feed.clone()
    }

    pub fn client_config(&self) -> ClientConfig {
        self.stream.clone()
    }
}

/// Get the path to the config directory (~/.gpsfeed).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gpsfeed")
}

/// Get the path to the config file (~/.gpsfeed/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
