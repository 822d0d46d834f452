// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Application settings read from `padmap.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::ConfigError;

/// Default settings file name, looked up in the working directory
pub const SETTINGS_FILE: &str = "padmap.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Directory holding the default, scratch and named records
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Client name registered with the MIDI system
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("configs")
}
fn default_client_name() -> String {
    "padmap".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            client_name: default_client_name(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Settings(e.to_string()))?;
        settings.level()?;
        Ok(settings)
    }

    /// Load settings from `path`; a missing file yields the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// The configured log level
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log_level.trim())
            .map_err(|_| ConfigError::Settings(format!("unknown log level '{}'", self.log_level)))
    }
}
