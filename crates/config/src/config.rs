//! Configuration management
//!
//! This module handles loading and saving buildstack configuration.

use crate::Result;
use crate::customization::Customizations;
use crate::dirs::{default_config_file, legacy_customization_file};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// General configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Profile used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Enable colored trace output
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            profile: None,
            color: default_color(),
        }
    }
}

fn default_color() -> bool {
    true
}

/// Buildstack configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// General configuration section
    #[serde(default)]
    pub general: GeneralConfig,

    /// Command customization rules
    #[serde(default, skip_serializing_if = "Customizations::is_empty")]
    pub customize: Customizations,
}

impl Config {
    /// Load configuration from a file
    ///
    /// Files ending in `.json` are read as the legacy customization document,
    /// anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsing fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            buildstack_core::Error::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        if path.extension().is_some_and(|ext| ext == "json") {
            let customize = serde_json::from_str(&content).map_err(|e| {
                buildstack_core::Error::Config(format!(
                    "Failed to parse config file {}: {e}",
                    path.display()
                ))
            })?;
            return Ok(Self {
                general: GeneralConfig::default(),
                customize,
            });
        }

        toml::from_str(&content).map_err(|e| {
            buildstack_core::Error::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Load configuration from TOML string
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing fails
    pub fn from_toml_str(toml_content: &str) -> Result<Self> {
        toml::from_str(toml_content).map_err(|e| {
            buildstack_core::Error::Config(format!("Failed to parse config TOML: {e}"))
        })
    }

    /// Locate and load the user configuration
    ///
    /// An explicit path must exist. Otherwise the XDG config file is used,
    /// then the legacy `~/build.json`, then the defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the selected file cannot be read or parsed
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "Loading explicit config file");
            return Self::load(path);
        }

        let candidates = [default_config_file(), legacy_customization_file()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load(&path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// The active profile: the command-line value wins over the config file
    pub fn profile<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested.or(self.general.profile.as_deref())
    }
}
