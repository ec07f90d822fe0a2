//! XDG directory utilities
//!
//! - `XDG_CONFIG_HOME` defaults to ~/.config
//! - the legacy customization file lives at ~/build.json

use std::path::PathBuf;
use xdg::BaseDirectories;

/// Get the buildstack config directory
///
/// Returns `$XDG_CONFIG_HOME/buildstack` or `~/.config/buildstack`
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    BaseDirectories::with_prefix("buildstack").get_config_home()
}

/// Get the default config file path
///
/// Returns `$XDG_CONFIG_HOME/buildstack/config.toml`
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Get the legacy JSON customization file path
///
/// Returns `~/build.json`
#[must_use]
pub fn legacy_customization_file() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join("build.json"))
}
