//! Configuration management for buildstack
//!
//! This crate handles:
//! - Configuration loading (TOML, with the legacy JSON customization file)
//! - Per-profile command customization rules
//! - XDG directory management
//! - Logging initialization

pub mod config;
pub mod customization;
pub mod dirs;
pub mod logging;

// Re-export error types from core
pub use buildstack_core::{Error, Result};

// Re-export main types
pub use config::{Config, GeneralConfig};
pub use customization::{CommandPlan, CommandRule, Customizations};
pub use dirs::{config_dir, default_config_file, legacy_customization_file};
