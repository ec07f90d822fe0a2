//! Logging configuration for the buildstack CLI
//!
//! Diagnostics go to stderr so that they never interleave with the output of
//! the build tools, which inherit stdout.

use crate::Result;
use std::path::Path;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| buildstack_core::Error::Config(format!("Invalid log filter: {e}")))
}

/// Filter directives for the workspace crates at the given level
fn default_directives(level: &str) -> String {
    [
        "buildstack",
        "buildstack_config",
        "buildstack_engine",
        "buildstack_stacks",
    ]
    .iter()
    .map(|target| format!("{target}={level}"))
    .collect::<Vec<_>>()
    .join(",")
}

/// Initialize the logging system
///
/// # Arguments
/// * `verbose` - Enable debug level logging
/// * `log_file` - Optional path to append logs to
///
/// Without `--verbose` only warnings are shown. `RUST_LOG` overrides both.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    // Allows overriding with RUST_LOG env var
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter(&default_directives(level))?,
    };

    let stderr_layer: BoxedLayer = if verbose {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .without_time() // No timestamps in normal mode
            .compact()
            .with_filter(env_filter)
            .boxed()
    };

    let mut layers: Vec<BoxedLayer> = vec![stderr_layer];
    if let Some(log_path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        layers.push(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .with_filter(filter("debug")?)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| buildstack_core::Error::Config(format!("Failed to initialize logging: {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_crates() {
        let directives = default_directives("debug");
        assert!(directives.contains("buildstack=debug"));
        assert!(directives.contains("buildstack_engine=debug"));
        assert!(filter(&directives).is_ok());
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let err = filter("buildstack=notalevel").unwrap_err();
        assert_eq!(err.kind(), buildstack_core::ErrorKind::Config);
    }
}
