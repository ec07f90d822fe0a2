//! buildstack CLI library
//!
//! Argument parsing and the top-level run loop for the `bs` binary. The
//! library form keeps the logic reachable from integration tests.

pub mod request;

use anyhow::{Context, Result};
use buildstack_config::Config;
use buildstack_core::Plugin;
use buildstack_engine::{BuildStack, SessionOptions};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;

pub use request::{RequestError, TargetRequest};

/// buildstack - one front end for many build systems
#[derive(Parser, Debug)]
#[command(name = "bs")]
#[command(about = "Drive the project's native build system with uniform targets")]
#[command(version)]
#[command(long_about = "Drive the project's native build system with uniform targets

The build stack is detected from the manifest found in the working directory
(Makefile, configure.ac, Cargo.toml, package.json, pom.xml, setup.py,
playbook.yml, meta/main.yml). Targets are dispatched in order and queued work is merged
into as few tool invocations as possible.

Targets:
  get:<id>  clean[:<scope>]  compile  test  package[:<format>]
  publish[:<repository>]  install[:<inventory>]  uninstall[:<inventory>]
  develop  undevelop  release[:<kind>]")]
pub struct Cli {
    /// Targets to run, in order
    #[arg(value_name = "TARGET", required_unless_present = "list_stacks")]
    pub targets: Vec<String>,

    /// Change to this directory before doing anything
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Use this manifest instead of detecting one
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Customization profile to activate
    #[arg(short, long, env = "BUILDSTACK_PROFILE", value_name = "ID")]
    pub profile: Option<String>,

    /// Message used by the release target
    #[arg(short, long, value_name = "TEXT")]
    pub message: Option<String>,

    /// Disable coloured trace output
    #[arg(short = 'c', long)]
    pub no_colors: bool,

    /// Print every command before running it
    #[arg(short, long)]
    pub trace: bool,

    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "BUILDSTACK_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, env = "BUILDSTACK_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List the supported build stacks and exit
    #[arg(long)]
    pub list_stacks: bool,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    buildstack_config::logging::init(cli.verbose, cli.log_file.as_deref())?;

    let plugins = buildstack_stacks::registry();
    if cli.list_stacks {
        list_stacks(&plugins, !cli.no_colors);
        return Ok(());
    }

    // Reject bad specs before anything runs
    let requests = request::parse_all(&cli.targets)?;

    let config = Config::discover(cli.config.as_deref())?;

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change directory to {}", dir.display()))?;
    }

    let options = SessionOptions::default()
        .profile(config.profile(cli.profile.as_deref()))
        .trace(cli.trace)
        .color(config.general.color && !cli.no_colors);

    let location = cli.file.unwrap_or_else(|| PathBuf::from("."));
    let stack = BuildStack::open(&location, &plugins, options, config.customize)?;
    tracing::debug!(
        plugin = stack.plugin().name(),
        manifest = %stack.manifest().display(),
        work_dir = %stack.work_dir().display(),
        "session opened"
    );

    for request in &requests {
        tracing::debug!(target_spec = %request, "dispatching");
        request.apply(&stack, cli.message.as_deref())?;
    }
    stack.flush()?;

    Ok(())
}

fn list_stacks(plugins: &[Arc<Plugin>], color: bool) {
    for plugin in plugins {
        let patterns = plugin.patterns().join(", ");
        if color {
            println!("{:<12} {}", plugin.name().bold(), patterns.dimmed());
        } else {
            println!("{:<12} {}", plugin.name(), patterns);
        }
    }
}
