//! # Buildstack Engine
//!
//! Drives a detected build toolchain through the canonical lifecycle.
//!
//! - **Resolver**: picks the one plugin whose manifest governs a directory
//! - **Session**: owns the target queue and dispatches lifecycle operations
//! - **Interpreter**: performs the directives produced by plugin handlers
//! - **Executor**: runs commands through the customization overlay
//! - **VCS**: purge, commit and tag through the detected version control

pub mod executor;
mod interpreter;
pub mod options;
pub mod resolver;
pub mod session;
pub mod vcs;

// Re-export error types from core
pub use buildstack_core::{Error, Result};

// Re-export commonly used types
pub use executor::{CommandRunner, FailureMode};
pub use options::SessionOptions;
pub use resolver::{Resolution, resolve};
pub use session::{BuildStack, DefaultPolicy};
pub use vcs::{VcsOperation, VcsProvider};
