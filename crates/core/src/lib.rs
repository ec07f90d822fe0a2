//! Core types for buildstack
//!
//! This is the foundation crate that every other buildstack crate depends on.
//! It provides:
//! - Lifecycle targets and the shared target queue
//! - The directive language handlers speak to the interpreter
//! - The plugin contract (handler slots, invocation record)
//! - The shared error type and its classification
//!
//! This crate has no dependencies on other buildstack crates.

pub mod directive;
pub mod error;
pub mod plugin;
pub mod target;

pub use directive::{Control, Directive, Directives};
pub use error::{Error, ErrorKind, Result};
pub use plugin::{Handler, HandlerFn, HandlerSlot, Invocation, Plugin};
pub use target::{Params, Target, TargetKind, TargetQueue};
