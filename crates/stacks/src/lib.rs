//! Build-stack plugins
//!
//! Each module describes one toolchain family: the manifest file names that
//! identify it and how lifecycle targets map onto its commands. Plugins are
//! registered in a fixed order by [`registry`].

use buildstack_core::{Directive, Directives, Plugin, Target, TargetQueue};
use std::sync::Arc;

#[cfg(feature = "make")]
pub mod make;

#[cfg(feature = "make")]
mod autotools;

#[cfg(feature = "cargo")]
pub mod cargo;

#[cfg(feature = "npm")]
pub mod npm;

#[cfg(feature = "maven")]
pub mod maven;

#[cfg(feature = "setuptools")]
pub mod setuptools;

#[cfg(feature = "ansible")]
pub mod ansible;

#[cfg(feature = "arb")]
pub mod arb;

/// Every enabled plugin, in registration order
pub fn registry() -> Vec<Arc<Plugin>> {
    let mut plugins = Vec::new();
    #[cfg(feature = "make")]
    plugins.push(Arc::new(make::plugin()));
    #[cfg(feature = "cargo")]
    plugins.push(Arc::new(cargo::plugin()));
    #[cfg(feature = "npm")]
    plugins.push(Arc::new(npm::plugin()));
    #[cfg(feature = "maven")]
    plugins.push(Arc::new(maven::plugin()));
    #[cfg(feature = "setuptools")]
    plugins.push(Arc::new(setuptools::plugin()));
    #[cfg(feature = "ansible")]
    plugins.push(Arc::new(ansible::plugin()));
    #[cfg(feature = "arb")]
    plugins.push(Arc::new(arb::plugin()));
    plugins
}

/// Owned argument vector from string slices
pub(crate) fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(ToString::to_string).collect()
}

/// Failure for a queued target the flush handler cannot map
pub(crate) fn unexpected(target: &Target) -> Directives {
    Directive::failure(format!("{}: unexpected target", target.kind)).into()
}

/// Re-queue the target being handled so the flush handler merges it
pub(crate) fn requeue(queue: &TargetQueue, target: Target) {
    tracing::debug!(deferred = %target, "Deferring target to flush");
    queue.push(target);
}
