//! The plugin contract
//!
//! A plugin describes one build toolchain: the manifest file names that
//! identify it and what to do for each lifecycle target.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::directive::Directives;
use crate::target::{Params, TargetKind, TargetQueue, flag_param, string_param};

/// Handler function signature
pub type HandlerFn = Arc<dyn Fn(&Invocation<'_>) -> Directives + Send + Sync>;

/// Everything a handler receives when it is invoked
#[derive(Debug)]
pub struct Invocation<'a> {
    /// Active profile, if any
    pub profile: Option<&'a str>,
    /// Manifest file name, relative to `work_dir`
    pub manifest: &'a Path,
    /// Directory commands run in
    pub work_dir: &'a Path,
    /// Shared queue of deferred targets
    pub queue: &'a TargetQueue,
    /// Parameters of the target being handled
    pub params: &'a Params,
}

impl Invocation<'_> {
    /// Read a string parameter of the target being handled
    pub fn string(&self, key: &str) -> Option<&str> {
        string_param(self.params, key)
    }

    /// Read a boolean parameter of the target being handled
    pub fn flag(&self, key: &str) -> bool {
        flag_param(self.params, key)
    }

    /// Manifest file name as a command argument
    pub fn manifest_arg(&self) -> String {
        self.manifest.to_string_lossy().into_owned()
    }
}

/// Declared behaviour for one target
#[derive(Clone)]
pub enum Handler {
    /// The target can never be reached with this toolchain
    Unsupported,
    /// Run this function
    Run(HandlerFn),
}

/// Result of looking up a target's handler
pub enum HandlerSlot<'a> {
    /// Nothing declared, the caller's default policy applies
    Unset,
    /// Explicitly unsupported
    Unsupported,
    /// A handler to invoke
    Run(&'a HandlerFn),
}

/// A registered build-stack plugin
pub struct Plugin {
    name: String,
    patterns: Vec<String>,
    handlers: HashMap<TargetKind, Handler>,
}

impl Plugin {
    /// Create a plugin with no handlers
    pub fn new<I, S>(name: impl Into<String>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a target
    #[must_use]
    pub fn on<F>(mut self, kind: TargetKind, handler: F) -> Self
    where
        F: Fn(&Invocation<'_>) -> Directives + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Handler::Run(Arc::new(handler)));
        self
    }

    /// Declare a target unsupported
    #[must_use]
    pub fn unsupported(mut self, kind: TargetKind) -> Self {
        self.handlers.insert(kind, Handler::Unsupported);
        self
    }

    /// Plugin name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Manifest file-name patterns, in priority order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Look up the declared behaviour for a target
    pub fn handler(&self, kind: TargetKind) -> HandlerSlot<'_> {
        match self.handlers.get(&kind) {
            None => HandlerSlot::Unset,
            Some(Handler::Unsupported) => HandlerSlot::Unsupported,
            Some(Handler::Run(f)) => HandlerSlot::Run(f),
        }
    }

    /// Targets with a handler or an explicit unsupported marker
    pub fn declared(&self) -> Vec<TargetKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .field("declared", &self.declared())
            .finish()
    }
}
