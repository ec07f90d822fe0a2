//! Lifecycle targets and the deferred-target queue

use indexmap::IndexMap;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Parameter bag carried by a target
pub type Params = IndexMap<String, Value>;

/// Canonical lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKind {
    /// Acquire a dependency
    Get,
    /// Delete generated files
    Clean,
    /// Compile source code
    Compile,
    /// Run unit tests
    Test,
    /// Package compiled objects
    Package,
    /// Publish a package to a repository
    Publish,
    /// Install or uninstall locally, or provision an inventory
    Install,
    /// Install or uninstall in development mode
    Develop,
    /// Bump the project version
    Release,
    /// Drain the queue
    Flush,
}

impl TargetKind {
    /// Every kind, in lifecycle order
    pub const ALL: [TargetKind; 10] = [
        TargetKind::Get,
        TargetKind::Clean,
        TargetKind::Compile,
        TargetKind::Test,
        TargetKind::Package,
        TargetKind::Publish,
        TargetKind::Install,
        TargetKind::Develop,
        TargetKind::Release,
        TargetKind::Flush,
    ];

    /// Lowercase name of the target
    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Get => "get",
            TargetKind::Clean => "clean",
            TargetKind::Compile => "compile",
            TargetKind::Test => "test",
            TargetKind::Package => "package",
            TargetKind::Publish => "publish",
            TargetKind::Install => "install",
            TargetKind::Develop => "develop",
            TargetKind::Release => "release",
            TargetKind::Flush => "flush",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TargetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownTarget {
                name: s.to_string(),
            })
    }
}

/// One lifecycle request and its parameters
///
/// Equality is structural: two targets are equal when both the kind and the
/// parameters match.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Which lifecycle operation was requested
    pub kind: TargetKind,
    /// Parameters supplied by the caller
    pub params: Params,
}

impl Target {
    /// Create a target without parameters
    pub fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            params: Params::new(),
        }
    }

    /// Create a target with the given parameters
    pub fn with_params(kind: TargetKind, params: Params) -> Self {
        Self { kind, params }
    }

    /// Read a string parameter; absent and null read as `None`
    pub fn string(&self, key: &str) -> Option<&str> {
        string_param(&self.params, key)
    }

    /// Read a boolean parameter; absent reads as `false`
    pub fn flag(&self, key: &str) -> bool {
        flag_param(&self.params, key)
    }

    /// Requested requirement (`get`)
    pub fn requirement(&self) -> Option<&str> {
        self.string("requirement")
    }

    /// Requested scope (`clean`)
    pub fn scope(&self) -> Option<&str> {
        self.string("scope")
    }

    /// Requested format (`package`)
    pub fn format(&self) -> Option<&str> {
        self.string("format")
    }

    /// Target repository (`publish`)
    pub fn repository(&self) -> Option<&str> {
        self.string("repository")
    }

    /// Target inventory (`install`)
    pub fn inventory(&self) -> Option<&str> {
        self.string("inventory")
    }

    /// Whether this is the reverse operation (`install`, `develop`)
    pub fn uninstall(&self) -> bool {
        self.flag("uninstall")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (key, value) in &self.params {
            match value {
                Value::Null => {}
                Value::String(s) => write!(f, " {key}={s}")?,
                other => write!(f, " {key}={other}")?,
            }
        }
        Ok(())
    }
}

/// Read a string parameter from a parameter bag
///
/// Empty strings read as `None` so that `clean:` and `clean` are equivalent.
pub fn string_param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Read a boolean parameter from a parameter bag
pub fn flag_param(params: &Params, key: &str) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Shared handle to the pending targets of one session
///
/// Cloning the handle does not copy the queue: the session, the running
/// handler and the interpreter all observe the same entries.
#[derive(Debug, Clone, Default)]
pub struct TargetQueue {
    inner: Rc<RefCell<VecDeque<Target>>>,
}

impl TargetQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a target
    pub fn push(&self, target: Target) {
        self.inner.borrow_mut().push_back(target);
    }

    /// Append a parameterless target
    pub fn push_kind(&self, kind: TargetKind) {
        self.push(Target::new(kind));
    }

    /// Remove and return the oldest target
    pub fn pop_front(&self) -> Option<Target> {
        self.inner.borrow_mut().pop_front()
    }

    /// Remove every target, oldest first
    pub fn drain(&self) -> Vec<Target> {
        self.inner.borrow_mut().drain(..).collect()
    }

    /// Number of pending targets
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Whether no target is pending
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Copy of the pending targets
    pub fn snapshot(&self) -> Vec<Target> {
        self.inner.borrow().iter().cloned().collect()
    }

    /// Names of the pending targets, oldest first
    pub fn names(&self) -> Vec<&'static str> {
        self.inner.borrow().iter().map(|t| t.kind.as_str()).collect()
    }
}
