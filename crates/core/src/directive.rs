//! The directive language handlers speak to the interpreter
//!
//! A handler never executes anything itself. It returns a lazy
//! [`Directives`] stream and the interpreter performs each directive in
//! order, so a directive computed after a `Flush` sees the state the flush
//! left behind.

use std::fmt;
use std::iter;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// One unit of work yielded by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Run a command; failure aborts the run
    Command(Vec<String>),
    /// Ask the interpreter for a side effect other than a plain command
    Control(Control),
    /// Abort with a plugin-reported error
    Failure(String),
}

/// Interpreter-level operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Drain the queue through the plugin's flush handler
    Flush,
    /// Emit a diagnostic line
    Trace(Vec<String>),
    /// Delete a file or directory if present
    Remove { path: PathBuf, reason: String },
    /// Run a command, tolerating failure of the primary command
    Try(Vec<String>),
    /// Delete every untracked file through the VCS
    Purge,
    /// Commit every change through the VCS
    Commit { message: String },
    /// Tag the current revision through the VCS
    Tag { name: String },
}

impl Control {
    /// Build a control from its textual token and arguments
    ///
    /// Tokens may carry a leading `@`. An unknown token or a wrong number of
    /// arguments is a plugin defect.
    pub fn from_token<S: AsRef<str>>(token: &str, args: &[S]) -> Result<Self> {
        let args: Vec<String> = args.iter().map(|s| s.as_ref().to_string()).collect();
        let name = token.strip_prefix('@').unwrap_or(token);
        let arity = |expected: usize| -> Result<()> {
            if args.len() == expected {
                Ok(())
            } else {
                Err(Error::Internal(format!(
                    "@{name}: expected {expected} argument(s), got {}",
                    args.len()
                )))
            }
        };

        match name {
            "flush" => {
                arity(0)?;
                Ok(Control::Flush)
            }
            "trace" => Ok(Control::Trace(args)),
            "remove" => {
                arity(2)?;
                let mut args = args.into_iter();
                let path = args.next().map(PathBuf::from).unwrap_or_default();
                let reason = args.next().unwrap_or_default();
                Ok(Control::Remove { path, reason })
            }
            "try" => {
                if args.is_empty() {
                    return Err(Error::Internal("@try: missing command".to_string()));
                }
                Ok(Control::Try(args))
            }
            "purge" => {
                arity(0)?;
                Ok(Control::Purge)
            }
            "commit" => {
                arity(1)?;
                Ok(Control::Commit {
                    message: args.into_iter().next().unwrap_or_default(),
                })
            }
            "tag" => {
                arity(1)?;
                Ok(Control::Tag {
                    name: args.into_iter().next().unwrap_or_default(),
                })
            }
            other => Err(Error::Internal(format!("@{other}: unknown control token"))),
        }
    }
}

impl Directive {
    /// Run a command
    pub fn command<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Directive::Command(argv.into_iter().map(Into::into).collect())
    }

    /// Run a command, tolerating its failure
    pub fn try_command<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Directive::Control(Control::Try(argv.into_iter().map(Into::into).collect()))
    }

    /// Drain the queue
    pub fn flush() -> Self {
        Directive::Control(Control::Flush)
    }

    /// Emit a diagnostic line
    pub fn trace(message: impl Into<String>) -> Self {
        Directive::Control(Control::Trace(vec![message.into()]))
    }

    /// Delete a path, explaining why
    pub fn remove(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Directive::Control(Control::Remove {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// Report a failure
    pub fn failure(message: impl Into<String>) -> Self {
        Directive::Failure(message.into())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Command(argv) => write!(f, "{}", argv.join(" ")),
            Directive::Control(control) => match control {
                Control::Flush => write!(f, "@flush"),
                Control::Trace(words) => write!(f, "@trace {}", words.join(" ")),
                Control::Remove { path, reason } => {
                    write!(f, "@remove {} ({reason})", path.display())
                }
                Control::Try(argv) => write!(f, "@try {}", argv.join(" ")),
                Control::Purge => write!(f, "@purge"),
                Control::Commit { message } => write!(f, "@commit {message}"),
                Control::Tag { name } => write!(f, "@tag {name}"),
            },
            Directive::Failure(message) => write!(f, "failure: {message}"),
        }
    }
}

/// Lazy stream of directives returned by a handler
pub struct Directives {
    inner: Box<dyn Iterator<Item = Directive>>,
}

impl Directives {
    /// A stream yielding nothing
    pub fn empty() -> Self {
        Self {
            inner: Box::new(iter::empty()),
        }
    }

    /// Wrap any iterator of directives
    pub fn from_iter_lazy<I>(iter: I) -> Self
    where
        I: Iterator<Item = Directive> + 'static,
    {
        Self {
            inner: Box::new(iter),
        }
    }

    /// Append directives computed only once the interpreter reaches them
    #[must_use]
    pub fn then<F>(self, continuation: F) -> Self
    where
        F: FnOnce() -> Vec<Directive> + 'static,
    {
        Self {
            inner: Box::new(self.inner.chain(iter::once_with(continuation).flatten())),
        }
    }

    /// Append a directive
    #[must_use]
    pub fn and(self, directive: Directive) -> Self {
        Self {
            inner: Box::new(self.inner.chain(iter::once(directive))),
        }
    }
}

impl Default for Directives {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Directives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directives").finish_non_exhaustive()
    }
}

impl Iterator for Directives {
    type Item = Directive;

    fn next(&mut self) -> Option<Directive> {
        self.inner.next()
    }
}

impl From<Vec<Directive>> for Directives {
    fn from(directives: Vec<Directive>) -> Self {
        Self::from_iter_lazy(directives.into_iter())
    }
}

impl From<Directive> for Directives {
    fn from(directive: Directive) -> Self {
        Self::from_iter_lazy(iter::once(directive))
    }
}

impl FromIterator<Directive> for Directives {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}
