//! Session options and the trace printer

use owo_colors::OwoColorize;
use std::io::Write;

/// Options fixed for the lifetime of one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Active profile, selects customization rules and plugin behaviour
    pub profile: Option<String>,
    /// Print `+ argv` lines for every executed command
    pub trace: bool,
    /// Colour trace lines
    pub color: bool,
}

impl SessionOptions {
    /// Set the active profile
    #[must_use]
    pub fn profile(mut self, profile: Option<impl Into<String>>) -> Self {
        self.profile = profile.map(Into::into);
        self
    }

    /// Enable or disable trace lines
    #[must_use]
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Enable or disable colours
    #[must_use]
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub(crate) fn tracer(&self) -> Tracer {
        Tracer {
            enabled: self.trace,
            color: self.color,
        }
    }
}

/// Prints trace lines on stderr
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracer {
    enabled: bool,
    color: bool,
}

impl Tracer {
    /// Trace a command about to run
    pub(crate) fn command(&self, argv: &[String]) {
        self.line(&argv.join(" "));
    }

    /// Trace a free-form line
    pub(crate) fn line(&self, text: &str) {
        tracing::debug!("+ {text}");
        if !self.enabled {
            return;
        }
        let line = format_line(text, self.color);
        // trace output is best effort
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }
}

fn format_line(text: &str, color: bool) -> String {
    let line = format!("+ {text}");
    if color {
        line.blue().bold().to_string()
    } else {
        line
    }
}
