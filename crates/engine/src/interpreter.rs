//! Directive interpreter
//!
//! Directives are performed strictly in order, each completing before the
//! next one is pulled from the handler's stream.

use crate::executor::FailureMode;
use crate::session::BuildStack;
use buildstack_core::{Control, Directive, Error, Result, TargetKind};
use std::fs;

impl BuildStack {
    /// Perform one directive produced by the handler of `kind`
    pub(crate) fn execute_directive(
        &self,
        directive: Directive,
        kind: TargetKind,
        can_flush: bool,
    ) -> Result<()> {
        let plugin = self.plugin.name();
        tracing::trace!(%directive, "Interpreting directive");

        match directive {
            Directive::Command(argv) => self
                .runner
                .run(&argv, FailureMode::Strict)
                .map_err(|e| e.in_target(plugin, kind.as_str())),
            Directive::Failure(message) => Err(Error::HandlerFailure {
                plugin: plugin.to_string(),
                target: kind.to_string(),
                message,
            }),
            Directive::Control(control) => self.execute_control(control, kind, can_flush),
        }
    }

    fn execute_control(&self, control: Control, kind: TargetKind, can_flush: bool) -> Result<()> {
        let plugin = self.plugin.name();

        match control {
            Control::Flush => {
                if !can_flush {
                    return Err(Error::Internal(format!(
                        "{plugin}: {kind}: cannot flush from this target"
                    )));
                }
                self.flush()
            }
            Control::Trace(words) => {
                self.tracer.line(&words.join(" "));
                Ok(())
            }
            Control::Remove { path, reason } => {
                let full = self.work_dir.join(&path);
                let Ok(metadata) = fs::symlink_metadata(&full) else {
                    return Ok(());
                };
                self.tracer
                    .line(&format!("removing {}: {reason}", path.display()));
                let removed = if metadata.is_dir() {
                    fs::remove_dir_all(&full)
                } else {
                    fs::remove_file(&full)
                };
                removed.map_err(|e| Error::from(e).in_target(plugin, kind.as_str()))
            }
            Control::Try(argv) => self
                .runner
                .run(&argv, FailureMode::Tolerate)
                .map_err(|e| e.in_target(plugin, kind.as_str())),
            Control::Purge => self.run_vcs(self.vcs().purge(), kind),
            Control::Commit { message } => self.run_vcs(self.vcs().commit(&message), kind),
            Control::Tag { name } => self.run_vcs(self.vcs().tag(&name), kind),
        }
    }

    fn run_vcs(&self, argv: Result<Vec<String>>, kind: TargetKind) -> Result<()> {
        self.runner
            .run(&argv?, FailureMode::Strict)
            .map_err(|e| e.in_target(self.plugin.name(), kind.as_str()))
    }
}
