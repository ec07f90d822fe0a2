//! Build-stack session and target dispatcher
//!
//! A [`BuildStack`] is bound to one resolved plugin and one working
//! directory. Every lifecycle operation funnels through
//! [`BuildStack::dispatch`], which either queues the target, rejects it, or
//! runs the plugin's handler through the interpreter.

use crate::executor::{CommandRunner, FailureMode};
use crate::options::{SessionOptions, Tracer};
use crate::resolver::{Resolution, resolve};
use crate::vcs::{self, VcsProvider};
use buildstack_config::Customizations;
use buildstack_core::{
    Error, HandlerSlot, Invocation, Params, Plugin, Result, Target, TargetKind, TargetQueue,
};
use serde_json::Value;
use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happens to a target the plugin declares nothing for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPolicy {
    /// Append it to the queue for the flush handler
    Queue,
    /// Report it as unhandled
    Fail,
}

/// One build session
#[derive(Debug)]
pub struct BuildStack {
    pub(crate) plugin: Arc<Plugin>,
    pub(crate) manifest: PathBuf,
    pub(crate) work_dir: PathBuf,
    pub(crate) queue: TargetQueue,
    pub(crate) runner: CommandRunner,
    pub(crate) tracer: Tracer,
    pub(crate) vcs: OnceCell<Box<dyn VcsProvider>>,
    options: SessionOptions,
}

fn params<const N: usize>(entries: [(&str, Value); N]) -> Params {
    entries
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn opt(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

impl BuildStack {
    /// Resolve the plugin for `location` and open a session on it
    pub fn open(
        location: &Path,
        plugins: &[Arc<Plugin>],
        options: SessionOptions,
        customizations: Customizations,
    ) -> Result<Self> {
        let resolution = resolve(location, plugins)?;
        Ok(Self::from_resolution(resolution, options, customizations))
    }

    /// Open a session on an already resolved plugin
    pub fn from_resolution(
        resolution: Resolution,
        options: SessionOptions,
        customizations: Customizations,
    ) -> Self {
        let tracer = options.tracer();
        tracer.line(&format!("using '{}' build stack", resolution.plugin.name()));

        let runner = CommandRunner::builder(&resolution.work_dir)
            .customizations(customizations)
            .profile(options.profile.clone())
            .tracer(tracer)
            .build();

        Self {
            plugin: resolution.plugin,
            manifest: resolution.manifest,
            work_dir: resolution.work_dir,
            queue: TargetQueue::new(),
            runner,
            tracer,
            vcs: OnceCell::new(),
            options,
        }
    }

    /// The resolved plugin
    pub fn plugin(&self) -> &Plugin {
        &self.plugin
    }

    /// Manifest path relative to the working directory
    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Directory every command runs in
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Pending targets
    pub fn queue(&self) -> &TargetQueue {
        &self.queue
    }

    /// Options the session was opened with
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The version-control system of the working tree, detected once
    pub(crate) fn vcs(&self) -> &dyn VcsProvider {
        self.vcs.get_or_init(|| vcs::detect(&self.work_dir)).as_ref()
    }

    /// Acquire a dependency
    pub fn get(&self, requirement: &str) -> Result<()> {
        self.dispatch(
            TargetKind::Get,
            params([("requirement", Value::String(requirement.to_string()))]),
            true,
            DefaultPolicy::Fail,
        )
    }

    /// Delete generated files, optionally within a scope
    ///
    /// The `untracked` scope drains the queue and then asks the VCS to
    /// delete every untracked file, without involving the plugin.
    pub fn clean(&self, scope: Option<&str>) -> Result<()> {
        if scope == Some("untracked") {
            self.tracer.line("removing untracked files");
            self.flush()?;
            let argv = self.vcs().purge()?;
            return self
                .runner
                .run(&argv, FailureMode::Strict)
                .map_err(|e| e.in_target(self.plugin.name(), TargetKind::Clean.as_str()));
        }

        self.dispatch(
            TargetKind::Clean,
            params([("scope", opt(scope))]),
            true,
            DefaultPolicy::Queue,
        )
    }

    /// Compile source code
    pub fn compile(&self) -> Result<()> {
        self.dispatch(TargetKind::Compile, Params::new(), true, DefaultPolicy::Queue)
    }

    /// Run unit tests
    pub fn test(&self) -> Result<()> {
        self.dispatch(TargetKind::Test, Params::new(), true, DefaultPolicy::Queue)
    }

    /// Package compiled objects, optionally in a given format
    pub fn package(&self, format: Option<&str>) -> Result<()> {
        self.dispatch(
            TargetKind::Package,
            params([("format", opt(format))]),
            true,
            DefaultPolicy::Queue,
        )
    }

    /// Publish the package, optionally to a given repository
    pub fn publish(&self, repository: Option<&str>) -> Result<()> {
        self.dispatch(
            TargetKind::Publish,
            params([("repository", opt(repository))]),
            true,
            DefaultPolicy::Queue,
        )
    }

    /// Install or uninstall locally, or provision an inventory
    pub fn install(&self, inventory: Option<&str>, uninstall: bool) -> Result<()> {
        self.dispatch(
            TargetKind::Install,
            params([("inventory", opt(inventory)), ("uninstall", Value::Bool(uninstall))]),
            true,
            DefaultPolicy::Queue,
        )
    }

    /// Install or uninstall in development mode
    pub fn develop(&self, uninstall: bool) -> Result<()> {
        self.dispatch(
            TargetKind::Develop,
            params([("uninstall", Value::Bool(uninstall))]),
            true,
            DefaultPolicy::Queue,
        )
    }

    /// Bump the project version
    pub fn release(&self, kind: Option<&str>, message: Option<&str>) -> Result<()> {
        self.dispatch(
            TargetKind::Release,
            params([("kind", opt(kind)), ("message", opt(message))]),
            true,
            DefaultPolicy::Fail,
        )
    }

    /// Drain the queue through the plugin's flush handler
    ///
    /// The queue must be empty afterwards.
    pub fn flush(&self) -> Result<()> {
        self.dispatch(TargetKind::Flush, Params::new(), false, DefaultPolicy::Fail)?;

        if self.queue.is_empty() {
            Ok(())
        } else {
            Err(Error::Internal(format!(
                "{}: lingering unhandled target(s): {}",
                self.plugin.name(),
                self.queue.names().join(", ")
            )))
        }
    }

    /// Apply the plugin's declared behaviour for one target
    #[tracing::instrument(skip_all, fields(plugin = %self.plugin.name(), kind = %kind))]
    pub fn dispatch(
        &self,
        kind: TargetKind,
        params: Params,
        can_flush: bool,
        policy: DefaultPolicy,
    ) -> Result<()> {
        let handler = match self.plugin.handler(kind) {
            HandlerSlot::Unset => {
                return match policy {
                    DefaultPolicy::Queue => {
                        tracing::debug!("No handler, queueing target");
                        self.queue.push(Target::with_params(kind, params));
                        Ok(())
                    }
                    DefaultPolicy::Fail => Err(Error::UnhandledTarget {
                        plugin: self.plugin.name().to_string(),
                        target: kind.to_string(),
                    }),
                };
            }
            HandlerSlot::Unsupported => {
                return Err(Error::UnsupportedTarget {
                    plugin: self.plugin.name().to_string(),
                    target: kind.to_string(),
                });
            }
            HandlerSlot::Run(handler) => Arc::clone(handler),
        };

        tracing::debug!("Invoking handler");
        let invocation = Invocation {
            profile: self.options.profile.as_deref(),
            manifest: &self.manifest,
            work_dir: &self.work_dir,
            queue: &self.queue,
            params: &params,
        };

        for directive in handler(&invocation) {
            self.execute_directive(directive, kind, can_flush)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use buildstack_core::{Directive, Directives, ErrorKind};
    use tempfile::TempDir;

    fn session(plugin: Plugin) -> (TempDir, BuildStack) {
        let temp = TempDir::new().unwrap();
        let resolution = Resolution {
            plugin: Arc::new(plugin),
            manifest: PathBuf::from("Foobuild"),
            work_dir: temp.path().to_path_buf(),
        };
        let stack = BuildStack::from_resolution(
            resolution,
            SessionOptions::default(),
            Customizations::default(),
        );
        (temp, stack)
    }

    fn draining(name: &str) -> Plugin {
        Plugin::new(name, ["Foobuild"]).on(TargetKind::Flush, |inv| {
            inv.queue.drain();
            Directives::empty()
        })
    }

    #[test]
    fn test_unset_target_is_queued_without_side_effect() {
        let (temp, stack) = session(draining("foo"));

        stack.compile().unwrap();

        assert_eq!(stack.queue().snapshot(), vec![Target::new(TargetKind::Compile)]);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_queued_params_omit_absent_values() {
        let (_temp, stack) = session(draining("foo"));

        stack.clean(None).unwrap();
        stack.install(Some("hosts"), true).unwrap();

        let queued = stack.queue().snapshot();
        assert_eq!(queued[0], Target::new(TargetKind::Clean));
        assert_eq!(queued[1].inventory(), Some("hosts"));
        assert!(queued[1].uninstall());
    }

    #[test]
    fn test_get_and_release_fail_when_unset() {
        let (_temp, stack) = session(draining("foo"));

        let err = stack.get("libfoo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unhandled);
        assert_eq!(err.to_string(), "foo: get: unhandled target");

        let err = stack.release(None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unhandled);
        assert!(stack.queue().is_empty());
    }

    #[test]
    fn test_unsupported_target() {
        let (_temp, stack) = session(draining("foo").unsupported(TargetKind::Get));

        let err = stack.get("libfoo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.to_string(), "foo: get: unsupported target");
    }

    #[test]
    fn test_flush_reports_lingering_targets() {
        let plugin = Plugin::new("lazy", ["Foobuild"]).on(TargetKind::Flush, |_| Directives::empty());
        let (_temp, stack) = session(plugin);

        stack.compile().unwrap();
        stack.test().unwrap();
        let err = stack.flush().unwrap_err();

        assert!(err.is_internal());
        assert_eq!(
            err.to_string(),
            "internal error: lazy: lingering unhandled target(s): compile, test"
        );
    }

    #[test]
    fn test_flush_without_handler_is_unhandled() {
        let (_temp, stack) = session(Plugin::new("bare", ["Foobuild"]));
        assert_eq!(stack.flush().unwrap_err().kind(), ErrorKind::Unhandled);
    }

    #[test]
    fn test_failure_directive_names_plugin_and_target() {
        let plugin = draining("foo").on(TargetKind::Test, |_| {
            Directive::failure("no test suite").into()
        });
        let (_temp, stack) = session(plugin);

        let err = stack.test().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Failure);
        assert_eq!(err.to_string(), "foo: test: no test suite");
    }

    #[test]
    fn test_handler_receives_params_and_profile() {
        let plugin = draining("foo").on(TargetKind::Package, |inv| {
            let expected = inv.string("format") == Some("zip") && inv.profile.is_none();
            if expected {
                Directives::empty()
            } else {
                Directive::failure("unexpected invocation").into()
            }
        });
        let (_temp, stack) = session(plugin);

        stack.package(Some("zip")).unwrap();
    }
}
