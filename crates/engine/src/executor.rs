//! Command execution through the customization overlay
//!
//! Every command a plugin asks for is rewritten with the merged
//! customization rule for its executable, then run without a shell in the
//! session working directory. Children inherit stdin, stdout and stderr.

use crate::options::Tracer;
use buildstack_config::Customizations;
use buildstack_core::{Error, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

/// How a failure of the primary command is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Any failure aborts
    Strict,
    /// A failure of the primary command is logged and discarded
    Tolerate,
}

/// Runs commands for one session
#[derive(Debug)]
pub struct CommandRunner {
    work_dir: PathBuf,
    customizations: Customizations,
    profile: Option<String>,
    tracer: Tracer,
    /// Executables already located, keyed by the name plugins use
    located: RefCell<HashMap<String, PathBuf>>,
}

impl CommandRunner {
    /// Create a builder for a runner executing in `work_dir`
    pub fn builder(work_dir: impl Into<PathBuf>) -> CommandRunnerBuilder {
        CommandRunnerBuilder::new(work_dir.into())
    }

    /// Run one requested command with its before and after commands
    #[tracing::instrument(skip(self, argv), fields(program = argv.first().map(String::as_str).unwrap_or_default()))]
    pub fn run(&self, argv: &[String], mode: FailureMode) -> Result<()> {
        let plan = self.customizations.plan(argv, self.profile.as_deref());

        for command in &plan.before {
            self.execute(command)?;
        }

        match self.execute(&plan.primary) {
            Ok(()) => {}
            Err(e) if mode == FailureMode::Tolerate => {
                self.tracer.line(&format!("ignored failure: {e}"));
                tracing::warn!(error = %e, "Command failed, continuing");
            }
            Err(e) => return Err(e),
        }

        for command in &plan.after {
            self.execute(command)?;
        }

        Ok(())
    }

    /// Trace and execute one command verbatim
    fn execute(&self, argv: &[String]) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(Error::Internal("empty command".to_string()));
        };

        self.tracer.command(argv);
        let image = self.locate(program)?;

        tracing::debug!("Executing command: {} {:?}", image.display(), args);
        let output = duct::cmd(image.as_path(), args)
            .dir(&self.work_dir)
            .unchecked()
            .run()
            .map_err(|e| Error::CommandFailed {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let reason = match output.status.code() {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            };
            Err(Error::CommandFailed {
                program: program.clone(),
                reason,
            })
        }
    }

    /// Locate an executable with `which` semantics relative to the work dir
    fn locate(&self, program: &str) -> Result<PathBuf> {
        if let Some(path) = self.located.borrow().get(program) {
            return Ok(path.clone());
        }

        let path = which::which_in(program, std::env::var_os("PATH"), &self.work_dir)
            .map_err(|_| Error::ExecutableNotFound {
                program: program.to_string(),
            })?;

        tracing::trace!(program, path = %path.display(), "Located executable");
        self.located
            .borrow_mut()
            .insert(program.to_string(), path.clone());
        Ok(path)
    }
}

/// Builder for [`CommandRunner`]
#[derive(Debug)]
pub struct CommandRunnerBuilder {
    work_dir: PathBuf,
    customizations: Customizations,
    profile: Option<String>,
    tracer: Option<Tracer>,
}

impl CommandRunnerBuilder {
    fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            customizations: Customizations::default(),
            profile: None,
            tracer: None,
        }
    }

    /// Customization rules applied to every command
    #[must_use]
    pub fn customizations(mut self, customizations: Customizations) -> Self {
        self.customizations = customizations;
        self
    }

    /// Active profile
    #[must_use]
    pub fn profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub(crate) fn tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Build the runner
    pub fn build(self) -> CommandRunner {
        CommandRunner {
            work_dir: self.work_dir,
            customizations: self.customizations,
            profile: self.profile,
            tracer: self
                .tracer
                .unwrap_or_else(|| crate::options::SessionOptions::default().tracer()),
            located: RefCell::new(HashMap::new()),
        }
    }
}
