//! Version-control capability
//!
//! The session asks the detected VCS for the command implementing purge,
//! commit or tag and runs it like any other command, so customization rules
//! apply to `git`, `hg` and `svn` too.

use buildstack_core::{Error, Result};
use std::fmt;
use std::path::Path;

/// Operation requested from the VCS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsOperation {
    /// Delete every untracked file
    Purge,
    /// Commit every change
    Commit,
    /// Tag the current revision
    Tag,
}

impl fmt::Display for VcsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VcsOperation::Purge => "purge",
            VcsOperation::Commit => "commit",
            VcsOperation::Tag => "tag",
        })
    }
}

/// A version-control system driving the working tree
pub trait VcsProvider: fmt::Debug {
    /// Short name of the VCS
    fn name(&self) -> &'static str;

    /// Command deleting every untracked file
    fn purge(&self) -> Result<Vec<String>> {
        Err(self.unsupported(VcsOperation::Purge))
    }

    /// Command committing every change
    fn commit(&self, message: &str) -> Result<Vec<String>> {
        let _ = message;
        Err(self.unsupported(VcsOperation::Commit))
    }

    /// Command tagging the current revision
    fn tag(&self, name: &str) -> Result<Vec<String>> {
        let _ = name;
        Err(self.unsupported(VcsOperation::Tag))
    }

    /// Error for an operation this VCS cannot perform
    fn unsupported(&self, operation: VcsOperation) -> Error {
        Error::UnsupportedVcsOperation {
            vcs: self.name().to_string(),
            operation: operation.to_string(),
        }
    }
}

fn argv(words: &[&str]) -> Vec<String> {
    words.iter().map(ToString::to_string).collect()
}

/// Git, detected through libgit2 repository discovery
#[derive(Debug, Clone, Copy)]
pub struct Git;

impl VcsProvider for Git {
    fn name(&self) -> &'static str {
        "git"
    }

    fn purge(&self) -> Result<Vec<String>> {
        Ok(argv(&["git", "clean", "--force", "-d", "-x"]))
    }

    fn commit(&self, message: &str) -> Result<Vec<String>> {
        Ok(argv(&["git", "commit", "--all", "-m", message]))
    }

    fn tag(&self, name: &str) -> Result<Vec<String>> {
        Ok(argv(&["git", "tag", name]))
    }
}

/// Mercurial, detected by its `.hg` marker directory
#[derive(Debug, Clone, Copy)]
pub struct Mercurial;

impl VcsProvider for Mercurial {
    fn name(&self) -> &'static str {
        "hg"
    }

    fn purge(&self) -> Result<Vec<String>> {
        Ok(argv(&["hg", "purge", "--all", "--config", "extensions.purge="]))
    }

    fn commit(&self, message: &str) -> Result<Vec<String>> {
        Ok(argv(&["hg", "commit", "-m", message]))
    }

    fn tag(&self, name: &str) -> Result<Vec<String>> {
        Ok(argv(&["hg", "tag", name]))
    }
}

/// Subversion, detected by its `.svn` marker directory
#[derive(Debug, Clone, Copy)]
pub struct Subversion;

impl VcsProvider for Subversion {
    fn name(&self) -> &'static str {
        "svn"
    }

    fn purge(&self) -> Result<Vec<String>> {
        Ok(argv(&[
            "svn",
            "cleanup",
            "--remove-unversioned",
            "--remove-ignored",
        ]))
    }

    fn commit(&self, message: &str) -> Result<Vec<String>> {
        Ok(argv(&["svn", "commit", "-m", message]))
    }
}

/// No version control: every operation is unsupported
#[derive(Debug, Clone, Copy)]
pub struct Unversioned;

impl VcsProvider for Unversioned {
    fn name(&self) -> &'static str {
        "unknown VCS"
    }
}

/// Detect the VCS governing `work_dir`
pub fn detect(work_dir: &Path) -> Box<dyn VcsProvider> {
    if git2::Repository::discover(work_dir).is_ok() {
        return Box::new(Git);
    }

    for dir in work_dir.ancestors() {
        if dir.join(".hg").is_dir() {
            return Box::new(Mercurial);
        }
        if dir.join(".svn").is_dir() {
            return Box::new(Subversion);
        }
    }

    Box::new(Unversioned)
}
