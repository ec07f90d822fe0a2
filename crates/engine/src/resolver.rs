//! Manifest resolution
//!
//! Finds the one registered plugin whose manifest governs a location.

use buildstack_core::{Error, Plugin, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of a successful resolution
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The plugin driving the tree
    pub plugin: Arc<Plugin>,
    /// Manifest path relative to `work_dir`
    pub manifest: PathBuf,
    /// Directory holding the manifest; every command runs there
    pub work_dir: PathBuf,
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern)
        .map_err(|e| Error::Internal(format!("{pattern}: invalid manifest pattern: {e}")))
}

/// Number of trailing components of `path` matched by `pattern`
///
/// A pattern with `n` components is matched against the last `n` components
/// of the path, so `meta/main.yml` matches `roles/web/meta/main.yml`.
fn matches_tail(pattern: &str, path: &Path) -> Result<Option<usize>> {
    let depth = pattern.split('/').filter(|c| !c.is_empty()).count().max(1);
    let components: Vec<_> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if components.len() < depth {
        return Ok(None);
    }
    let tail = components[components.len() - depth..].join("/");
    Ok(compile(pattern)?.matches(&tail).then_some(depth))
}

/// Split an explicit manifest into its plugin-relative name and work dir
fn split_manifest(location: &Path, depth: usize) -> (PathBuf, PathBuf) {
    let mut work_dir = location.to_path_buf();
    for _ in 0..depth {
        if !work_dir.pop() {
            break;
        }
    }
    let manifest = location
        .strip_prefix(&work_dir)
        .map_or_else(|_| location.to_path_buf(), Path::to_path_buf);
    (manifest, work_dir)
}

/// Resolve the plugin for a location
///
/// A file location selects every plugin with a pattern matching it. A
/// directory location selects every plugin with a pattern matching a file
/// inside it, taking the first match of the first matching pattern as that
/// plugin's manifest. Exactly one plugin must be selected.
#[tracing::instrument(skip(plugins), fields(location = %location.display()))]
pub fn resolve(location: &Path, plugins: &[Arc<Plugin>]) -> Result<Resolution> {
    if !location.exists() {
        return Err(Error::ManifestNotFound {
            path: location.to_path_buf(),
        });
    }

    let location = std::path::absolute(location)?;
    let mut candidates: Vec<(Arc<Plugin>, PathBuf)> = Vec::new();

    let work_dir = if location.is_dir() {
        let escaped = Pattern::escape(&location.to_string_lossy());
        for plugin in plugins {
            if let Some(manifest) = first_manifest(&escaped, &location, plugin)? {
                tracing::debug!(plugin = plugin.name(), manifest = %manifest.display(), "Candidate manifest");
                candidates.push((Arc::clone(plugin), manifest));
            }
        }
        location
    } else {
        // the deepest matching pattern decides the work dir
        let mut depth = 0;
        for plugin in plugins {
            let mut matched = None;
            for pattern in plugin.patterns() {
                if let Some(d) = matches_tail(pattern, &location)? {
                    matched = Some(d);
                    break;
                }
            }
            if let Some(d) = matched {
                depth = depth.max(d);
                let (manifest, _) = split_manifest(&location, d);
                candidates.push((Arc::clone(plugin), manifest));
            }
        }
        split_manifest(&location, depth.max(1)).1
    };

    match candidates.len() {
        0 => Err(Error::NoBuildStack { dir: work_dir }),
        1 => {
            let (plugin, manifest) = candidates.remove(0);
            tracing::info!(
                plugin = plugin.name(),
                manifest = %manifest.display(),
                "Using {} build stack",
                plugin.name()
            );
            Ok(Resolution {
                plugin,
                manifest,
                work_dir,
            })
        }
        _ => Err(Error::MultipleBuildStacks {
            names: candidates
                .iter()
                .map(|(plugin, _)| plugin.name().to_string())
                .collect(),
        }),
    }
}

/// First file in `dir` matching one of the plugin's patterns, in pattern order
fn first_manifest(escaped_dir: &str, dir: &Path, plugin: &Plugin) -> Result<Option<PathBuf>> {
    for pattern in plugin.patterns() {
        // validates the pattern before it is spliced into the glob
        compile(pattern)?;
        let full = format!("{escaped_dir}/{pattern}");
        let entries = glob::glob(&full)
            .map_err(|e| Error::Internal(format!("{pattern}: invalid manifest pattern: {e}")))?;
        if let Some(path) = entries.filter_map(std::result::Result::ok).find(|p| p.is_file()) {
            let relative = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();
            return Ok(Some(relative));
        }
    }
    Ok(None)
}
