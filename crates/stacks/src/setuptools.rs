//! Python distributions driven by setuptools
//!
//! Most targets are merged into one `python setup.py ...` invocation. A few
//! need ordering or post-processing and flush the queue themselves:
//! setuptools ignores targets listed after `test`, and uploads must see the
//! artifacts the flush produced.

use crate::{argv, requeue, unexpected};
use buildstack_core::{Directive, Directives, Invocation, Plugin, Target, TargetKind};
use std::path::Path;

const DIST_DIR: &str = "dist";

/// The setuptools plugin
pub fn plugin() -> Plugin {
    Plugin::new("setuptools", ["setup.py"])
        .on(TargetKind::Get, get)
        .on(TargetKind::Clean, clean)
        .on(TargetKind::Test, test)
        .on(TargetKind::Publish, publish)
        .on(TargetKind::Install, install)
        .on(TargetKind::Flush, flush)
}

fn get(inv: &Invocation<'_>) -> Directives {
    let Some(id) = inv.string("requirement") else {
        return Directive::failure("missing requirement").into();
    };
    if inv.work_dir.join(id).is_file() {
        Directive::command(["pip", "install", "-r", id]).into()
    } else {
        Directive::command(["pip", "install", id]).into()
    }
}

fn clean(inv: &Invocation<'_>) -> Directives {
    requeue(
        inv.queue,
        Target::with_params(TargetKind::Clean, inv.params.clone()),
    );
    if inv.string("scope") != Some("all") {
        return Directives::empty();
    }

    let work_dir = inv.work_dir.to_path_buf();
    Directives::from(Directive::flush()).then(move || leftovers(&work_dir))
}

/// Removal directives for build leftovers `setup.py clean --all` keeps
fn leftovers(work_dir: &Path) -> Vec<Directive> {
    let mut directives = vec![
        Directive::remove(DIST_DIR, "distribution archives"),
        Directive::remove(".eggs", "fetched build requirements"),
    ];
    directives.extend(
        matching(work_dir, "*.egg-info")
            .into_iter()
            .map(|name| Directive::remove(name, "egg metadata")),
    );
    directives
}

/// File names in `work_dir` matching a glob, sorted
fn matching(work_dir: &Path, pattern: &str) -> Vec<String> {
    let full = format!(
        "{}/{pattern}",
        glob::Pattern::escape(&work_dir.to_string_lossy())
    );
    let Ok(paths) = glob::glob(&full) else {
        return Vec::new();
    };
    let mut names: Vec<String> = paths
        .filter_map(Result::ok)
        .filter_map(|path| {
            path.strip_prefix(work_dir)
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        })
        .collect();
    names.sort();
    names
}

fn test(inv: &Invocation<'_>) -> Directives {
    requeue(inv.queue, Target::new(TargetKind::Test));
    // `setup.py test sdist` only runs the tests
    Directive::flush().into()
}

fn publish(inv: &Invocation<'_>) -> Directives {
    let work_dir = inv.work_dir.to_path_buf();
    let repository = inv.string("repository").map(ToString::to_string);

    Directives::from(Directive::flush()).then(move || {
        let archives = matching(&work_dir, &format!("{DIST_DIR}/*"));
        if archives.is_empty() {
            return vec![Directive::failure(format!(
                "nothing to upload in {DIST_DIR}, package first"
            ))];
        }
        let mut command = argv(&["twine", "upload"]);
        command.extend(archives);
        if let Some(repository) = repository {
            command.extend(["--repository".to_string(), repository]);
        }
        vec![Directive::Command(command)]
    })
}

fn install(inv: &Invocation<'_>) -> Directives {
    if !inv.flag("uninstall") {
        requeue(inv.queue, Target::new(TargetKind::Install));
        return Directives::empty();
    }

    let Some(name) = inv.work_dir.file_name() else {
        return Directive::failure("cannot infer the distribution name").into();
    };
    let name = name.to_string_lossy().into_owned();
    vec![
        Directive::flush(),
        Directive::command(["pip", "uninstall", "-y", name.as_str()]),
    ]
    .into()
}

/// `setup.py` arguments for a package format
fn package_args(format: Option<&str>) -> Option<Vec<String>> {
    let args = match format {
        None | Some("sdist") => argv(&["sdist"]),
        Some("bdist") => argv(&["bdist"]),
        Some(format) => {
            let (command, archive) = format.split_once(':')?;
            if !matches!(command, "sdist" | "bdist") || archive.is_empty() {
                return None;
            }
            vec![command.to_string(), format!("--formats={archive}")]
        }
    };
    Some(args)
}

fn flush(inv: &Invocation<'_>) -> Directives {
    let manifest = inv.manifest_arg();
    let mut command = argv(&["python", manifest.as_str()]);
    while let Some(target) = inv.queue.pop_front() {
        match target.kind {
            TargetKind::Clean => {
                command.push("clean".to_string());
                if target.scope() == Some("all") {
                    command.push("--all".to_string());
                }
            }
            TargetKind::Test => command.push("test".to_string()),
            TargetKind::Compile => command.push("build".to_string()),
            TargetKind::Package => match package_args(target.format()) {
                Some(args) => command.extend(args),
                None => {
                    return Directive::failure(format!(
                        "{}: unknown package format",
                        target.format().unwrap_or_default()
                    ))
                    .into();
                }
            },
            TargetKind::Develop => {
                command.push("develop".to_string());
                if target.uninstall() {
                    command.push("--uninstall".to_string());
                }
            }
            TargetKind::Install if !target.uninstall() => command.push("install".to_string()),
            _ => return unexpected(&target),
        }
    }

    if command.len() == 2 {
        return Directives::empty();
    }
    Directive::Command(command).into()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::testing::{cmd, invoke, params};
    use buildstack_core::{Params, TargetQueue};
    use std::fs;
    use tempfile::TempDir;

    fn run(kind: TargetKind, dir: &Path, queue: &TargetQueue, params: &Params) -> Vec<Directive> {
        invoke(&plugin(), kind, dir, "setup.py", queue, params, None)
    }

    #[test]
    fn test_get_uses_requirements_file_when_present() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("requirements.txt"), "requests\n").unwrap();
        let queue = TargetQueue::new();

        assert_eq!(
            run(TargetKind::Get, temp.path(), &queue, &params(&[("requirement", "requirements.txt")])),
            vec![cmd(&["pip", "install", "-r", "requirements.txt"])]
        );
        assert_eq!(
            run(TargetKind::Get, temp.path(), &queue, &params(&[("requirement", "requests")])),
            vec![cmd(&["pip", "install", "requests"])]
        );
    }

    #[test]
    fn test_test_queues_and_flushes() {
        let queue = TargetQueue::new();
        queue.push_kind(TargetKind::Compile);

        let directives = run(TargetKind::Test, Path::new("."), &queue, &Params::new());

        assert_eq!(directives, vec![Directive::flush()]);
        assert_eq!(queue.names(), vec!["compile", "test"]);
    }

    #[test]
    fn test_clean_all_removes_leftovers_after_flush() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("demo.egg-info")).unwrap();
        let queue = TargetQueue::new();

        let directives = run(TargetKind::Clean, temp.path(), &queue, &params(&[("scope", "all")]));

        assert_eq!(queue.names(), vec!["clean"]);
        assert_eq!(directives[0], Directive::flush());
        assert!(directives.contains(&Directive::remove("dist", "distribution archives")));
        assert!(directives.contains(&Directive::remove("demo.egg-info", "egg metadata")));
    }

    #[test]
    fn test_plain_clean_is_only_queued() {
        let queue = TargetQueue::new();
        assert!(run(TargetKind::Clean, Path::new("."), &queue, &Params::new()).is_empty());
        assert_eq!(queue.names(), vec!["clean"]);
    }

    #[test]
    fn test_publish_globs_after_flush() {
        let temp = TempDir::new().unwrap();
        let queue = TargetQueue::new();
        let plugin = plugin();
        let buildstack_core::HandlerSlot::Run(handler) = plugin.handler(TargetKind::Publish) else {
            panic!("publish handler missing");
        };
        let params = params(&[("repository", "testpypi")]);
        let invocation = buildstack_core::Invocation {
            profile: None,
            manifest: Path::new("setup.py"),
            work_dir: temp.path(),
            queue: &queue,
            params: &params,
        };

        let mut stream = handler(&invocation);
        assert_eq!(stream.next(), Some(Directive::flush()));

        // the flush produces the archives
        fs::create_dir(temp.path().join("dist")).unwrap();
        fs::write(temp.path().join("dist/demo-1.0.tar.gz"), "").unwrap();

        assert_eq!(
            stream.next(),
            Some(cmd(&[
                "twine",
                "upload",
                "dist/demo-1.0.tar.gz",
                "--repository",
                "testpypi"
            ]))
        );
    }

    #[test]
    fn test_uninstall_uses_directory_name() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("demo");
        fs::create_dir(&dir).unwrap();
        let mut uninstall = Params::new();
        uninstall.insert("uninstall".to_string(), true.into());

        assert_eq!(
            run(TargetKind::Install, &dir, &TargetQueue::new(), &uninstall),
            vec![Directive::flush(), cmd(&["pip", "uninstall", "-y", "demo"])]
        );
    }

    #[test]
    fn test_flush_merges_commands() {
        let queue = TargetQueue::new();
        queue.push(Target::with_params(TargetKind::Clean, params(&[("scope", "all")])));
        queue.push_kind(TargetKind::Compile);
        queue.push(Target::with_params(TargetKind::Package, params(&[("format", "bdist:zip")])));
        queue.push_kind(TargetKind::Develop);
        queue.push_kind(TargetKind::Install);

        assert_eq!(
            run(TargetKind::Flush, Path::new("."), &queue, &Params::new()),
            vec![cmd(&[
                "python",
                "setup.py",
                "clean",
                "--all",
                "build",
                "bdist",
                "--formats=zip",
                "develop",
                "install",
            ])]
        );
    }

    #[test]
    fn test_package_formats() {
        assert_eq!(package_args(None), Some(argv(&["sdist"])));
        assert_eq!(package_args(Some("sdist:gztar")), Some(argv(&["sdist", "--formats=gztar"])));
        assert_eq!(package_args(Some("bdist")), Some(argv(&["bdist"])));
        assert_eq!(package_args(Some("wheel")), None);
        assert_eq!(package_args(Some("sdist:")), None);
    }

    #[test]
    fn test_unknown_package_format_fails() {
        let queue = TargetQueue::new();
        queue.push(Target::with_params(TargetKind::Package, params(&[("format", "deb")])));

        assert_eq!(
            run(TargetKind::Flush, Path::new("."), &queue, &Params::new()),
            vec![Directive::failure("deb: unknown package format")]
        );
    }
}
