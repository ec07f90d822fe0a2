//! End-to-end dispatch tests against a minimal `foo` build stack
#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::panic)]

use buildstack_config::Customizations;
use buildstack_core::{Directive, Directives, ErrorKind, Plugin, TargetKind};
use buildstack_engine::{BuildStack, SessionOptions};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// `Foobuild` stack: the flush handler touches `foo.<target>` for every
/// queued target in one shell command
fn foo() -> Arc<Plugin> {
    Arc::new(
        Plugin::new("foo", ["Foobuild"])
            .unsupported(TargetKind::Get)
            .on(TargetKind::Flush, |inv| {
                let names: Vec<String> = inv
                    .queue
                    .drain()
                    .into_iter()
                    .map(|target| target.kind.to_string())
                    .collect();
                if names.is_empty() {
                    return Directives::empty();
                }
                let mut argv = vec![
                    "sh".to_string(),
                    "-c".to_string(),
                    "for i; do touch foo.$i; done".to_string(),
                    "sh".to_string(),
                ];
                argv.extend(names);
                Directive::Command(argv).into()
            }),
    )
}

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Foobuild"), "").unwrap();
    temp
}

fn open(dir: &Path, plugins: &[Arc<Plugin>]) -> BuildStack {
    BuildStack::open(
        dir,
        plugins,
        SessionOptions::default(),
        Customizations::default(),
    )
    .unwrap()
}

fn markers(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("foo."))
        .collect();
    names.sort();
    names
}

#[test]
fn full_lifecycle_yields_one_marker_per_target() {
    let temp = workspace();
    let stack = open(temp.path(), &[foo()]);

    stack.clean(None).unwrap();
    stack.compile().unwrap();
    stack.test().unwrap();
    stack.package(None).unwrap();
    stack.install(None, false).unwrap();
    stack.publish(None).unwrap();
    assert!(markers(temp.path()).is_empty(), "nothing runs before flush");

    stack.flush().unwrap();

    assert_eq!(
        markers(temp.path()),
        vec![
            "foo.clean",
            "foo.compile",
            "foo.install",
            "foo.package",
            "foo.publish",
            "foo.test",
        ]
    );
    assert!(stack.queue().is_empty());
}

#[test]
fn compile_alone_yields_only_its_marker() {
    let temp = workspace();
    let stack = open(temp.path(), &[foo()]);

    stack.compile().unwrap();
    stack.flush().unwrap();

    assert_eq!(markers(temp.path()), vec!["foo.compile"]);
}

#[test]
fn unsupported_get() {
    let temp = workspace();
    let stack = open(temp.path(), &[foo()]);

    let err = stack.get("libfoo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn makefile_and_pom_are_ambiguous() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Makefile"), "all:\n").unwrap();
    fs::write(temp.path().join("pom.xml"), "<project/>").unwrap();
    let plugins = [
        Arc::new(Plugin::new("make", ["Makefile"])),
        Arc::new(Plugin::new("maven", ["pom.xml"])),
    ];

    let err = BuildStack::open(
        temp.path(),
        &plugins,
        SessionOptions::default(),
        Customizations::default(),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    let message = err.to_string();
    assert!(message.contains("make"), "{message}");
    assert!(message.contains("maven"), "{message}");
}

#[test]
fn failing_flush_command_aborts() {
    let temp = workspace();
    let plugin = Arc::new(Plugin::new("foo", ["Foobuild"]).on(TargetKind::Flush, |inv| {
        inv.queue.drain();
        vec![
            Directive::command(["sh", "-c", "exit 2"]),
            Directive::command(["touch", "foo.after"]),
        ]
        .into()
    }));
    let stack = open(temp.path(), &[plugin]);

    stack.compile().unwrap();
    let err = stack.flush().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Execution);
    assert_eq!(err.to_string(), "foo: flush: sh: exited with status 2");
    assert!(markers(temp.path()).is_empty());
}

#[test]
fn customization_applies_to_plugin_commands() {
    let temp = workspace();
    let custom = Customizations::from_json_str(
        r#"{"ci": {"sh": {"before": [["touch", "foo.before"]], "after": [["touch", "foo.after"]]}}}"#,
    )
    .unwrap();
    let stack = BuildStack::open(
        temp.path(),
        &[foo()],
        SessionOptions::default().profile(Some("ci")),
        custom,
    )
    .unwrap();

    stack.test().unwrap();
    stack.flush().unwrap();

    assert_eq!(
        markers(temp.path()),
        vec!["foo.after", "foo.before", "foo.test"]
    );
}

#[test]
fn clean_untracked_flushes_then_purges() {
    if which::which("git").is_err() {
        return;
    }
    let temp = workspace();
    git2::Repository::init(temp.path()).unwrap();
    let stack = open(temp.path(), &[foo()]);

    stack.compile().unwrap();
    stack.clean(Some("untracked")).unwrap();

    // the flush ran first, then git removed everything untracked
    assert!(markers(temp.path()).is_empty());
    assert!(!temp.path().join("Foobuild").exists());
    assert!(temp.path().join(".git").exists());
    assert!(stack.queue().is_empty());
}
