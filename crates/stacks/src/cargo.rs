//! Rust packages driven by cargo
//!
//! Each queued target becomes one cargo subcommand; they run in queue order.
//! `test` runs the benchmarks too.

use crate::{argv, unexpected};
use buildstack_core::{Directive, Directives, Invocation, Plugin, TargetKind};
use serde::Deserialize;
use std::fs;

/// The cargo plugin
pub fn plugin() -> Plugin {
    Plugin::new("cargo", ["Cargo.toml"])
        .on(TargetKind::Get, get)
        .on(TargetKind::Flush, flush)
}

#[derive(Deserialize)]
struct Manifest {
    package: Option<Package>,
}

#[derive(Deserialize)]
struct Package {
    name: String,
}

/// Package name declared by the manifest
fn package_name(inv: &Invocation<'_>) -> Result<String, String> {
    let path = inv.work_dir.join(inv.manifest);
    let text = fs::read_to_string(&path)
        .map_err(|e| format!("{}: cannot read manifest: {e}", inv.manifest.display()))?;
    let manifest: Manifest = toml::from_str(&text)
        .map_err(|e| format!("{}: cannot parse manifest: {e}", inv.manifest.display()))?;
    manifest
        .package
        .map(|p| p.name)
        .ok_or_else(|| format!("{}: no [package] section", inv.manifest.display()))
}

fn get(inv: &Invocation<'_>) -> Directives {
    let mut update = argv(&["cargo", "update"]);
    if let Some(id) = inv.string("requirement") {
        update.extend(argv(&["-p", id]));
    }
    vec![Directive::flush(), Directive::Command(update)].into()
}

fn flush(inv: &Invocation<'_>) -> Directives {
    let mut directives = Vec::new();
    while let Some(target) = inv.queue.pop_front() {
        let command = match target.kind {
            TargetKind::Clean => argv(&["cargo", "clean"]),
            TargetKind::Compile if inv.profile == Some("dev") => argv(&["cargo", "build"]),
            TargetKind::Compile => argv(&["cargo", "build", "--release"]),
            TargetKind::Test => {
                directives.push(Directive::command(["cargo", "test"]));
                argv(&["cargo", "bench"])
            }
            TargetKind::Package => argv(&["cargo", "package"]),
            TargetKind::Publish => match target.repository() {
                Some(registry) => argv(&["cargo", "publish", "--registry", registry]),
                None => argv(&["cargo", "publish"]),
            },
            TargetKind::Install if target.uninstall() => match package_name(inv) {
                Ok(name) => argv(&["cargo", "uninstall", name.as_str()]),
                Err(message) => return Directive::failure(message).into(),
            },
            TargetKind::Install => argv(&["cargo", "install", "--path", "."]),
            _ => return unexpected(&target),
        };
        directives.push(Directive::Command(command));
    }
    directives.into()
}
