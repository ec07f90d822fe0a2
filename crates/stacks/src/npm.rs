//! Node.js packages driven by npm

use crate::argv;
use buildstack_core::{Directive, Directives, Invocation, Plugin, TargetKind};

/// The npm plugin
pub fn plugin() -> Plugin {
    Plugin::new("npm", ["package.json"])
        .on(TargetKind::Get, get)
        .on(TargetKind::Test, |_| Directive::command(["npm", "test"]).into())
        // npm has no separate compile or package step
        .on(TargetKind::Compile, |_| Directives::empty())
        .on(TargetKind::Package, |_| Directives::empty())
        .on(TargetKind::Publish, publish)
        .on(TargetKind::Install, install)
        .on(TargetKind::Release, release)
        .on(TargetKind::Flush, flush)
}

fn get(inv: &Invocation<'_>) -> Directives {
    let command = match inv.string("requirement") {
        Some(id) => argv(&["npm", "install", id]),
        None => argv(&["npm", "update"]),
    };
    vec![Directive::flush(), Directive::Command(command)].into()
}

fn publish(inv: &Invocation<'_>) -> Directives {
    let mut command = argv(&["npm", "publish"]);
    if let Some(registry) = inv.string("repository") {
        command.extend(argv(&["--registry", registry]));
    }
    Directive::Command(command).into()
}

fn install(inv: &Invocation<'_>) -> Directives {
    if inv.flag("uninstall") {
        return Directive::failure("uninstall is not supported, remove the global package with npm").into();
    }
    Directive::command(["npm", "install", "--global", "."]).into()
}

fn release(inv: &Invocation<'_>) -> Directives {
    let mut command = argv(&["npm", "version", inv.string("kind").unwrap_or("patch")]);
    if let Some(message) = inv.string("message") {
        command.extend(argv(&["-m", message]));
    }
    vec![Directive::flush(), Directive::Command(command)].into()
}

fn flush(inv: &Invocation<'_>) -> Directives {
    match inv.queue.pop_front() {
        Some(target) => crate::unexpected(&target),
        None => Directives::empty(),
    }
}
