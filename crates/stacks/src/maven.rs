//! Java projects driven by maven

use crate::{argv, unexpected};
use buildstack_core::{Directive, Directives, Invocation, Plugin, TargetKind};

/// The maven plugin
pub fn plugin() -> Plugin {
    Plugin::new("maven", ["pom.xml"]).on(TargetKind::Flush, flush)
}

fn flush(inv: &Invocation<'_>) -> Directives {
    let mut goals = Vec::new();
    while let Some(target) = inv.queue.pop_front() {
        let goal = match target.kind {
            TargetKind::Clean => "clean",
            TargetKind::Compile => "compile",
            TargetKind::Test => "test",
            TargetKind::Package => "package",
            TargetKind::Publish => "deploy",
            TargetKind::Install if !target.uninstall() => "install",
            _ => return unexpected(&target),
        };
        goals.push(goal.to_string());
    }

    if goals.is_empty() {
        return Directives::empty();
    }

    let manifest = inv.manifest_arg();
    let mut command = argv(&["mvn", "--update-snapshots", "--file", manifest.as_str()]);
    if let Some(profile) = inv.profile {
        command.extend(argv(&["-P", profile]));
    }
    command.extend(goals);
    Directive::Command(command).into()
}
