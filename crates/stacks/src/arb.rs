//! Ansible role builder
//!
//! Roles are recognised by `meta/main.yml` and every target is merged into
//! one `arb` invocation.

use crate::{argv, unexpected};
use buildstack_core::{Directive, Directives, Invocation, Plugin, TargetKind};

/// The arb plugin
pub fn plugin() -> Plugin {
    Plugin::new("arb", ["meta/main.yml"]).on(TargetKind::Flush, flush)
}

fn flush(inv: &Invocation<'_>) -> Directives {
    let mut args = argv(&["arb"]);
    while let Some(target) = inv.queue.pop_front() {
        match target.kind {
            TargetKind::Clean => match target.scope() {
                None => args.push("clean".to_string()),
                Some("all") => args.extend(argv(&["clean", "--all"])),
                Some(scope) => {
                    return Directive::failure(format!(
                        "{scope}: unknown scope, expected none or 'all'"
                    ))
                    .into();
                }
            },
            TargetKind::Test => args.push("check".to_string()),
            TargetKind::Compile => args.push("compile".to_string()),
            TargetKind::Package => args.push("package".to_string()),
            TargetKind::Publish => {
                args.push("publish".to_string());
                if let Some(repository) = target.repository() {
                    args.extend(argv(&["-r", repository]));
                }
            }
            _ => return unexpected(&target),
        }
    }

    if args.len() == 1 {
        return Directives::empty();
    }
    Directive::Command(args).into()
}
