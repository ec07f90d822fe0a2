//! GNU make
//!
//! Every target is queued and merged into a single `make --file <manifest>`
//! invocation using the standard make targets. Trees managed by autotools
//! are claimed through their configure script and handed to
//! [`crate::autotools`].

use crate::{autotools, requeue, unexpected};
use buildstack_core::{Directive, Directives, Invocation, Plugin, Target, TargetKind};

/// The make plugin
pub fn plugin() -> Plugin {
    let patterns = ["Makefile", "makefile", "GNUmakefile"]
        .into_iter()
        .chain(autotools::CONFIGURE_SCRIPTS.iter().copied());
    Plugin::new("make", patterns)
        .unsupported(TargetKind::Get)
        .on(TargetKind::Clean, clean)
        .on(TargetKind::Flush, flush)
}

fn clean(inv: &Invocation<'_>) -> Directives {
    if autotools::configure_script(inv.work_dir).is_some() {
        return autotools::clean(inv);
    }
    requeue(
        inv.queue,
        Target::with_params(TargetKind::Clean, inv.params.clone()),
    );
    Directives::empty()
}

fn flush(inv: &Invocation<'_>) -> Directives {
    if let Some(script) = autotools::configure_script(inv.work_dir) {
        return autotools::flush(inv, script);
    }

    let mut args: Vec<&str> = Vec::new();
    while let Some(target) = inv.queue.pop_front() {
        match target.kind {
            TargetKind::Clean if target.scope() == Some("all") => args.push("distclean"),
            TargetKind::Clean => args.push("clean"),
            TargetKind::Test => args.push("check"),
            TargetKind::Compile => args.push("all"),
            TargetKind::Package => args.push("dist"),
            TargetKind::Install if target.uninstall() => args.push("uninstall"),
            TargetKind::Install => args.push("install"),
            _ => return unexpected(&target),
        }
    }

    if args.is_empty() {
        return Directives::empty();
    }

    // an explicit configure script next to a hand-written Makefile
    let manifest = inv.manifest_arg();
    let file = if autotools::CONFIGURE_SCRIPTS.contains(&manifest.as_str()) {
        "Makefile"
    } else {
        manifest.as_str()
    };
    Directive::command(["make", "--file", file].into_iter().chain(args)).into()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::testing::{cmd, invoke, params};
    use buildstack_core::{Params, Target, TargetQueue};
    use std::path::Path;

    fn run_flush(queue: &TargetQueue) -> Vec<Directive> {
        invoke(
            &plugin(),
            TargetKind::Flush,
            Path::new("."),
            "Makefile",
            queue,
            &Params::new(),
            None,
        )
    }

    #[test]
    fn test_flush_merges_targets_in_order() {
        let queue = TargetQueue::new();
        queue.push_kind(TargetKind::Clean);
        queue.push_kind(TargetKind::Compile);
        queue.push_kind(TargetKind::Test);
        queue.push_kind(TargetKind::Package);

        assert_eq!(
            run_flush(&queue),
            vec![cmd(&["make", "--file", "Makefile", "clean", "all", "check", "dist"])]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clean_all_and_uninstall() {
        let queue = TargetQueue::new();
        queue.push(Target::with_params(TargetKind::Clean, params(&[("scope", "all")])));
        let mut uninstall = Params::new();
        uninstall.insert("uninstall".to_string(), true.into());
        queue.push(Target::with_params(TargetKind::Install, uninstall));

        assert_eq!(
            run_flush(&queue),
            vec![cmd(&["make", "--file", "Makefile", "distclean", "uninstall"])]
        );
    }

    #[test]
    fn test_empty_queue_runs_nothing() {
        assert!(run_flush(&TargetQueue::new()).is_empty());
    }

    #[test]
    fn test_unexpected_target() {
        let queue = TargetQueue::new();
        queue.push_kind(TargetKind::Publish);

        assert_eq!(
            run_flush(&queue),
            vec![Directive::failure("publish: unexpected target")]
        );
    }

    #[test]
    fn test_shipped_makefile_beside_configure_script_is_plain_make() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("configure.ac"), "AC_INIT([git], [2])\n").unwrap();
        std::fs::write(temp.path().join("Makefile"), "all:\n").unwrap();
        let queue = TargetQueue::new();
        queue.push_kind(TargetKind::Compile);

        let clean = invoke(
            &plugin(),
            TargetKind::Clean,
            temp.path(),
            "Makefile",
            &queue,
            &Params::new(),
            None,
        );
        assert!(clean.is_empty());

        let flush = invoke(
            &plugin(),
            TargetKind::Flush,
            temp.path(),
            "configure.ac",
            &queue,
            &Params::new(),
            None,
        );
        assert_eq!(
            flush,
            vec![cmd(&["make", "--file", "Makefile", "all", "clean"])]
        );
    }

    #[test]
    fn test_patterns_cover_configure_scripts() {
        assert_eq!(
            plugin().patterns(),
            ["Makefile", "makefile", "GNUmakefile", "configure.ac", "configure.in"]
        );
    }

    #[test]
    fn test_get_is_unsupported() {
        assert!(matches!(
            plugin().handler(TargetKind::Get),
            buildstack_core::HandlerSlot::Unsupported
        ));
    }
}
