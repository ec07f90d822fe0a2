//! GNU autotools support for the make plugin
//!
//! A tree carrying `configure.ac` is driven by make once `./configure` has
//! generated its `Makefile`, so both files end up side by side. The make
//! plugin claims both manifests and hands over to this module while the
//! tree is still autotools-managed: flush bootstraps a missing `Makefile`
//! with the autotools chain and uses the GNU maintainer targets, and
//! cleaning removes what autotools and `automake --add-missing` left behind.

use crate::{argv, requeue, unexpected};
use buildstack_core::{Directive, Directives, Invocation, Target, TargetKind};
use std::fs;
use std::path::Path;

/// Autoconf input files, in lookup order
pub(crate) const CONFIGURE_SCRIPTS: &[&str] = &["configure.ac", "configure.in"];

/// Files `automake --add-missing` may symlink into the tree (see `man automake`)
const AUTOMAKE_AUXILIARY: &[&str] = &[
    "ABOUT-GNU",
    "ABOUT-NLS",
    "AUTHORS",
    "BACKLOG",
    "COPYING",
    "COPYING.DOC",
    "COPYING.LESSER",
    "COPYING.LIB",
    "Changelog",
    "INSTALL",
    "NEWS",
    "README",
    "THANKS",
    "TODO",
    "ar-lib",
    "compile",
    "config.guess",
    "config.rpath",
    "config.sub",
    "depcomp",
    "install-sh",
    "libversion.in",
    "ltcf-c.sh",
    "ltcf-cxx.sh",
    "ltcf-gcj.sh",
    "ltconfig",
    "ltmain.sh",
    "mdat-sh",
    "missing",
    "mkinstalldirs",
    "py-compile",
    "texinfo.tex",
    "ylwrap",
];

/// Files generated by the autotools chain itself
const AUTOTOOLS_OUTPUTS: &[&str] = &[
    "aclocal.m4",
    "config.h.in",
    "configure",
    "Makefile.in",
    "test-driver",
];

/// The autoconf input governing `work_dir`, if the tree is autotools-managed
///
/// A `Makefile` not produced by `./configure` (no `config.status` next to
/// it) means the project ships its own and plain make applies.
pub(crate) fn configure_script(work_dir: &Path) -> Option<&'static str> {
    let script = CONFIGURE_SCRIPTS
        .iter()
        .copied()
        .find(|name| work_dir.join(name).is_file())?;
    let generated = !work_dir.join("Makefile").exists() || work_dir.join("config.status").exists();
    generated.then_some(script)
}

pub(crate) fn clean(inv: &Invocation<'_>) -> Directives {
    requeue(
        inv.queue,
        Target::with_params(TargetKind::Clean, inv.params.clone()),
    );

    let work_dir = inv.work_dir.to_path_buf();
    Directives::from(Directive::flush()).then(move || lingering(&work_dir))
}

/// Removal directives for what the flush left behind
fn lingering(work_dir: &Path) -> Vec<Directive> {
    let symlinks = AUTOMAKE_AUXILIARY
        .iter()
        .filter(|name| work_dir.join(name).is_symlink())
        .map(|name| Directive::remove(*name, "lingering from automake --add-missing"));

    let outputs = AUTOTOOLS_OUTPUTS
        .iter()
        .filter(|name| work_dir.join(name).exists())
        .map(|name| Directive::remove(*name, "lingering from autotools"));

    symlinks.chain(outputs).collect()
}

fn declares_config_header(manifest: &Path) -> std::io::Result<bool> {
    let text = fs::read_to_string(manifest)?;
    Ok(text.contains("AC_CONFIG_HEADERS") || text.contains("AM_CONFIG_HEADER"))
}

/// Commands generating `Makefile` from the configure script
fn bootstrap(work_dir: &Path, script: &str) -> Vec<Directive> {
    let mut directives = vec![
        // ltmain.sh must exist before aclocal and automake run
        Directive::command(["libtoolize"]),
        Directive::command(["aclocal"]),
        Directive::command(["autoconf"]),
    ];

    match declares_config_header(&work_dir.join(script)) {
        Ok(true) => directives.push(Directive::command(["autoheader"])),
        Ok(false) => directives.push(Directive::trace(
            "no config header declared, skipping autoheader",
        )),
        Err(e) => {
            return vec![Directive::failure(format!("{script}: cannot read manifest: {e}"))];
        }
    }

    if work_dir.join("Makefile.am").exists() {
        directives.push(Directive::command(["automake", "--add-missing"]));
    }
    directives.push(Directive::command(["./configure"]));
    directives
}

pub(crate) fn flush(inv: &Invocation<'_>, script: &str) -> Directives {
    let mut args = argv(&["make"]);
    while let Some(target) = inv.queue.pop_front() {
        let goal = match target.kind {
            TargetKind::Clean => "maintainer-clean",
            TargetKind::Compile => "all",
            TargetKind::Test => "check",
            TargetKind::Package => "dist",
            TargetKind::Install if target.uninstall() => "uninstall",
            TargetKind::Install => "install",
            _ => return unexpected(&target),
        };
        args.push(goal.to_string());
    }

    if args.len() == 1 {
        return Directives::empty();
    }

    let mut directives = Vec::new();
    if !inv.work_dir.join("Makefile").exists() {
        tracing::debug!("No Makefile, bootstrapping with autotools");
        directives.extend(bootstrap(inv.work_dir, script));
    }
    directives.push(Directive::Command(args));
    directives.into()
}
