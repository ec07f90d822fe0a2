//! Ansible playbooks
//!
//! `install` plays the playbook, optionally against an inventory; the
//! active profile selects the tags to run.

use crate::{argv, unexpected};
use buildstack_core::{Directive, Directives, Invocation, Plugin, TargetKind};
use std::fs;
use std::path::Path;

const DIST_DIR: &str = "dist";
const ROLES_DIR: &str = "roles";

/// The ansible plugin
pub fn plugin() -> Plugin {
    Plugin::new("ansible", ["playbook.yml", "site.yml"])
        .on(TargetKind::Get, get)
        .on(TargetKind::Clean, clean)
        .on(TargetKind::Publish, publish)
        .on(TargetKind::Flush, flush)
}

/// `ansible-galaxy install`, keeping roles local unless `ansible.cfg` says otherwise
fn galaxy(work_dir: &Path, args: &[&str]) -> Directive {
    let mut command = argv(&["ansible-galaxy", "install"]);
    if !work_dir.join("ansible.cfg").exists() {
        command.extend(argv(&["--roles-path", ROLES_DIR]));
    }
    command.extend(argv(args));
    Directive::Command(command)
}

fn get(inv: &Invocation<'_>) -> Directives {
    let Some(id) = inv.string("requirement") else {
        return Directive::failure("missing role or requirements file").into();
    };
    if inv.work_dir.join(id).is_file() {
        galaxy(inv.work_dir, &["-r", id]).into()
    } else {
        galaxy(inv.work_dir, &[id]).into()
    }
}

fn clean(inv: &Invocation<'_>) -> Directives {
    if inv.string("scope") != Some("all") {
        return Directives::empty();
    }
    vec![
        Directive::flush(),
        Directive::remove(DIST_DIR, "role archives"),
    ]
    .into()
}

/// Role directories under `roles/`, sorted
fn roles(work_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(work_dir.join(ROLES_DIR)) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Archive every role into `dist/` and upload it when a repository is given
fn publish(inv: &Invocation<'_>) -> Directives {
    let work_dir = inv.work_dir.to_path_buf();
    let repository = inv.string("repository").map(ToString::to_string);

    Directives::from(Directive::flush()).then(move || {
        let roles = roles(&work_dir);
        if roles.is_empty() {
            return vec![Directive::failure(format!("no role found in {ROLES_DIR}"))];
        }

        let mut directives = vec![Directive::command(["mkdir", "-p", DIST_DIR])];
        for role in roles {
            let archive = format!("{DIST_DIR}/{role}.tgz");
            let source = format!("{ROLES_DIR}/{role}");
            directives.push(Directive::command([
                "tar",
                "zcf",
                archive.as_str(),
                "-C",
                source.as_str(),
                ".",
            ]));
            if let Some(url) = &repository {
                directives.push(Directive::command([
                    "curl",
                    "-k",
                    "-T",
                    archive.as_str(),
                    url.as_str(),
                ]));
            }
        }
        directives
    })
}

fn flush(inv: &Invocation<'_>) -> Directives {
    let mut args: Vec<String> = Vec::new();
    let mut play = false;
    while let Some(target) = inv.queue.pop_front() {
        match target.kind {
            TargetKind::Test => args.push("--syntax-check".to_string()),
            TargetKind::Install if !target.uninstall() => match target.inventory() {
                Some(inventory) => args.extend(argv(&["--inventory", inventory])),
                None => play = true,
            },
            _ => return unexpected(&target),
        }
    }

    if args.is_empty() && !play {
        return Directives::empty();
    }

    let manifest = inv.manifest_arg();
    let mut command = argv(&["ansible-playbook", manifest.as_str()]);
    command.extend(args);
    if let Some(profile) = inv.profile {
        command.extend(argv(&["--tags", profile]));
    }
    Directive::Command(command).into()
}
