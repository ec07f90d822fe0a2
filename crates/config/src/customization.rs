//! Per-profile command customization
//!
//! Rules are keyed by profile (or `all`) and then by executable name:
//!
//! ```toml
//! [customize.all.make]
//! append = ["-j4"]
//!
//! [customize.dev.cargo]
//! path = "/opt/rust/bin/cargo"
//! before = [["echo", "building"]]
//! ```
//!
//! The rule applied to a command is the `all` rule overlaid field by field
//! with the active profile's rule. A field explicitly set to an empty list
//! in the profile rule still overrides the `all` field.

use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Profile key whose rules apply to every profile
pub const ALL_PROFILES: &str = "all";

/// Customization of one executable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRule {
    /// Replacement image path for the executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Commands run verbatim before the primary command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Vec<Vec<String>>>,

    /// Arguments appended to the primary command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub append: Option<Vec<String>>,

    /// Commands run verbatim after the primary command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Vec<Vec<String>>>,
}

impl CommandRule {
    /// Overlay `other` on top of `self`; fields set in `other` win
    #[must_use]
    pub fn overlay(&self, other: &CommandRule) -> CommandRule {
        CommandRule {
            path: other.path.clone().or_else(|| self.path.clone()),
            before: other.before.clone().or_else(|| self.before.clone()),
            append: other.append.clone().or_else(|| self.append.clone()),
            after: other.after.clone().or_else(|| self.after.clone()),
        }
    }

    /// Whether the rule changes nothing
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.before.is_none() && self.append.is_none() && self.after.is_none()
    }
}

/// The commands actually run for one requested command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// Run first, verbatim
    pub before: Vec<Vec<String>>,
    /// The requested command, rewritten
    pub primary: Vec<String>,
    /// Run last, verbatim
    pub after: Vec<Vec<String>>,
}

/// All customization rules: profile -> executable -> rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Customizations {
    profiles: IndexMap<String, IndexMap<String, CommandRule>>,
}

impl Customizations {
    /// Parse the legacy JSON customization document
    ///
    /// The document has the shape `{"<profile>|all": {"<command>": {...}}}`.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            buildstack_core::Error::Config(format!("Failed to parse customization JSON: {e}"))
        })
    }

    /// Add or replace a rule
    pub fn insert(&mut self, profile: &str, executable: &str, rule: CommandRule) {
        self.profiles
            .entry(profile.to_string())
            .or_default()
            .insert(executable.to_string(), rule);
    }

    /// Whether no rule is configured
    pub fn is_empty(&self) -> bool {
        self.profiles.values().all(IndexMap::is_empty)
    }

    fn lookup(&self, profile: &str, executable: &str) -> Option<&CommandRule> {
        self.profiles.get(profile).and_then(|rules| rules.get(executable))
    }

    /// The merged rule for an executable under the active profile
    pub fn rule_for(&self, executable: &str, profile: Option<&str>) -> CommandRule {
        let base = self
            .lookup(ALL_PROFILES, executable)
            .cloned()
            .unwrap_or_default();

        match profile.filter(|p| *p != ALL_PROFILES) {
            Some(profile) => match self.lookup(profile, executable) {
                Some(rule) => base.overlay(rule),
                None => base,
            },
            None => base,
        }
    }

    /// Rewrite a command line according to the merged rule for `argv[0]`
    pub fn plan(&self, argv: &[String], profile: Option<&str>) -> CommandPlan {
        let Some(program) = argv.first() else {
            return CommandPlan {
                before: Vec::new(),
                primary: Vec::new(),
                after: Vec::new(),
            };
        };

        let rule = self.rule_for(program, profile);
        let mut primary = argv.to_vec();
        if let Some(path) = rule.path {
            primary[0] = path;
        }
        primary.extend(rule.append.unwrap_or_default());

        CommandPlan {
            before: rule.before.unwrap_or_default(),
            primary,
            after: rule.after.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_plan_without_rules_is_identity() {
        let custom = Customizations::default();
        let plan = custom.plan(&argv(&["make", "all"]), Some("dev"));

        assert_eq!(plan.primary, argv(&["make", "all"]));
        assert!(plan.before.is_empty());
        assert!(plan.after.is_empty());
    }

    #[test]
    fn test_plan_applies_path_append_before_after() {
        let custom = Customizations::from_json_str(
            r#"{
                "all": {
                    "make": {
                        "path": "/usr/bin/gmake",
                        "append": ["-j4"],
                        "before": [["echo", "start"]],
                        "after": [["echo", "end"], ["sync"]]
                    }
                }
            }"#,
        )
        .unwrap();

        let plan = custom.plan(&argv(&["make", "all"]), None);
        assert_eq!(plan.before, vec![argv(&["echo", "start"])]);
        assert_eq!(plan.primary, argv(&["/usr/bin/gmake", "all", "-j4"]));
        assert_eq!(plan.after, vec![argv(&["echo", "end"]), argv(&["sync"])]);
    }

    #[test]
    fn test_profile_rule_overrides_all_per_field() {
        let mut custom = Customizations::default();
        custom.insert(
            ALL_PROFILES,
            "cargo",
            CommandRule {
                append: Some(argv(&["--locked"])),
                before: Some(vec![argv(&["echo", "all"])]),
                ..CommandRule::default()
            },
        );
        custom.insert(
            "dev",
            "cargo",
            CommandRule {
                path: Some("/opt/cargo".to_string()),
                before: Some(Vec::new()),
                ..CommandRule::default()
            },
        );

        let rule = custom.rule_for("cargo", Some("dev"));
        assert_eq!(rule.path.as_deref(), Some("/opt/cargo"));
        assert_eq!(rule.append, Some(argv(&["--locked"])));
        // explicit empty list still overrides
        assert_eq!(rule.before, Some(Vec::new()));

        let rule = custom.rule_for("cargo", Some("prod"));
        assert_eq!(rule.path, None);
        assert_eq!(rule.before, Some(vec![argv(&["echo", "all"])]));
    }

    #[test]
    fn test_rules_for_other_executables_are_ignored() {
        let mut custom = Customizations::default();
        custom.insert(
            ALL_PROFILES,
            "npm",
            CommandRule {
                append: Some(argv(&["--silent"])),
                ..CommandRule::default()
            },
        );

        assert!(custom.rule_for("make", None).is_empty());
        assert!(!custom.is_empty());
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let err = Customizations::from_json_str("{not json").unwrap_err();
        assert_eq!(err.kind(), buildstack_core::ErrorKind::Config);
    }
}
