use std::collections::HashSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, PlaceholderPolicy, RuleKind, Severity};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RuleTarget {
    Key { key: String },
    FilePattern { path: String, pattern: String },
    File { path: String },
}

impl RuleTarget {
    pub fn path(&self) -> Option<&str> {
        match self {
            RuleTarget::Key { .. } => None,
            RuleTarget::File { path } | RuleTarget::FilePattern { path, .. } => Some(path),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RuleTarget::Key { key } => key.clone(),
            RuleTarget::File { path } => path.clone(),
            RuleTarget::FilePattern { path, pattern } => format!("{}: {}", path, pattern),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub id: String,
    pub kind: RuleKind,
    pub target: RuleTarget,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Rule {
    pub fn key_present(id: impl Into<String>, key: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            kind: RuleKind::KeyPresent,
            target: RuleTarget::Key { key: key.into() },
            severity,
            hint: None,
        }
    }

    pub fn file_exists(id: impl Into<String>, path: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            kind: RuleKind::FileExists,
            target: RuleTarget::File { path: path.into() },
            severity,
            hint: None,
        }
    }

    pub fn pattern_in_file(
        id: impl Into<String>,
        path: impl Into<String>,
        pattern: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            kind: RuleKind::PatternInFile,
            target: RuleTarget::FilePattern { path: path.into(), pattern: pattern.into() },
            severity,
            hint: None,
        }
    }

    pub fn pattern_absent_in_file(
        id: impl Into<String>,
        path: impl Into<String>,
        pattern: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            kind: RuleKind::PatternAbsentInFile,
            target: RuleTarget::FilePattern { path: path.into(), pattern: pattern.into() },
            severity,
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Structural check of a single rule: target fits kind, fields are
    /// non-empty, paths stay under the working directory.
    pub fn check(&self) -> Result<(), ConfigError> {
        let mismatch = || ConfigError::TargetMismatch {
            rule: self.id.clone(),
            kind: self.kind.to_string(),
        };
        let empty = |field: &'static str| ConfigError::EmptyField { rule: self.id.clone(), field };

        match (&self.kind, &self.target) {
            (RuleKind::KeyPresent, RuleTarget::Key { key }) => {
                if key.trim().is_empty() {
                    return Err(empty("key"));
                }
            }
            (RuleKind::FileExists, RuleTarget::File { path }) => {
                check_path(&self.id, path)?;
            }
            (
                RuleKind::PatternInFile | RuleKind::PatternAbsentInFile,
                RuleTarget::FilePattern { path, pattern },
            ) => {
                check_path(&self.id, path)?;
                if pattern.is_empty() {
                    return Err(empty("pattern"));
                }
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}

fn check_path(rule: &str, path: &str) -> Result<(), ConfigError> {
    if path.trim().is_empty() {
        return Err(ConfigError::EmptyField { rule: rule.to_string(), field: "path" });
    }
    let escapes = Path::new(path)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(ConfigError::PathEscapesRoot { rule: rule.to_string(), path: path.to_string() });
    }
    Ok(())
}

/// Ordered rules plus the placeholder policy `key_present` rules use.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub placeholder: PlaceholderPolicy,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules, placeholder: PlaceholderPolicy::default() }
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderPolicy) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Fails on the first structural problem found.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::EmptyRuleSet);
        }
        let mut seen = HashSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(ConfigError::EmptyRuleId { index });
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateRuleId(rule.id.clone()));
            }
            rule.check()?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
