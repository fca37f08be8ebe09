use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use preflight_core::{
    ConfigError, PlaceholderPolicy, Rule, RuleKind, RuleSet, RuleTarget, Severity,
    DEFAULT_PLACEHOLDER_PREFIXES,
};

/// On-disk form of a rule set. `kind` and `severity` stay strings here so an
/// unknown value surfaces as a `ConfigError` naming the rule.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default = "default_prefixes")]
    pub placeholder_prefixes: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuleEntry {
    pub id: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_PLACEHOLDER_PREFIXES.iter().map(|p| p.to_string()).collect()
}

impl RuleEntry {
    fn required(
        &self,
        kind: RuleKind,
        field: &'static str,
        value: &Option<String>,
    ) -> Result<String, ConfigError> {
        value.clone().ok_or_else(|| ConfigError::MissingField {
            rule: self.id.clone(),
            kind: kind.to_string(),
            field,
        })
    }

    pub fn compile(&self) -> Result<Rule, ConfigError> {
        let kind = RuleKind::parse(&self.kind).ok_or_else(|| ConfigError::UnsupportedKind {
            rule: self.id.clone(),
            kind: self.kind.clone(),
        })?;
        let severity = match self.severity.as_deref() {
            None => Severity::Blocking,
            Some(s) => Severity::parse(s).ok_or_else(|| ConfigError::UnsupportedSeverity {
                rule: self.id.clone(),
                severity: s.to_string(),
            })?,
        };
        let target = match kind {
            RuleKind::KeyPresent => RuleTarget::Key { key: self.required(kind, "key", &self.key)? },
            RuleKind::FileExists => RuleTarget::File {
                path: self.required(kind, "path", &self.path)?,
            },
            RuleKind::PatternInFile | RuleKind::PatternAbsentInFile => RuleTarget::FilePattern {
                path: self.required(kind, "path", &self.path)?,
                pattern: self.required(kind, "pattern", &self.pattern)?,
            },
        };
        Ok(Rule { id: self.id.clone(), kind, target, severity, hint: self.hint.clone() })
    }

    pub fn from_rule(rule: &Rule) -> Self {
        let (key, path, pattern) = match &rule.target {
            RuleTarget::Key { key } => (Some(key.clone()), None, None),
            RuleTarget::File { path } => (None, Some(path.clone()), None),
            RuleTarget::FilePattern { path, pattern } => {
                (None, Some(path.clone()), Some(pattern.clone()))
            }
        };
        Self {
            id: rule.id.clone(),
            kind: rule.kind.to_string(),
            key,
            path,
            pattern,
            severity: Some(rule.severity.as_str().to_string()),
            hint: rule.hint.clone(),
        }
    }
}

impl RuleDocument {
    pub fn from_rule_set(set: &RuleSet) -> Self {
        Self {
            placeholder_prefixes: set.placeholder.prefixes.clone(),
            rules: set.iter().map(RuleEntry::from_rule).collect(),
        }
    }
}

/// Compiles and structurally checks a document.
pub fn compile_rule_set(doc: &RuleDocument) -> Result<RuleSet, ConfigError> {
    let rules = doc.rules.iter().map(RuleEntry::compile).collect::<Result<Vec<_>, _>>()?;
    let placeholder = PlaceholderPolicy::new(doc.placeholder_prefixes.clone());
    let set = RuleSet::new(rules).with_placeholder(placeholder);
    set.check()?;
    Ok(set)
}

/// Parses a document as TOML when the extension says so, YAML otherwise.
pub fn parse_rule_document(path: &Path, s: &str) -> Result<RuleDocument> {
    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");
    let doc = if is_toml {
        toml::from_str(s).with_context(|| format!("parse rule set toml: {}", path.display()))?
    } else {
        serde_yaml::from_str(s).with_context(|| format!("parse rule set yaml: {}", path.display()))?
    };
    Ok(doc)
}

pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read rule set: {}", path.display()))?;
    let doc = parse_rule_document(path, &s)?;
    let set = compile_rule_set(&doc)
        .with_context(|| format!("invalid rule set: {}", path.display()))?;
    Ok(set)
}

pub fn save_rule_set(set: &RuleSet, path: &Path) -> Result<()> {
    let doc = RuleDocument::from_rule_set(set);
    let s = serde_yaml::to_string(&doc).with_context(|| "serialize rule set yaml")?;
    std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Recursively sort object keys for stable hashing.
fn sort_json(v: serde_json::Value) -> serde_json::Value {
    match v {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Object(entries.into_iter().map(|(k, v)| (k, sort_json(v))).collect())
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(sort_json).collect())
        }
        other => other,
    }
}

/// SHA-256 over the canonical JSON form; identical rule sets hash equal.
pub fn fingerprint(set: &RuleSet) -> Result<String> {
    let v = serde_json::to_value(RuleDocument::from_rule_set(set))
        .with_context(|| "rule set to json")?;
    let bytes = serde_json::to_vec(&sort_json(v))?;
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
placeholder_prefixes: [changeme, your_, todo]
rules:
  - id: db-password
    kind: key_present
    key: DB_PASSWORD
    hint: Set DB_PASSWORD in .env
  - id: compose
    kind: file_exists
    path: docker-compose.yml
  - id: timezone
    kind: pattern_in_file
    path: docker-compose.yml
    pattern: TZ=Europe/Luxembourg
    severity: warning
  - id: no-debug
    kind: pattern_absent_in_file
    path: docker-compose.yml
    pattern: DEBUG=true
    severity: warning
"#;

    fn parse_yaml(s: &str) -> RuleDocument {
        parse_rule_document(Path::new("rules.yaml"), s).unwrap()
    }

    #[test]
    fn compiles_yaml_in_order_with_defaults() {
        let set = compile_rule_set(&parse_yaml(DOC)).unwrap();
        let ids: Vec<_> = set.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["db-password", "compose", "timezone", "no-debug"]);
        assert_eq!(set.rules[0].severity, Severity::Blocking);
        assert_eq!(set.rules[0].hint.as_deref(), Some("Set DB_PASSWORD in .env"));
        assert_eq!(set.rules[3].kind, RuleKind::PatternAbsentInFile);
        assert_eq!(set.placeholder.prefixes, ["changeme", "your_", "todo"]);
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        let doc = parse_yaml("rules:\n  - id: port\n    kind: port_open\n    key: \"8080\"\n");
        let err = compile_rule_set(&doc).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnsupportedKind { rule: "port".into(), kind: "port_open".into() }
        );
    }

    #[test]
    fn missing_target_field_is_a_config_error() {
        let doc = parse_yaml("rules:\n  - id: tz\n    kind: pattern_in_file\n    path: a.yml\n");
        let err = compile_rule_set(&doc).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { field: "pattern", .. }));
    }

    #[test]
    fn unknown_severity_is_a_config_error() {
        let doc = parse_yaml(
            r#"
rules:
  - id: k
    kind: key_present
    key: A
    severity: fatal
"#,
        );
        assert!(matches!(compile_rule_set(&doc), Err(ConfigError::UnsupportedSeverity { .. })));
    }

    #[test]
    fn empty_document_is_rejected() {
        let doc = parse_yaml("rules: []\n");
        assert_eq!(compile_rule_set(&doc).unwrap_err(), ConfigError::EmptyRuleSet);
    }

    #[test]
    fn loads_toml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(
            &path,
            r#"
[[rules]]
id = "jwt"
kind = "key_present"
key = "JWT_SECRET"
severity = "warning"
"#,
        )
        .unwrap();
        let set = load_rule_set(&path).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules[0].severity, Severity::Warning);
        assert_eq!(set.placeholder, PlaceholderPolicy::default());
    }

    #[test]
    fn save_then_load_preserves_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        let set = crate::deploy_rule_set();
        save_rule_set(&set, &path).unwrap();
        assert_eq!(load_rule_set(&path).unwrap(), set);
    }

    #[test]
    fn fingerprint_is_stable_and_order_sensitive() {
        let set = compile_rule_set(&parse_yaml(DOC)).unwrap();
        let h1 = fingerprint(&set).unwrap();
        assert_eq!(h1, fingerprint(&set).unwrap());
        assert_eq!(h1.len(), 64);

        let mut reversed = set.clone();
        reversed.rules.reverse();
        assert_ne!(h1, fingerprint(&reversed).unwrap());
    }
}
