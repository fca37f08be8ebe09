use serde::{Deserialize, Serialize};

pub const DEFAULT_PLACEHOLDER_PREFIXES: [&str; 2] = ["changeme", "your_"];

/// Sentinel prefixes marking a value as "not yet configured".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceholderPolicy {
    pub prefixes: Vec<String>,
}

impl Default for PlaceholderPolicy {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_PLACEHOLDER_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PlaceholderPolicy {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-insensitive prefix match against every configured sentinel.
    pub fn matches(&self, value: &str) -> bool {
        let value = value.trim().to_ascii_lowercase();
        self.prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .any(|p| value.starts_with(&p.to_ascii_lowercase()))
    }
}

/// Outcome of looking up a configuration value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueState {
    Absent,
    Empty,
    Placeholder,
    Set,
}

/// Absent, empty (including whitespace-only) and placeholder values are all
/// treated as unconfigured.
pub fn classify_value(value: Option<&str>, policy: &PlaceholderPolicy) -> ValueState {
    let is_absent = value.is_none();
    let is_empty = value.is_some_and(|v| v.trim().is_empty());
    let is_placeholder = value.is_some_and(|v| policy.matches(v));

    if is_absent {
        ValueState::Absent
    } else if is_empty {
        ValueState::Empty
    } else if is_placeholder {
        ValueState::Placeholder
    } else {
        ValueState::Set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_the_three_unconfigured_states() {
        let policy = PlaceholderPolicy::default();
        assert_eq!(classify_value(None, &policy), ValueState::Absent);
        assert_eq!(classify_value(Some(""), &policy), ValueState::Empty);
        assert_eq!(classify_value(Some("   "), &policy), ValueState::Empty);
        assert_eq!(classify_value(Some("your_password"), &policy), ValueState::Placeholder);
        assert_eq!(classify_value(Some("CHANGEME-now"), &policy), ValueState::Placeholder);
        assert_eq!(classify_value(Some("s3cr3t-val"), &policy), ValueState::Set);
    }

    #[test]
    fn placeholder_is_a_prefix_not_a_substring() {
        let policy = PlaceholderPolicy::default();
        assert!(!policy.matches("not_your_password"));
        assert!(policy.matches("  your_jwt_secret"));
    }

    #[test]
    fn empty_prefix_list_disables_placeholder_detection() {
        let policy = PlaceholderPolicy::new(Vec::<String>::new());
        assert_eq!(classify_value(Some("changeme"), &policy), ValueState::Set);

        let blank = PlaceholderPolicy::new([""]);
        assert_eq!(classify_value(Some("anything"), &blank), ValueState::Set);
    }
}
