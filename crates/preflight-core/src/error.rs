use thiserror::Error;

/// The validator itself is misconfigured. Never reported as a Finding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rule set is empty")]
    EmptyRuleSet,

    #[error("rule #{index} has an empty id")]
    EmptyRuleId { index: usize },

    #[error("duplicate rule id: {0}")]
    DuplicateRuleId(String),

    #[error("rule {rule}: unsupported kind {kind:?}")]
    UnsupportedKind { rule: String, kind: String },

    #[error("rule {rule}: unsupported severity {severity:?}")]
    UnsupportedSeverity { rule: String, severity: String },

    #[error("rule {rule}: kind {kind} requires field `{field}`")]
    MissingField { rule: String, kind: String, field: &'static str },

    #[error("rule {rule}: field `{field}` must not be empty")]
    EmptyField { rule: String, field: &'static str },

    #[error("rule {rule}: target does not fit kind {kind}")]
    TargetMismatch { rule: String, kind: String },

    #[error("rule {rule}: path {path:?} escapes the working directory")]
    PathEscapesRoot { rule: String, path: String },

    #[error("environment unavailable: {0}")]
    EnvironmentUnavailable(String),
}
