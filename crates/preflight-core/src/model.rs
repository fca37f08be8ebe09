use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Blocking,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocking => "blocking",
            Severity::Warning => "warning",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blocking" => Some(Severity::Blocking),
            "warning" => Some(Severity::Warning),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    KeyPresent,
    FileExists,
    PatternInFile,
    PatternAbsentInFile,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::KeyPresent,
        RuleKind::FileExists,
        RuleKind::PatternInFile,
        RuleKind::PatternAbsentInFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::KeyPresent => "key_present",
            RuleKind::FileExists => "file_exists",
            RuleKind::PatternInFile => "pattern_in_file",
            RuleKind::PatternAbsentInFile => "pattern_absent_in_file",
        }
    }

    /// Returns None for kinds this validator does not know how to evaluate.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Whether evaluating this kind touches the filesystem.
    pub fn is_file_based(&self) -> bool {
        !matches!(self, RuleKind::KeyPresent)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum ReportStatus {
    Pass,
    PassWithWarnings,
    Blocked,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pass => "PASS",
            ReportStatus::PassWithWarnings => "PASS-WITH-WARNINGS",
            ReportStatus::Blocked => "BLOCKED",
        }
    }

    /// Whether the pipeline may proceed to its next stage.
    pub fn may_proceed(&self) -> bool {
        !matches!(self, ReportStatus::Blocked)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
