use serde::{Deserialize, Serialize};

use crate::{ReportStatus, RuleKind, Severity};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub rule_id: String,
    pub kind: RuleKind,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
    /// The rule's remediation hint, carried verbatim on failure only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Finding {
    pub fn failed(&self) -> bool {
        !self.passed
    }

    pub fn is_blocking_failure(&self) -> bool {
        self.failed() && self.severity == Severity::Blocking
    }

    pub fn is_warning_failure(&self) -> bool {
        self.failed() && self.severity == Severity::Warning
    }
}

/// Derives the overall status from a list of findings.
pub fn derive_status(findings: &[Finding]) -> ReportStatus {
    if findings.iter().any(Finding::is_blocking_failure) {
        ReportStatus::Blocked
    } else if findings.iter().any(Finding::is_warning_failure) {
        ReportStatus::PassWithWarnings
    } else {
        ReportStatus::Pass
    }
}

/// Status is never read back from input; it is always derived from the
/// findings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawReport")]
pub struct Report {
    status: ReportStatus,
    findings: Vec<Finding>,
}

#[derive(Deserialize)]
struct RawReport {
    findings: Vec<Finding>,
}

impl From<RawReport> for Report {
    fn from(raw: RawReport) -> Self {
        Report::from_findings(raw.findings)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportCounts {
    pub total: usize,
    pub passed: usize,
    pub blocking_failed: usize,
    pub warning_failed: usize,
}

impl Report {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let status = derive_status(&findings);
        Self { status, findings }
    }

    pub fn status(&self) -> ReportStatus {
        self.status
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    pub fn blocking_failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_blocking_failure())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_warning_failure())
    }

    pub fn counts(&self) -> ReportCounts {
        ReportCounts {
            total: self.findings.len(),
            passed: self.findings.iter().filter(|f| f.passed).count(),
            blocking_failed: self.blocking_failures().count(),
            warning_failed: self.warnings().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(id: &str, passed: bool, severity: Severity) -> Finding {
        Finding {
            rule_id: id.to_string(),
            kind: RuleKind::KeyPresent,
            passed,
            severity,
            message: String::new(),
            hint: None,
        }
    }

    #[test]
    fn all_pass_is_pass() {
        let r = Report::from_findings(vec![
            finding("a", true, Severity::Blocking),
            finding("b", true, Severity::Warning),
        ]);
        assert_eq!(r.status(), ReportStatus::Pass);
    }

    #[test]
    fn failed_warning_alone_never_blocks() {
        let r = Report::from_findings(vec![
            finding("a", true, Severity::Blocking),
            finding("b", false, Severity::Warning),
            finding("c", false, Severity::Warning),
        ]);
        assert_eq!(r.status(), ReportStatus::PassWithWarnings);
        assert_eq!(r.warnings().count(), 2);
    }

    #[test]
    fn one_blocking_failure_dominates() {
        let r = Report::from_findings(vec![
            finding("a", true, Severity::Warning),
            finding("b", false, Severity::Warning),
            finding("c", false, Severity::Blocking),
        ]);
        assert_eq!(r.status(), ReportStatus::Blocked);
        let counts = r.counts();
        assert_eq!(
            counts,
            ReportCounts { total: 3, passed: 1, blocking_failed: 1, warning_failed: 1 }
        );
    }

    #[test]
    fn deserialized_status_is_derived_not_trusted() {
        let json = r#"{
            "status": "PASS",
            "findings": [{
                "rule_id": "db-password",
                "kind": "key_present",
                "passed": false,
                "severity": "blocking",
                "message": "DB_PASSWORD is empty"
            }]
        }"#;
        let r: Report = serde_json::from_str(json).unwrap();
        assert_eq!(r.status(), ReportStatus::Blocked);
        assert_eq!(r.blocking_failures().count(), 1);

        let round: Report = serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
        assert_eq!(round, r);
    }

    #[test]
    fn status_is_recomputed_from_findings() {
        let r = Report::from_findings(vec![finding("a", false, Severity::Blocking)]);
        assert_eq!(derive_status(r.findings()), r.status());
    }
}
