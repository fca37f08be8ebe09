use std::fmt::Write;

use anyhow::Result;
use preflight_core::{Finding, ReportStatus, RuleSet, Severity};

use crate::PreflightRun;

fn label(f: &Finding) -> &'static str {
    match (f.passed, f.severity) {
        (true, _) => "PASS",
        (false, Severity::Blocking) => "FAIL",
        (false, Severity::Warning) => "WARN",
    }
}

/// Plain text, one line per finding plus hints and a summary line.
/// BLOCKED lists every finding; otherwise passing ones are folded into the
/// summary unless `verbose` is set.
pub fn render_text(run: &PreflightRun, verbose: bool) -> String {
    let report = &run.report;
    let show_passed = verbose || report.status() == ReportStatus::Blocked;
    let mut out = String::new();

    for f in report.findings() {
        if f.passed && !show_passed {
            continue;
        }
        let _ = writeln!(out, "{:<4} {:<24} {}", label(f), f.rule_id, f.message);
        if let Some(hint) = &f.hint {
            let _ = writeln!(out, "     hint: {}", hint);
        }
    }

    let c = report.counts();
    let _ = writeln!(
        out,
        "{}: {} checks, {} passed, {} blocking, {} warnings",
        report.status(),
        c.total,
        c.passed,
        c.blocking_failed,
        c.warning_failed
    );
    out
}

pub fn render_json(run: &PreflightRun) -> Result<String> {
    Ok(serde_json::to_string_pretty(run)?)
}

pub fn render_rules(rules: &RuleSet, fingerprint: &str) -> String {
    let mut out = String::new();
    for r in rules {
        let _ = writeln!(
            out,
            "{:<24} {:<24} {:<8} {}",
            r.id,
            r.kind.as_str(),
            r.severity.as_str(),
            r.target.describe()
        );
    }
    let _ = writeln!(out, "{} rules, fingerprint {}", rules.len(), fingerprint);
    out
}
