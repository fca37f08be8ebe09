use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use tracing::{debug, info, warn};

use preflight_core::{ConfigError, Finding, PlaceholderPolicy, Report, Rule, RuleSet};
use preflight_env::Environment;

use crate::check::{check_for, CheckOutcome};

pub const DEFAULT_FILE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Upper bound for each file-based check.
    pub file_timeout: Duration,
    /// Worker threads; 1 evaluates inline on the calling thread.
    pub workers: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self { file_timeout: DEFAULT_FILE_TIMEOUT, workers: 1 }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Validator {
    options: ValidatorOptions,
}

/// Validates with default options.
pub fn validate(rules: &RuleSet, env: Arc<dyn Environment>) -> Result<Report, ConfigError> {
    Validator::default().validate(rules, env)
}

impl Validator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Evaluates every rule and returns one Finding per rule, in rule order.
    /// Only a malformed rule set or an unavailable environment is an error.
    pub fn validate(
        &self,
        rules: &RuleSet,
        env: Arc<dyn Environment>,
    ) -> Result<Report, ConfigError> {
        rules.check()?;
        env.check_available()
            .map_err(|e| ConfigError::EnvironmentUnavailable(e.to_string()))?;

        let workers = self.options.workers.max(1).min(rules.len());
        let findings = if workers <= 1 {
            rules.iter().map(|rule| self.evaluate(rule, &rules.placeholder, &env)).collect()
        } else {
            self.evaluate_pooled(rules, &env, workers)
        };

        let report = Report::from_findings(findings);
        let counts = report.counts();
        info!(
            status = %report.status(),
            total = counts.total,
            passed = counts.passed,
            blocking_failed = counts.blocking_failed,
            warning_failed = counts.warning_failed,
            "preflight complete"
        );
        Ok(report)
    }

    /// Fixed-size pool pulling rule indices from a shared counter; results land
    /// in indexed slots so completion order never leaks into the report.
    fn evaluate_pooled(
        &self,
        rules: &RuleSet,
        env: &Arc<dyn Environment>,
        workers: usize,
    ) -> Vec<Finding> {
        let next = &AtomicUsize::new(0);
        let mut slots: Vec<Option<Finding>> = vec![None; rules.len()];

        std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                handles.push(scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let idx = next.fetch_add(1, Ordering::Relaxed);
                        let Some(rule) = rules.rules.get(idx) else { break };
                        done.push((idx, self.evaluate(rule, &rules.placeholder, env)));
                    }
                    done
                }));
            }

            for handle in handles {
                match handle.join() {
                    Ok(done) => {
                        for (idx, finding) in done {
                            slots[idx] = Some(finding);
                        }
                    }
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        slots.into_iter().flatten().collect()
    }

    fn evaluate(
        &self,
        rule: &Rule,
        placeholder: &PlaceholderPolicy,
        env: &Arc<dyn Environment>,
    ) -> Finding {
        let outcome = if rule.kind.is_file_based() {
            self.evaluate_with_timeout(rule, placeholder, env)
        } else {
            check_for(rule.kind).eval(rule, placeholder, &**env)
        };
        debug!(rule = %rule.id, kind = %rule.kind, passed = outcome.passed, "rule evaluated");

        Finding {
            rule_id: rule.id.clone(),
            kind: rule.kind,
            passed: outcome.passed,
            severity: rule.severity,
            hint: if outcome.passed { None } else { rule.hint.clone() },
            message: outcome.message,
        }
    }

    /// Runs the check on a detached thread so a hung read cannot stall the
    /// run. A late result is dropped with the channel.
    fn evaluate_with_timeout(
        &self,
        rule: &Rule,
        placeholder: &PlaceholderPolicy,
        env: &Arc<dyn Environment>,
    ) -> CheckOutcome {
        let (tx, rx) = mpsc::channel();
        let job_rule = rule.clone();
        let job_placeholder = placeholder.clone();
        let job_env = Arc::clone(env);

        let spawned = std::thread::Builder::new()
            .name(format!("preflight-{}", rule.id))
            .spawn(move || {
                let outcome = check_for(job_rule.kind).eval(&job_rule, &job_placeholder, &*job_env);
                let _ = tx.send(outcome);
            });
        if let Err(e) = spawned {
            return CheckOutcome::fail(format!("could not start file check: {}", e));
        }

        let timeout = self.options.file_timeout;
        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let timeout_ms = timeout.as_millis() as u64;
                warn!(rule = %rule.id, timeout_ms, "file check timed out");
                CheckOutcome::fail(format!(
                    "{} check timed out after {}ms",
                    rule.target.describe(),
                    timeout.as_millis()
                ))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let target = rule.target.describe();
                CheckOutcome::fail(format!("{} check aborted before producing a result", target))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_core::{ReportStatus, Severity};
    use preflight_env::InMemoryEnvironment;

    fn env(e: InMemoryEnvironment) -> Arc<dyn Environment> {
        Arc::new(e)
    }

    #[test]
    fn empty_rule_set_fails_fast() {
        let err = validate(&RuleSet::default(), env(InMemoryEnvironment::new())).unwrap_err();
        assert_eq!(err, ConfigError::EmptyRuleSet);
    }

    #[test]
    fn unavailable_environment_is_a_config_error() {
        let rules = RuleSet::new(vec![Rule::key_present("a", "A", Severity::Warning)]);
        let err = validate(&rules, env(InMemoryEnvironment::new().unavailable())).unwrap_err();
        assert!(matches!(err, ConfigError::EnvironmentUnavailable(_)));
    }

    #[test]
    fn hint_only_on_failure() {
        let rules = RuleSet::new(vec![
            Rule::key_present("a", "A", Severity::Warning).with_hint("set A"),
            Rule::key_present("b", "B", Severity::Warning).with_hint("set B"),
        ]);
        let e = InMemoryEnvironment::new().with_key("A", "real");
        let report = validate(&rules, env(e)).unwrap();
        assert_eq!(report.findings()[0].hint, None);
        assert_eq!(report.findings()[1].hint.as_deref(), Some("set B"));
        assert_eq!(report.status(), ReportStatus::PassWithWarnings);
    }

    #[test]
    fn slow_file_times_out_as_failed_finding() {
        let rules = RuleSet::new(vec![
            Rule::file_exists("slow", "slow.cfg", Severity::Warning),
            Rule::key_present("key", "A", Severity::Blocking),
        ]);
        let e = InMemoryEnvironment::new()
            .with_key("A", "value")
            .with_file("slow.cfg", "")
            .with_slow_path("slow.cfg", Duration::from_millis(500));
        let validator = Validator::new(ValidatorOptions {
            file_timeout: Duration::from_millis(50),
            workers: 1,
        });

        let report = validator.validate(&rules, env(e)).unwrap();
        let slow = &report.findings()[0];
        assert!(!slow.passed);
        assert_eq!(slow.severity, Severity::Warning);
        assert!(slow.message.contains("timed out"));
        assert!(report.findings()[1].passed);
        assert_eq!(report.status(), ReportStatus::PassWithWarnings);
    }

    #[test]
    fn pooled_evaluation_keeps_rule_order() {
        let mut rules = RuleSet::default();
        let mut e = InMemoryEnvironment::new();
        for i in 0..16 {
            let path = format!("f{i}.cfg");
            // earlier files are slower so completion order is reversed
            e = e
                .with_file(path.clone(), "x")
                .with_slow_path(path.clone(), Duration::from_millis((16 - i) * 5));
            rules.push(Rule::file_exists(format!("r{i}"), path, Severity::Blocking));
        }
        let validator = Validator::new(ValidatorOptions {
            file_timeout: Duration::from_secs(3),
            workers: 4,
        });

        let report = validator.validate(&rules, env(e)).unwrap();
        let ids: Vec<_> = report.findings().iter().map(|f| f.rule_id.clone()).collect();
        let expected: Vec<_> = (0..16).map(|i| format!("r{i}")).collect();
        assert_eq!(ids, expected);
        assert_eq!(report.status(), ReportStatus::Pass);
    }
}
