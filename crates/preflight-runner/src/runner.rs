use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use preflight_core::{Report, ReportStatus, RuleSet};
use preflight_env::{load_dotenv, process_keys, FsEnvironment};
use preflight_rules::{fingerprint, load_rule_set, rule_set_for_profile, save_rule_set, PROFILES};
use preflight_validate::Validator;

use crate::{util::now_unix, Config};

pub const STARTER_RULES_FILE: &str = "preflight-rules.yaml";

/// Where the rule set for a run comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleSource {
    Configured,
    Profile(String),
    File(PathBuf),
}

/// One validation run as seen by the orchestration layer.
#[derive(Clone, Debug, Serialize)]
pub struct PreflightRun {
    pub run_id: String,
    pub project_id: String,
    pub rule_set_fingerprint: String,
    pub checked_at_unix: i64,
    pub report: Report,
}

pub struct Runner {
    pub repo_root: PathBuf,
    pub cfg: Config,
}

impl Runner {
    pub fn open(repo_root: PathBuf) -> Result<Self> {
        let cfg = Config::load_or_default(&repo_root)?;
        Ok(Self { repo_root, cfg })
    }

    /// Writes `.preflight/preflight.toml` and a starter rule file from the
    /// `deploy` profile. Existing files are left alone.
    pub fn init_repo(repo_root: &Path) -> Result<()> {
        let cfg_path = Config::config_path(repo_root);
        let rules_path = repo_root.join(STARTER_RULES_FILE);

        if !rules_path.exists() {
            let set = rule_set_for_profile("deploy")
                .ok_or_else(|| anyhow!("missing built-in deploy profile"))?;
            save_rule_set(&set, &rules_path)?;
        }
        if !cfg_path.exists() {
            let project_id = repo_root.file_name().and_then(|s| s.to_str()).unwrap_or("repo");
            let mut cfg = Config::default_for_repo(project_id);
            cfg.rules.path = Some(STARTER_RULES_FILE.to_string());
            cfg.save_to(&cfg_path)?;
        }
        Ok(())
    }

    pub fn working_dir(&self) -> Result<PathBuf> {
        let raw = &self.cfg.environment.working_dir;
        let expanded =
            shellexpand::full(raw).with_context(|| format!("expand working_dir {:?}", raw))?;
        Ok(self.repo_root.join(expanded.as_ref()))
    }

    /// Dotenv files in order, then the process environment on top.
    /// A missing dotenv file is skipped; a malformed one is an error.
    pub fn load_keys(&self, working_dir: &Path) -> Result<BTreeMap<String, String>> {
        let mut keys = BTreeMap::new();
        for file in &self.cfg.environment.env_files {
            let path = working_dir.join(file);
            if !path.exists() {
                warn!(path = %path.display(), "env file not found; skipping");
                continue;
            }
            let loaded = load_dotenv(&path)
                .with_context(|| format!("load env file {}", path.display()))?;
            debug!(path = %path.display(), keys = loaded.len(), "env file loaded");
            keys.extend(loaded);
        }
        if self.cfg.environment.include_process_env {
            keys.extend(process_keys());
        }
        Ok(keys)
    }

    pub fn environment(&self) -> Result<FsEnvironment> {
        let working_dir = self.working_dir()?;
        let keys = self.load_keys(&working_dir)?;
        Ok(FsEnvironment::new(working_dir, keys))
    }

    pub fn rule_set(&self, source: &RuleSource) -> Result<RuleSet> {
        match source {
            RuleSource::File(path) => load_rule_set(&self.repo_root.join(path)),
            RuleSource::Profile(name) => profile(name),
            RuleSource::Configured => match &self.cfg.rules.path {
                Some(path) => load_rule_set(&self.repo_root.join(path)),
                None => profile(&self.cfg.rules.profile),
            },
        }
    }

    pub fn check(&self, source: &RuleSource) -> Result<PreflightRun> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("preflight", run_id = %run_id, project = %self.cfg.project.id);
        let _guard = span.enter();

        let rules = self.rule_set(source)?;
        let rule_set_fingerprint = fingerprint(&rules)?;
        info!(rules = rules.len(), fingerprint = %rule_set_fingerprint, "rule set loaded");

        let env = self.environment()?;
        let validator = Validator::new(self.cfg.validator.options());
        let report = validator
            .validate(&rules, Arc::new(env))
            .context("preflight configuration error")?;

        Ok(PreflightRun {
            run_id,
            project_id: self.cfg.project.id.clone(),
            rule_set_fingerprint,
            checked_at_unix: now_unix(),
            report,
        })
    }
}

fn profile(name: &str) -> Result<RuleSet> {
    rule_set_for_profile(name).ok_or_else(|| {
        anyhow!("unknown profile {:?}; expected one of {}", name, PROFILES.join(", "))
    })
}

/// Process exit code the CLI uses for a finished run.
pub fn exit_code(status: ReportStatus) -> i32 {
    if status.may_proceed() {
        0
    } else {
        1
    }
}

/// Exit code for runs that never produced a report.
pub const CONFIG_ERROR_EXIT_CODE: i32 = 2;
