use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use preflight_validate::{ValidatorOptions, DEFAULT_FILE_TIMEOUT};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Deployment directory; `~` and `$VARS` are expanded, relative paths are
    /// taken from the repo root.
    #[serde(default = "default_working_dir")]
    pub working_dir: String,
    /// Dotenv files relative to the working directory. Later files win.
    #[serde(default = "default_env_files")]
    pub env_files: Vec<String>,
    /// Process environment overrides dotenv values.
    #[serde(default = "default_true")]
    pub include_process_env: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RulesConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Declarative rule file, relative to the repo root. Wins over `profile`.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorConfig {
    #[serde(default = "default_timeout_ms")]
    pub file_timeout_ms: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_working_dir() -> String {
    ".".to_string()
}

fn default_env_files() -> Vec<String> {
    vec![".env".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_profile() -> String {
    "deploy".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_FILE_TIMEOUT.as_millis() as u64
}

fn default_workers() -> usize {
    1
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            env_files: default_env_files(),
            include_process_env: true,
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { profile: default_profile(), path: None }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { file_timeout_ms: default_timeout_ms(), workers: default_workers() }
    }
}

impl ValidatorConfig {
    pub fn options(&self) -> ValidatorOptions {
        ValidatorOptions {
            file_timeout: Duration::from_millis(self.file_timeout_ms),
            workers: self.workers.max(1),
        }
    }
}

impl Config {
    pub fn default_for_repo(project_id: &str) -> Self {
        Self {
            project: ProjectConfig { id: project_id.to_string() },
            environment: EnvironmentConfig::default(),
            rules: RulesConfig::default(),
            validator: ValidatorConfig::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| "parse preflight.toml")?;
        Ok(cfg)
    }

    /// Loads the repo config, or defaults when none has been written yet.
    pub fn load_or_default(repo_root: &Path) -> Result<Self> {
        let path = Self::config_path(repo_root);
        if path.exists() {
            return Self::load_from(&path);
        }
        let project_id = repo_root.file_name().and_then(|s| s.to_str()).unwrap_or("repo");
        Ok(Self::default_for_repo(project_id))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(".preflight").join("preflight.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_defaults() {
        let cfg: Config = toml::from_str("[project]\nid = \"app\"\n").unwrap();
        assert_eq!(cfg, Config::default_for_repo("app"));
        assert_eq!(cfg.validator.options().file_timeout, Duration::from_secs(3));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::config_path(dir.path());
        let mut cfg = Config::default_for_repo("app");
        cfg.rules.path = Some("rules.yaml".into());
        cfg.validator.workers = 4;
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.rules.profile, "deploy");
        assert!(!Config::config_path(dir.path()).exists());
    }

    #[test]
    fn zero_workers_is_clamped() {
        let v = ValidatorConfig { file_timeout_ms: 10, workers: 0 };
        assert_eq!(v.options().workers, 1);
    }
}
