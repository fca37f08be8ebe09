use std::collections::HashMap;
use std::io;
use std::time::Duration;

use crate::traits::Environment;
use crate::EnvError;

/// In-memory environment for tests. Files are plain strings keyed by their
/// relative path; a path can be made slow or unreadable to exercise the
/// validator's failure paths.
#[derive(Default, Clone)]
pub struct InMemoryEnvironment {
    keys: HashMap<String, String>,
    files: HashMap<String, String>,
    slow: HashMap<String, Duration>,
    unreadable: Vec<String>,
    unavailable: bool,
}

impl InMemoryEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(key.into(), value.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Every access to `path` sleeps for `delay` first.
    pub fn with_slow_path(mut self, path: impl Into<String>, delay: Duration) -> Self {
        self.slow.insert(path.into(), delay);
        self
    }

    /// `path` exists but reading it fails.
    pub fn with_unreadable(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.files.entry(path.clone()).or_default();
        self.unreadable.push(path);
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn delay(&self, path: &str) {
        if let Some(d) = self.slow.get(path) {
            std::thread::sleep(*d);
        }
    }
}

impl Environment for InMemoryEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.keys.get(key).cloned()
    }

    fn file_exists(&self, path: &str) -> Result<bool, EnvError> {
        self.delay(path);
        Ok(self.files.contains_key(path))
    }

    fn read_to_string(&self, path: &str) -> Result<String, EnvError> {
        self.delay(path);
        if self.unreadable.iter().any(|p| p == path) {
            let denied = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
            return Err(EnvError::io(path, denied));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| EnvError::io(path, io::Error::new(io::ErrorKind::NotFound, "not found")))
    }

    fn check_available(&self) -> Result<(), EnvError> {
        if self.unavailable {
            return Err(EnvError::RootMissing("<memory>".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_keys_and_files() {
        let env = InMemoryEnvironment::new()
            .with_key("DB_PASSWORD", "s3cr3t")
            .with_file("docker-compose.yml", "TZ=Europe/Luxembourg\n");
        assert_eq!(env.get("DB_PASSWORD").as_deref(), Some("s3cr3t"));
        assert_eq!(env.get("JWT_SECRET"), None);
        assert!(env.file_exists("docker-compose.yml").unwrap());
        assert!(!env.file_exists("missing.yml").unwrap());
        assert!(env.read_to_string("docker-compose.yml").unwrap().contains("TZ="));
    }

    #[test]
    fn unreadable_file_exists_but_fails_to_read() {
        let env = InMemoryEnvironment::new().with_unreadable("locked.cfg");
        assert!(env.file_exists("locked.cfg").unwrap());
        assert!(matches!(env.read_to_string("locked.cfg"), Err(EnvError::Io { .. })));
    }
}
