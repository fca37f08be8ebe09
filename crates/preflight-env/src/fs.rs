use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::traits::Environment;
use crate::EnvError;

/// Environment backed by a real directory and a resolved key map.
#[derive(Clone, Debug)]
pub struct FsEnvironment {
    root: PathBuf,
    keys: BTreeMap<String, String>,
}

impl FsEnvironment {
    pub fn new(root: impl Into<PathBuf>, keys: BTreeMap<String, String>) -> Self {
        Self { root: root.into(), keys }
    }

    /// Canonical location of `path`, or None when it does not exist.
    /// Symlinks leading out of the root are an error.
    fn resolve(&self, path: &str) -> Result<Option<PathBuf>, EnvError> {
        let resolved = match self.root.join(path).canonicalize() {
            Ok(p) => p,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EnvError::io(path, e)),
        };
        let root = self.root.canonicalize().map_err(|e| EnvError::io(path, e))?;
        if !resolved.starts_with(&root) {
            return Err(EnvError::OutsideRoot { path: path.to_string() });
        }
        Ok(Some(resolved))
    }
}

impl Environment for FsEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.keys.get(key).cloned()
    }

    fn file_exists(&self, path: &str) -> Result<bool, EnvError> {
        let exists = self.resolve(path)?.is_some();
        debug!(path, exists, "file_exists");
        Ok(exists)
    }

    fn read_to_string(&self, path: &str) -> Result<String, EnvError> {
        let not_found = || EnvError::io(path, io::Error::new(io::ErrorKind::NotFound, "not found"));
        let p = self.resolve(path)?.ok_or_else(not_found)?;
        std::fs::read_to_string(&p).map_err(|e| EnvError::io(path, e))
    }

    fn check_available(&self) -> Result<(), EnvError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(EnvError::RootMissing(self.root.clone()))
        }
    }
}

/// Snapshot of the process environment. Non-UTF-8 entries are skipped.
pub fn process_keys() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}
