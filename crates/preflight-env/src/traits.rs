use crate::EnvError;

/// Read-only view of the deployment environment: configuration keys plus
/// file access scoped to a working directory. Paths are relative to it.
pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn file_exists(&self, path: &str) -> Result<bool, EnvError>;

    fn read_to_string(&self, path: &str) -> Result<String, EnvError>;

    /// Called once before any rule is evaluated.
    fn check_available(&self) -> Result<(), EnvError> {
        Ok(())
    }
}
