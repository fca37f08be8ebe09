use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("working directory {0} does not exist or is not a directory")]
    RootMissing(PathBuf),

    #[error("{path} resolves outside the working directory")]
    OutsideRoot { path: String },

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {reason}")]
    Dotenv { file: String, line: usize, reason: String },
}

impl EnvError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        EnvError::Io { path: path.into(), source }
    }
}
