use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Batch-level failures. Per-document failures are reported as
/// [`DocumentFailure`](crate::report::DocumentFailure) values instead.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern load failed for {path}: {reason}")]
    PatternLoad { path: PathBuf, reason: String },

    #[error("Malformed input: {count} record(s) rejected, first at {first}")]
    MalformedInput { count: usize, first: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Input location not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Output location already exists: {0}")]
    OutputExists(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    pub fn pattern_load<E: std::fmt::Display>(path: impl AsRef<Path>, e: E) -> Self {
        Self::PatternLoad {
            path: path.as_ref().to_path_buf(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = OrchestratorError::io(
            "/data/part-0",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/data/part-0"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn test_pattern_load_error() {
        let err = OrchestratorError::pattern_load("pattern.txt", "expected exactly one graph, found 2");
        assert_eq!(
            err.to_string(),
            "Pattern load failed for pattern.txt: expected exactly one graph, found 2"
        );
    }
}
