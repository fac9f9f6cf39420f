//! Error types shared by every pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaterError {
    /// An upstream stage has not produced a file this stage depends on.
    #[error("Missing input table '{table}' at {path}")]
    MissingInput { table: &'static str, path: PathBuf },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Gzip decode error: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RaterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RaterError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, RaterError>;
