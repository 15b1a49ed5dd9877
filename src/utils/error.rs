use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No archive matching '{mask}' found in {location}")]
    SourceNotFound { mask: String, location: String },

    #[error("Path unreachable: {path}")]
    PathUnreachable { path: PathBuf },

    #[error("Could not connect to {path} (code {code}): {reason}")]
    Connection {
        path: PathBuf,
        code: i32,
        reason: String,
    },

    #[error("Copy failed: {src} -> {dest}: {reason}")]
    CopyFailed {
        src: PathBuf,
        dest: PathBuf,
        reason: String,
    },

    #[error("Archive is corrupted: {path}")]
    VerificationFailed { path: PathBuf },

    #[error("Extraction failed: {path}: {reason}")]
    ExtractionFailed { path: PathBuf, reason: String },

    #[error("Delete failed: {path}: {reason}")]
    DeleteFailed { path: PathBuf, reason: String },

    #[error("Source archive lies inside destination: {path}")]
    SameSourceAndDest { path: PathBuf },

    #[error("Operation cancelled")]
    Cancelled,
}

impl UpdateError {
    /// 취소 여부
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UpdateError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;
