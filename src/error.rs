use crate::task::CategoryId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a [`CategoryId`] into a display name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("category not found: {0}")]
    NotFound(CategoryId),

    #[error("category lookup transport failure: {0}")]
    Transport(String),
}

impl ResolutionError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("no task to display")]
    MissingTask,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Card(#[from] CardError),
}
