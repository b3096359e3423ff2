//! Typed errors for vault, index, mirror and assistant operations.
//!
//! Setup and CLI code paths use `anyhow`; everything reachable from an HTTP
//! handler returns [`CocoonError`] so the API layer can pick a status code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CocoonError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid user id: {0:?}")]
    InvalidUser(String),

    #[error("invalid note path: {0:?}")]
    InvalidPath(String),

    #[error("note not found: {0}")]
    NotFound(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("mirror sync failed: {0}")]
    Mirror(String),

    #[error("language model request failed: {0}")]
    Llm(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CocoonError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALID_INVALID_INPUT",
            Self::InvalidUser(_) => "VALID_INVALID_USER",
            Self::InvalidPath(_) => "VALID_INVALID_PATH",
            Self::NotFound(_) => "RESOURCE_NOT_FOUND",
            Self::Io { .. } => "SYSTEM_IO_ERROR",
            Self::Database(_) => "SYSTEM_DATABASE_ERROR",
            Self::Embedding(_) => "SYSTEM_EMBEDDING_ERROR",
            Self::Mirror(_) | Self::Llm(_) => "SYSTEM_EXTERNAL_SERVICE_ERROR",
            Self::Serialization(_) | Self::Internal(_) => "SYSTEM_INTERNAL_ERROR",
        }
    }
}

impl From<tokio::task::JoinError> for CocoonError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, CocoonError>;
