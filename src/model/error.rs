use std::{io, path::PathBuf};

use thiserror::Error;

use crate::model::object::Operation;

pub type Result<T> = std::result::Result<T, Error>;

/// A failure reported by a storage SDK, flattened to its message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    pub not_found: bool,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            not_found: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            not_found: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to {operation} '{bucket}/{key}': {source}")]
    Storage {
        operation: Operation,
        bucket: String,
        key: String,
        #[source]
        source: BackendError,
    },

    #[error("local io failure at '{}': {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("object key '{key}' is not under prefix '{prefix}'")]
    RelativePath { key: String, prefix: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("background worker failed: {0}")]
    Join(String),
}

impl Error {
    pub fn storage(operation: Operation, bucket: &str, key: &str, source: BackendError) -> Self {
        Error::Storage {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            source,
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::LocalIo {
            path: path.into(),
            source,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }

    pub fn is_local_io(&self) -> bool {
        matches!(self, Error::LocalIo { .. })
    }
}
