// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for sagfs plugins

use thiserror::Error;

/// Result type alias
pub type SagfsResult<T> = Result<T, SagfsError>;

/// Main error type
#[derive(Error, Debug)]
pub enum SagfsError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Plugin is not connected")]
    NotConnected,

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error ({backend}): {message}")]
    Backend { backend: String, message: String },
}

impl SagfsError {
    /// True when the error means the entry vanished, which the change bridge
    /// treats as a benign race between a raw event and its re-stat.
    pub fn is_transient(&self) -> bool {
        match self {
            SagfsError::NotFound(_) => true,
            SagfsError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, SagfsError::Configuration(_))
    }

    /// Map an I/O error on `path` into the taxonomy, keeping `NotFound` distinct.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SagfsError::NotFound(path.to_string()),
            _ => SagfsError::Io(err),
        }
    }

    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        SagfsError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
