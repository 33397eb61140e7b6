//! Error types for sift operations.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),
}

impl Error {
    /// Shorthand for building a [`Error::MalformedQuery`].
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedQuery(msg.into())
    }

    /// True when the failure was caused by client-supplied query text.
    ///
    /// Callers should answer these with a client error and not report them
    /// as server-side faults.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::MalformedQuery(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
