//! Error types for catalog generation and resource resolution

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the generator, the resolver, and the rebase utility
#[derive(Error, Debug)]
pub enum SvcError {
    /// The input document is missing required structure or cannot be parsed
    #[error("Malformed catalog input: {0}")]
    MalformedInput(String),

    /// Two different criteria minted the same identifier
    #[error("Identifier collision: {identifier} is minted by two criteria with different content ({first:?} and {second:?})")]
    IdentifierCollision {
        identifier: String,
        first: String,
        second: String,
    },

    /// Directory creation or artifact write failed while materializing a resource
    #[error("Failed to materialize {identifier} at {path}")]
    Filesystem {
        identifier: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file itself could not be read
    #[error("Failed to read catalog {path}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A request could not be answered after the resource was located
    #[error("Failed to resolve {path}")]
    Resolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value that must be an absolute URL did not parse
    #[error("Invalid URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SvcError {
    pub fn malformed(message: impl Into<String>) -> Self {
        SvcError::MalformedInput(message.into())
    }

    /// Whether the error was caused by the input document rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SvcError::MalformedInput(_) | SvcError::IdentifierCollision { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SvcError>;
