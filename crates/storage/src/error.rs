//! Storage Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong
/// internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The local file to upload does not exist (anymore).
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Underlying I/O error while reading the local file.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Network-related error (S3 connections, throttling, etc.)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Generated key is malformed (empty, absolute, traversal segments).
    #[display("invalid storage key: `{_0}`")]
    InvalidKey(#[error(not(source))] String),
    /// Backend-specific error that fits no other category.
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_) | Self::BackendError(_))
    }
}
