//! Verification Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A verification error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for verification operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The validator backend could not be reached. Explicitly NOT the same
    /// as "invalid identifier"; callers must not conflate the two.
    #[display("validator transport error: {_0}")]
    Transport(#[error(not(source))] String),
    /// The backend answered with something outside the agreed contract.
    #[display("unexpected validator response: {_0}")]
    Protocol(#[error(not(source))] String),
    /// The image file could not be opened or parsed at all. A readable
    /// image that simply contains no QR code is not an error.
    #[display("could not read image: {}", _0.display())]
    UnreadableImage(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
