//! Intake Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// An intake error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for intake operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Per-file failure categories.
///
/// Everything here is caught at the batch boundary and resolved by routing
/// the file to the error tree; none of these abort a batch.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source path was expected to live under a root but doesn't.
    #[display("`{}` is not under `{}`", path.display(), root.display())]
    NotUnderRoot {
        #[error(not(source))]
        path: PathBuf,
        #[error(not(source))]
        root: PathBuf,
    },
    /// The derived identifier failed external validation.
    #[display("identifier `{_0}` does not match a known plant or container")]
    InvalidIdentifier(#[error(not(source))] String),
    /// The external validator could not be asked.
    #[display("identifier validation failed")]
    Validate,
    /// The upload call raised.
    #[display("upload failed")]
    Upload,
    /// The file has no containing directory to derive an identifier from.
    #[display("no containing directory for `{}`", _0.display())]
    NoParent(#[error(not(source))] PathBuf),
    /// A timestamp could not be rendered into its wire format.
    #[display("could not format timestamp")]
    Timestamp,
    /// Could not persist the intake state record.
    #[display("could not persist state to `{}`", _0.display())]
    State(#[error(not(source))] PathBuf),
    /// Underlying I/O error (scan, stat, move).
    #[display("I/O error: {_0}")]
    Io(IoError),
}

impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}
