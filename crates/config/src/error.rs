//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configuration file could not be read or deserialized.
    #[display("could not load configuration: {_0}")]
    Load(#[error(not(source))] String),
    /// Two of the three directory roots point at the same path.
    #[display("directory roots must be pairwise distinct, `{}` appears twice", _0.display())]
    DuplicateRoot(#[error(not(source))] PathBuf),
    /// A directory root was given as a relative path.
    #[display("directory root must be absolute: `{}`", _0.display())]
    RelativeRoot(#[error(not(source))] PathBuf),
    /// A field holds a value outside its accepted range.
    #[display("invalid value for `{field}`: {reason}")]
    InvalidValue {
        #[error(not(source))]
        field: &'static str,
        #[error(not(source))]
        reason: String,
    },
}
