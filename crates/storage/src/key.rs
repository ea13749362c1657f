//! Storage-key validation.
//!
//! Keys are generated by the intake pipeline, but every backend still
//! validates them before use so a bug upstream can't write objects to
//! surprising places.

use crate::error::{ErrorKind, Result};

/// Validates a generated object-storage key.
///
/// Keys are `/`-separated like paths but are plain strings as far as the
/// object store is concerned. Rejected: empty keys, empty segments (leading
/// `/`, doubled `//`, trailing `/`), `.`/`..` segments, and null bytes.
///
/// # Examples
///
/// ```
/// use trellis_storage::validate_key;
/// assert!(validate_key("image/raw/cylinder42/2024-05-17/leaf_4f9zd13a42.jpg").is_ok());
/// assert!(validate_key("/absolute").is_err());
/// assert!(validate_key("a/../b").is_err());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate(key: &str) -> Result<&str> {
    if key.is_empty() || key.contains('\0') {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            exn::bail!(ErrorKind::InvalidKey(key.to_string()));
        }
    }
    Ok(key)
}
