//! Destination path and storage key construction.
//!
//! Pure functions: given a source path, produce the parallel local path
//! under a terminal root, or the object-storage key the file uploads
//! under. Nothing here touches the filesystem.

use crate::error::{ErrorKind, Result};
use rand::Rng;
use std::path::{Path, PathBuf};
use time::{Date, OffsetDateTime};
use trellis_config::KeyScheme;

/// Alphabet for random key suffixes and session tokens. Low entropy is
/// fine: the suffix only disambiguates same-named files within one key
/// partition, it is never used for lookup.
const TOKEN_ALPHABET: &[u8] = b"1234567890abcdef";
const TOKEN_LENGTH: usize = 10;

/// Today's date on the process-local calendar. The greenhouse machines run
/// in local time; fall back to UTC when the offset can't be determined
/// (sandboxed environments).
pub fn today() -> Date {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()).date()
}

/// A fresh 10-character random token.
pub fn random_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH).map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char).collect()
}

/// Spaces and parentheses in object keys are a known source of signed-URL
/// and Content-Disposition friction; strip them outright.
fn sanitize(filename: &str) -> String {
    filename.chars().filter(|c| !matches!(c, ' ' | '(' | ')')).collect()
}

fn stem_and_ext(path: &Path) -> (String, String) {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = path.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();
    (stem, ext)
}

/// Map `source_path` to the same relative location under `dest_root`.
///
/// `source_root` must be a component-wise prefix of `source_path`. With
/// `add_date_subdir`, today's date (`YYYY-MM-DD`, computed at call time)
/// is inserted directly after `dest_root`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use trellis_intake::path::parallel_path;
///
/// let dest = parallel_path(
///     Path::new("/data/in"),
///     Path::new("/data/done"),
///     Path::new("/data/in/cylinder42/leaf.jpg"),
///     false,
/// ).unwrap();
/// assert_eq!(dest, Path::new("/data/done/cylinder42/leaf.jpg"));
/// ```
pub fn parallel_path(source_root: &Path, dest_root: &Path, source_path: &Path, add_date_subdir: bool) -> Result<PathBuf> {
    let suffix = source_path.strip_prefix(source_root).map_err(|_| ErrorKind::NotUnderRoot {
        path: source_path.to_path_buf(),
        root: source_root.to_path_buf(),
    })?;
    let mut dest = dest_root.to_path_buf();
    if add_date_subdir {
        dest.push(today().to_string());
    }
    dest.push(suffix);
    Ok(dest)
}

/// Build the object-storage key for `source_path`.
///
/// Scheme A (partitioned):
/// `prefix/identifier/YYYY-MM-DD/stem_<token>.ext`, dated by the image's
/// creation timestamp, with a random token against same-name collisions;
/// the prefix is normalized to end in a slash. Scheme B (flat): the
/// prefix is concatenated verbatim with `stem-<uuid-v4>.ext`, globally
/// unique. Both sanitize the generated filename.
pub fn storage_key(
    scheme: KeyScheme,
    key_prefix: &str,
    source_path: &Path,
    identifier: &str,
    created: OffsetDateTime,
) -> String {
    let (stem, ext) = stem_and_ext(source_path);
    match scheme {
        KeyScheme::Partitioned => {
            let prefix = match key_prefix {
                "" => String::new(),
                p if p.ends_with('/') => p.to_string(),
                p => format!("{p}/"),
            };
            let filename = sanitize(&format!("{stem}_{}{ext}", random_token()));
            format!("{prefix}{identifier}/{}/{filename}", created.date())
        },
        KeyScheme::Flat => {
            let filename = sanitize(&format!("{stem}-{}{ext}", uuid::Uuid::new_v4()));
            format!("{key_prefix}{filename}")
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    #[test]
    fn test_parallel_path_without_date() {
        let dest = parallel_path(
            Path::new("/data/in"),
            Path::new("/data/err"),
            Path::new("/data/in/a/b/leaf.jpg"),
            false,
        )
        .unwrap();
        assert_eq!(dest, Path::new("/data/err/a/b/leaf.jpg"));
    }

    #[test]
    fn test_parallel_path_with_date() {
        let dest = parallel_path(
            Path::new("/data/in"),
            Path::new("/data/done"),
            Path::new("/data/in/leaf.jpg"),
            true,
        )
        .unwrap();
        let expected: PathBuf = [Path::new("/data/done"), Path::new(&today().to_string()), Path::new("leaf.jpg")]
            .iter()
            .collect();
        assert_eq!(dest, expected);
    }

    #[test]
    fn test_parallel_path_requires_prefix() {
        let err = parallel_path(
            Path::new("/data/in"),
            Path::new("/data/done"),
            Path::new("/elsewhere/leaf.jpg"),
            false,
        )
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotUnderRoot { .. }));
    }

    #[test]
    fn test_prefix_is_component_aware() {
        // "/data/in-other" starts with the string "/data/in" but is not
        // inside it.
        assert!(
            parallel_path(
                Path::new("/data/in"),
                Path::new("/data/done"),
                Path::new("/data/in-other/leaf.jpg"),
                false,
            )
            .is_err()
        );
    }

    #[test]
    fn test_partitioned_key_shape() {
        let key = storage_key(
            KeyScheme::Partitioned,
            "image/raw/cylinder/",
            Path::new("/in/cylinder42/leaf.jpg"),
            "cylinder42",
            datetime!(2020-05-17 12:00 UTC),
        );
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(&parts[..5], &["image", "raw", "cylinder", "cylinder42", "2020-05-17"]);
        let filename = parts[5];
        assert!(filename.starts_with("leaf_"));
        assert!(filename.ends_with(".jpg"));
        assert_eq!(filename.len(), "leaf_".len() + 10 + ".jpg".len());
    }

    #[rstest]
    #[case("image/raw/")]
    #[case("image/raw")]
    fn test_prefix_slash_normalized(#[case] prefix: &str) {
        let key = storage_key(
            KeyScheme::Partitioned,
            prefix,
            Path::new("/in/x/leaf.jpg"),
            "x",
            datetime!(2020-05-17 12:00 UTC),
        );
        assert!(key.starts_with("image/raw/x/2020-05-17/"));
    }

    #[test]
    fn test_flat_key_is_unique_per_call() {
        let a = storage_key(KeyScheme::Flat, "", Path::new("/in/leaf.jpg"), "", datetime!(2020-05-17 12:00 UTC));
        let b = storage_key(KeyScheme::Flat, "", Path::new("/in/leaf.jpg"), "", datetime!(2020-05-17 12:00 UTC));
        assert_ne!(a, b);
        assert!(a.starts_with("leaf-"));
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn test_flat_prefix_concatenated_verbatim() {
        // Flat prefixes are glued on as-is; "photos-" must not grow a
        // slash.
        let key = storage_key(KeyScheme::Flat, "photos-", Path::new("/in/leaf.jpg"), "", datetime!(2020-05-17 12:00 UTC));
        assert!(key.starts_with("photos-leaf-"));
        assert!(!key.contains('/'));
    }

    #[test]
    fn test_spaces_and_parens_stripped() {
        let key = storage_key(
            KeyScheme::Partitioned,
            "",
            Path::new("/in/x/file( )()().jpg"),
            "x",
            datetime!(2020-05-17 12:00 UTC),
        );
        assert!(!key.contains(' '));
        assert!(!key.contains('('));
        assert!(!key.contains(')'));
        assert!(key.starts_with("x/2020-05-17/file_"));
    }

    #[test]
    fn test_token_alphabet() {
        let token = random_token();
        assert_eq!(token.len(), 10);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
