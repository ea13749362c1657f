//! Deterministic enumeration of the intake tree.
//!
//! Processing order must be stable across a run because identifier
//! carry-over between files depends on it. Two layouts exist in the field:
//! older devices drop files straight into the watched root (flat), newer
//! ones write one directory per imaged subject (leaf-recursive).

use crate::error::{ErrorKind, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use trellis_config::ScanMode;

/// Dotfiles are sync droppings (.DS_Store and friends), never images.
pub(crate) fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(b".")
}

/// Non-hidden files directly inside `dir`, sorted by full path.
fn files_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(ErrorKind::Io)? {
        let entry = entry.map_err(ErrorKind::Io)?;
        let file_type = entry.file_type().map_err(ErrorKind::Io)?;
        if file_type.is_file() && !is_hidden(&entry.file_name()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Every directory under `root` (inclusive) that has zero subdirectories,
/// sorted by full path.
fn leaf_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let mut leaves = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut children = Vec::new();
        for entry in fs::read_dir(&current).map_err(ErrorKind::Io)? {
            let entry = entry.map_err(ErrorKind::Io)?;
            if entry.file_type().map_err(ErrorKind::Io)?.is_dir() {
                children.push(entry.path());
            }
        }
        if children.is_empty() {
            leaves.push(current);
        } else {
            stack.extend(children);
        }
    }
    leaves.sort();
    Ok(leaves)
}

/// Enumerate the files of `root` into a stable processing order.
///
/// Flat mode lists the immediate files of `root`; leaf-recursive mode
/// collects the files of every leaf directory, leaves in sorted order,
/// files sorted within each leaf. Hidden files are excluded in both modes.
/// A root with zero files yields an empty sequence, not an error.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use trellis_config::ScanMode;
/// use trellis_intake::scan::enumerate;
///
/// # fn example() -> trellis_intake::error::Result<()> {
/// let order = enumerate(Path::new("/data/unprocessed"), ScanMode::LeafRecursive)?;
/// for path in order {
///     println!("{}", path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub fn enumerate(root: &Path, mode: ScanMode) -> Result<Vec<PathBuf>> {
    match mode {
        ScanMode::Flat => files_sorted(root),
        ScanMode::LeafRecursive => {
            let mut paths = Vec::new();
            for leaf in leaf_directories(root)? {
                paths.extend(files_sorted(&leaf)?);
            }
            Ok(paths)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_flat_sorted_and_hidden_excluded() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        touch(&root.join("b.jpg"));
        touch(&root.join("a.jpg"));
        touch(&root.join(".DS_Store"));
        fs::create_dir(root.join("subdir")).unwrap();
        touch(&root.join("subdir/ignored.jpg"));
        let files = enumerate(root, ScanMode::Flat).unwrap();
        assert_eq!(files, vec![root.join("a.jpg"), root.join("b.jpg")]);
    }

    #[test]
    fn test_leaf_recursive_ordering() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        touch(&root.join("A/B/b2"));
        touch(&root.join("A/B/b1"));
        touch(&root.join("C/c1"));
        // A has a subdirectory, so its direct files are not enumerated.
        touch(&root.join("A/skipped.jpg"));
        let files = enumerate(root, ScanMode::LeafRecursive).unwrap();
        assert_eq!(files, vec![root.join("A/B/b1"), root.join("A/B/b2"), root.join("C/c1")]);
    }

    #[test]
    fn test_childless_root_is_its_own_leaf() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        touch(&root.join("direct.jpg"));
        let files = enumerate(root, ScanMode::LeafRecursive).unwrap();
        assert_eq!(files, vec![root.join("direct.jpg")]);
    }

    #[test]
    fn test_empty_root_is_not_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(enumerate(temp_dir.path(), ScanMode::Flat).unwrap().is_empty());
        assert!(enumerate(temp_dir.path(), ScanMode::LeafRecursive).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_errors() {
        assert!(enumerate(Path::new("/definitely/not/here"), ScanMode::Flat).is_err());
    }

    #[test]
    fn test_hidden_directory_blocks_leaf_status() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        touch(&root.join("A/photo.jpg"));
        fs::create_dir(root.join("A/.thumbnails")).unwrap();
        // A has a (hidden) subdirectory, so the hidden dir is the leaf and
        // A's own files are skipped.
        let files = enumerate(root, ScanMode::LeafRecursive).unwrap();
        assert!(files.is_empty());
    }
}
