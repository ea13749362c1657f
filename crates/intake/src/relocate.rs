//! Moving processed files out of the intake tree.
//!
//! Files land in a done or error tree mirroring their intake layout,
//! with ` (n)` collision suffixes, and the directories they vacate are
//! pruned back up toward the watched root.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::scan::is_hidden;

/// First name at `candidate`'s location that doesn't exist yet.
///
/// Appends ` (1)`, ` (2)`, ... before the extension until a free name is
/// found. Checked at call time; the filesystem may race us, but intake
/// trees have a single writer on the destination side.
pub fn resolve_collision(candidate: &Path) -> Result<PathBuf> {
    if !candidate.exists() {
        return Ok(candidate.to_path_buf());
    }
    let parent = candidate.parent().ok_or_raise(|| ErrorKind::NoParent(candidate.to_path_buf()))?;
    let stem = candidate.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = candidate.extension().map(|e| format!(".{}", e.to_string_lossy())).unwrap_or_default();
    for n in 1u32.. {
        let renamed = parent.join(format!("{stem} ({n}){ext}"));
        if !renamed.exists() {
            return Ok(renamed);
        }
    }
    unreachable!("u32 exhausted before finding a free filename")
}

/// Move `source` to `dest`, creating intermediate directories and
/// resolving filename collisions. Returns the path actually written.
///
/// A cross-device rename falls back to copy-then-delete; on a failed copy
/// the source file is left untouched.
pub fn relocate(source: &Path, dest: &Path) -> Result<PathBuf> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(ErrorKind::Io)?;
    }
    let dest = resolve_collision(dest)?;
    match fs::rename(source, &dest) {
        Ok(()) => {},
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(source, &dest).map_err(ErrorKind::Io)?;
            fs::remove_file(source).map_err(ErrorKind::Io)?;
        },
        Err(err) => return Err(ErrorKind::Io(err).into()),
    }
    Ok(dest)
}

/// Remove `dir` if everything left inside it is a hidden file. Returns
/// whether the directory was removed. Any subdirectory, hidden or not,
/// counts as real content. A directory that is already gone counts as
/// not removed.
fn remove_if_hidden_only(dir: &Path) -> io::Result<bool> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() || !is_hidden(&entry.file_name()) {
            return Ok(false);
        }
    }
    fs::remove_dir_all(dir)?;
    Ok(true)
}

/// Prune empty directories from `start` up to (excluding) `root`.
///
/// "Empty" tolerates hidden files: a directory holding only sync
/// droppings is still dead weight. Stops at the first directory that has
/// real content, since its ancestors necessarily have content too.
pub fn prune_upward(start: &Path, root: &Path) -> Result<()> {
    let mut current = start;
    while current != root && current.starts_with(root) {
        if !remove_if_hidden_only(current).map_err(ErrorKind::Io)? {
            break;
        }
        debug!(dir = %current.display(), "pruned empty intake directory");
        current = match current.parent() {
            Some(parent) => parent,
            None => break,
        };
    }
    Ok(())
}
