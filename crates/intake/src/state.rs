//! Durable carry-over state.
//!
//! The last accepted identifier survives restarts so a batch interrupted
//! mid-tray resumes stamping the right subject. A single tiny JSON file,
//! rewritten on every acceptance.

use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateRecord {
    last_accepted: String,
}

/// Reads and rewrites the carry-over record at a fixed path.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The persisted identifier, or the empty sentinel when the file is
    /// missing or unreadable. Corrupt state is not worth dying over: the
    /// next accepted code overwrites it.
    pub fn load(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<StateRecord>(&raw) {
                Ok(record) => record.last_accepted,
                Err(error) => {
                    warn!(path = %self.path.display(), %error, "state file is corrupt, starting empty");
                    String::new()
                },
            },
            Err(_) => String::new(),
        }
    }

    /// Persist `identifier` as the new carry-over value.
    pub fn store(&self, identifier: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|_| ErrorKind::State(self.path.clone()))?;
        }
        let record = StateRecord { last_accepted: identifier.to_string() };
        let json = serde_json::to_string(&record).map_err(|_| ErrorKind::State(self.path.clone()))?;
        fs::write(&self.path, json).map_err(|_| ErrorKind::State(self.path.clone()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(temp_dir.path().join("state.json"));
        state.store("cylinder42").unwrap();
        assert_eq!(state.load(), "cylinder42");
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let state = StateFile::new("/nonexistent/state.json");
        assert_eq!(state.load(), "");
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("state.json");
        fs::write(&path, b"not json at all").unwrap();
        assert_eq!(StateFile::new(&path).load(), "");
    }

    #[test]
    fn test_store_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(temp_dir.path().join("deep/nested/state.json"));
        state.store("tray7").unwrap();
        assert_eq!(state.load(), "tray7");
    }
}
