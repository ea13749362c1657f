//! Scripted QR decoder for testing.

use crate::decode::QrDecoder;
use crate::error::{ErrorKind, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Scripted decoder for testing.
///
/// Maps file names (not full paths, so tests can use temp dirs) to the
/// codes "found" in them. Unknown files decode to nothing.
#[derive(Default)]
pub struct MockDecoder {
    codes: HashMap<String, Vec<String>>,
    fail: Mutex<bool>,
}

impl MockDecoder {
    /// Create a decoder scripted with `(file_name, codes)` pairs.
    pub fn with_codes(
        entries: impl IntoIterator<Item = (impl Into<String>, impl IntoIterator<Item = impl Into<String>>)>,
    ) -> Self {
        Self {
            codes: entries
                .into_iter()
                .map(|(name, codes)| (name.into(), codes.into_iter().map(Into::into).collect()))
                .collect(),
            fail: Mutex::new(false),
        }
    }

    /// Make every subsequent decode call fail (unreadable image).
    pub fn fail_calls(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

impl QrDecoder for MockDecoder {
    fn decode(&self, image: &Path) -> Result<Vec<String>> {
        if *self.fail.lock().unwrap() {
            exn::bail!(ErrorKind::UnreadableImage(image.to_path_buf()));
        }
        let name = image.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        Ok(self.codes.get(name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_codes() {
        let decoder = MockDecoder::with_codes([("y.jpg", ["S1"])]);
        assert_eq!(decoder.decode(Path::new("/any/dir/y.jpg")).unwrap(), vec!["S1".to_string()]);
        assert!(decoder.decode(Path::new("/any/dir/x.jpg")).unwrap().is_empty());
    }
}
