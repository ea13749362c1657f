//! In-memory object store for testing.

use crate::UploadMetadata;
use crate::error::{ErrorKind, Result};
use crate::key::validate as validate_key;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ObjectStore;

/// One recorded call to [`MockStore::upload`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RecordedUpload {
    pub local: PathBuf,
    pub key: String,
    pub metadata: UploadMetadata,
}

/// In-memory object store for testing.
///
/// Records every upload behind a [`Mutex`] so trait methods operate on
/// `&self` without external synchronisation. Can be told to fail, to
/// exercise the pipeline's error routing.
///
/// # Examples
///
/// ```
/// use trellis_storage::store::MockStore;
///
/// let store = MockStore::default();
/// assert!(store.uploads().is_empty());
/// ```
#[derive(Default)]
pub struct MockStore {
    uploads: Mutex<Vec<RecordedUpload>>,
    fail: Mutex<bool>,
    unreachable: Mutex<bool>,
}

impl MockStore {
    /// Make every subsequent [`upload`](ObjectStore::upload) call fail.
    pub fn fail_uploads(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Make [`check`](ObjectStore::check) report the store as unreachable.
    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }

    /// Everything uploaded so far, in call order.
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn check(&self) -> Result<()> {
        if *self.unreachable.lock().unwrap() {
            exn::bail!(ErrorKind::Network("mock store marked unreachable".to_string()));
        }
        Ok(())
    }

    async fn upload(&self, local: &Path, key: &str, metadata: &UploadMetadata) -> Result<()> {
        let key = validate_key(key)?;
        if *self.fail.lock().unwrap() {
            exn::bail!(ErrorKind::Network("mock store told to fail".to_string()));
        }
        // The mock mirrors the real store's "file vanished" behaviour so
        // pipeline tests can exercise it.
        if !local.exists() {
            exn::bail!(ErrorKind::NotFound(local.to_path_buf()));
        }
        self.uploads.lock().unwrap().push(RecordedUpload {
            local: local.to_path_buf(),
            key: key.to_string(),
            metadata: metadata.clone(),
        });
        Ok(())
    }
}
