//! Batch orchestration.
//!
//! One batch enumerates the watched root, then walks the files in order:
//! resolve the identifier, upload, file away under the done tree, or
//! under the error tree when anything per-file goes wrong. A batch never
//! fails as a whole; every discovered file ends up in exactly one
//! terminal location.

use crate::error::{ErrorKind, Result};
use crate::path::{parallel_path, random_token, storage_key};
use crate::relocate::{prune_upward, relocate};
use crate::resolver::IdentifierResolver;
use crate::scan::enumerate;
use async_trait::async_trait;
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};
use trellis_config::{Config, KeyScheme, ScanMode};
use trellis_storage::{StoreHandle, UploadMetadata};

use crate::debounce::BatchRunner;

/// The intake pipeline: everything one batch run needs, wired once at
/// startup and shared with the scheduler.
pub struct Pipeline {
    watched_root: PathBuf,
    done_root: PathBuf,
    error_root: PathBuf,
    device_id: String,
    scan_mode: ScanMode,
    key_scheme: KeyScheme,
    key_prefix: String,
    store: StoreHandle,
    resolver: IdentifierResolver,
}

impl Pipeline {
    pub fn new(config: &Config, store: StoreHandle, resolver: IdentifierResolver) -> Self {
        Self {
            watched_root: config.unprocessed_dir.clone(),
            done_root: config.done_dir.clone(),
            error_root: config.error_dir.clone(),
            device_id: config.upload_device_id.clone(),
            scan_mode: config.scan_mode,
            key_scheme: config.key_scheme,
            key_prefix: config.s3.key_prefix.clone(),
            store,
            resolver,
        }
    }

    /// Run one batch over the current contents of the watched root.
    ///
    /// Sequential by design: upload order determines the identifier
    /// carry-over between files.
    pub async fn run_batch(&self) {
        let files = match enumerate(&self.watched_root, self.scan_mode) {
            Ok(files) => files,
            Err(error) => {
                error!(root = %self.watched_root.display(), %error, "could not enumerate intake tree");
                return;
            },
        };
        if files.is_empty() {
            return;
        }
        info!(count = files.len(), files = ?files, "batch started");
        let session = random_token();
        for file in &files {
            match self.process_file(file, &session).await {
                Ok(key) => {
                    info!(file = %file.display(), %key, "uploaded");
                    self.file_away(file, &self.done_root);
                },
                Err(error) => {
                    error!(file = %file.display(), %error, "processing failed, routing to error tree");
                    self.file_away(file, &self.error_root);
                },
            }
        }
        info!(count = files.len(), "batch finished");
    }

    /// Resolve, build metadata, upload. Returns the storage key written.
    async fn process_file(&self, file: &Path, session: &str) -> Result<String> {
        let resolution = self.resolver.resolve(file).await?;
        let created = file_created(file)?;
        let key = storage_key(self.key_scheme, &self.key_prefix, file, &resolution.identifier, created);
        let metadata = UploadMetadata {
            user_input_filename: file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            upload_device_id: self.device_id.clone(),
            upload_session: session.to_string(),
            identifier: resolution.identifier,
            file_created: created.format(&Rfc3339).map_err(|_| ErrorKind::Timestamp)?,
            raw_identifiers: resolution.raw_identifiers,
        };
        self.store.upload(file, &key, &metadata).await.or_raise(|| ErrorKind::Upload)?;
        Ok(key)
    }

    /// Move `file` to its parallel path under `dest_root` and prune the
    /// directories it vacated. A failed move is logged and the file stays
    /// where it is, to be retried by a later batch. This is the one place
    /// pruning errors are deliberately dropped: cleanup of emptied
    /// directories is cosmetic and must never fail a file that already
    /// reached its terminal location.
    fn file_away(&self, file: &Path, dest_root: &Path) {
        let dest = match parallel_path(&self.watched_root, dest_root, file, true) {
            Ok(dest) => dest,
            Err(error) => {
                error!(file = %file.display(), %error, "file is outside the watched root, leaving in place");
                return;
            },
        };
        match relocate(file, &dest) {
            Ok(written) => info!(file = %file.display(), dest = %written.display(), "filed away"),
            Err(error) => {
                warn!(file = %file.display(), %error, "could not move file, leaving for the next batch");
                return;
            },
        }
        if let Some(parent) = file.parent() {
            let _ = prune_upward(parent, &self.watched_root);
        }
    }
}

/// File creation timestamp, falling back to mtime on filesystems that
/// don't record a birth time.
fn file_created(file: &Path) -> Result<OffsetDateTime> {
    let meta = fs::metadata(file).map_err(ErrorKind::Io)?;
    let stamp = meta.created().or_else(|_| meta.modified()).map_err(ErrorKind::Io)?;
    Ok(OffsetDateTime::from(stamp))
}

#[async_trait]
impl BatchRunner for Pipeline {
    async fn run(&self) {
        self.run_batch().await;
    }
}
