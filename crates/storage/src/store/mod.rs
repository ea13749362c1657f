//! Object store trait and implementations.
//!
//! This module defines the `ObjectStore` trait: the narrow upload contract
//! the intake pipeline holds against object storage. A backend either
//! stores the file durably under the requested key with the requested
//! metadata, or it errors; no partial-upload state leaks out.

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "mock")]
pub use self::mock::MockStore;
#[cfg(feature = "s3")]
pub use self::s3::S3Store;
use crate::UploadMetadata;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Narrow upload interface against object storage.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use trellis_storage::{ObjectStore, UploadMetadata, error::Result};
///
/// async fn push(store: &dyn ObjectStore, metadata: &UploadMetadata) -> Result<()> {
///     store
///         .upload(
///             Path::new("/intake/cylinder42/leaf.jpg"),
///             "image/raw/cylinder42/2024-05-17/leaf_4f9zd13a42.jpg",
///             metadata,
///         )
///         .await
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Cheap reachability probe, called once during startup validation.
    ///
    /// An error here is fatal: the daemon refuses to enter its event loop
    /// when it can't possibly upload anything.
    async fn check(&self) -> Result<()>;

    /// Upload the local file at `local` under `key`, attaching `metadata`.
    ///
    /// On success the object is durably stored; on error nothing observable
    /// happened on the remote side that the pipeline needs to clean up.
    async fn upload(&self, local: &Path, key: &str, metadata: &UploadMetadata) -> Result<()>;
}
