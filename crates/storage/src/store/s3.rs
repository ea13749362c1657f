//! S3-compatible object store.
//!
//! Works against AWS S3 proper as well as S3-compatible services (MinIO is
//! what the greenhouse test rig runs).
//!
//! # Credentials
//!
//! Credentials are provided explicitly via the configuration file.
//!
//! TODO: Future iteration - support AWS SDK credential providers so actual
//! AWS deployments can use ~/.aws/credentials profiles instead of explicit
//! keys in config.json.

use crate::UploadMetadata;
use crate::error::{ErrorKind, Result};
use crate::key::validate as validate_key;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    primitives::ByteStream,
};
use std::path::Path;

/// S3-compatible object store.
///
/// # Examples
///
/// ```no_run
/// use trellis_storage::store::S3Store;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = S3Store::new(
///     "greenhouse-images",
///     "us-west-2",
///     None::<String>,
///     "access_key_id",
///     "secret_access_key",
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Create a new S3 object store.
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region or provider-specific region
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - AWS/provider access key ID
    /// * `key_secret` - AWS/provider secret access key
    pub fn new(
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(key_id, key_secret, None, None, "trellis-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // Configure retry policy with exponential backoff (1 initial + 3 retries)
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            // Use path-style addressing for better compatibility with
            // S3-compatible services (MinIO, etc.)
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(config_builder.build());
        Self { client, bucket: bucket.into() }
    }
}

#[async_trait::async_trait]
impl super::ObjectStore for S3Store {
    fn name(&self) -> &str {
        &self.bucket
    }

    async fn check(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| ErrorKind::Network(format!("bucket `{}` unreachable: {e}", self.bucket)))?;
        Ok(())
    }

    async fn upload(&self, local: &Path, key: &str, metadata: &UploadMetadata) -> Result<()> {
        let key = validate_key(key)?;
        // A file can vanish between scan and upload (externally deleted).
        // Surface that as NotFound so the pipeline can treat it per-file.
        if !tokio::fs::try_exists(local).await.map_err(ErrorKind::Io)? {
            exn::bail!(ErrorKind::NotFound(local.to_path_buf()));
        }
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| ErrorKind::BackendError(format!("could not stream `{}`: {e}", local.display())))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_metadata(Some(metadata.to_map()))
            .body(body)
            .send()
            .await
            .map_err(|e| ErrorKind::Network(format!("put_object `{key}` failed: {e}")))?;
        tracing::debug!(%key, local = %local.display(), "uploaded");
        Ok(())
    }
}
