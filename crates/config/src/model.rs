//! Configuration model.
//!
//! The on-disk format is a single JSON document (historically `config.json`
//! next to the binary), optionally overridden by `TRELLIS_`-prefixed
//! environment variables. See [`load`](crate::load).

use crate::error::{ErrorKind, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_heartbeat_seconds() -> u64 {
    60
}

/// How many seconds to wait after the most recent file arrival before a
/// batch fires. Matches the imaging devices' worst observed gap between
/// two writes of the same burst.
fn default_debounce_seconds() -> u64 {
    10
}

fn default_send_interval_seconds() -> u64 {
    5
}

fn default_log_group() -> String {
    "trellis".to_string()
}

/// How the intake tree is enumerated into a processing order.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Only the immediate files of the watched root, sorted by path.
    Flat,
    /// Files of every leaf directory (a directory with zero subdirectories),
    /// leaves sorted first, files sorted within each leaf.
    #[default]
    LeafRecursive,
}

/// Where a file's plant/container identifier comes from.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierStrategy {
    /// The name of the file's containing directory, validated up front.
    #[default]
    Path,
    /// QR codes decoded from the image content, with carry-over of the last
    /// accepted identifier for files that carry none.
    Content,
}

/// Layout of generated object-storage keys.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    /// `prefix/identifier/YYYY-MM-DD/stem_suffix.ext`
    #[default]
    Partitioned,
    /// `prefix` + `stem-<uuid-v4>.ext`, globally unique, no partitioning.
    Flat,
}

/// Credentials and region shared by every AWS client the daemon builds.
#[derive(Clone, Debug, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    /// Key prefix under which every upload lands ("virtual directory").
    #[serde(default)]
    pub key_prefix: String,
    /// Custom endpoint for S3-compatible services (MinIO in the test rig).
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Which backend answers "is this identifier a known plant/container?".
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum ValidatorConfig {
    /// Invoke the preflight Lambda function.
    Lambda { function_arn: String },
    /// Look the identifier up in the registry database directly.
    Database { url: String },
}

/// Remote log shipping to CloudWatch Logs. Off by default.
#[derive(Clone, Debug, Deserialize)]
pub struct CloudWatchConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_log_group")]
    pub log_group: String,
    #[serde(default = "default_log_group")]
    pub stream_name: String,
    #[serde(default = "default_send_interval_seconds")]
    pub send_interval_seconds: u64,
}

impl Default for CloudWatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_group: default_log_group(),
            stream_name: default_log_group(),
            send_interval_seconds: default_send_interval_seconds(),
        }
    }
}

/// Top-level daemon configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Intake directory the imaging devices drop files into.
    pub unprocessed_dir: PathBuf,
    /// Terminal root for files that failed processing.
    pub error_dir: PathBuf,
    /// Terminal root for files that uploaded successfully.
    pub done_dir: PathBuf,
    /// Identifies this machine in upload metadata and validation requests.
    pub upload_device_id: String,
    #[serde(default)]
    pub log_heartbeat: bool,
    #[serde(default = "default_heartbeat_seconds")]
    pub heartbeat_seconds: u64,
    #[serde(default = "default_debounce_seconds")]
    pub debounce_seconds: u64,
    #[serde(default)]
    pub scan_mode: ScanMode,
    #[serde(default)]
    pub identifier_strategy: IdentifierStrategy,
    #[serde(default)]
    pub key_scheme: KeyScheme,
    /// Where the last-accepted identifier is persisted. Defaults to the
    /// platform data directory.
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    pub aws: AwsConfig,
    pub s3: S3Config,
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub cloudwatch: CloudWatchConfig,
}

impl Config {
    /// Check the invariants that can be decided without touching the
    /// network: the three roots are absolute and pairwise distinct, and the
    /// timing knobs are sane.
    pub fn validate(&self) -> Result<()> {
        let roots = [&self.unprocessed_dir, &self.error_dir, &self.done_dir];
        for root in roots {
            if !root.is_absolute() {
                exn::bail!(ErrorKind::RelativeRoot(root.clone()));
            }
        }
        for (i, a) in roots.iter().enumerate() {
            for b in roots.iter().skip(i + 1) {
                if a == b {
                    exn::bail!(ErrorKind::DuplicateRoot((*a).clone()));
                }
            }
        }
        if self.heartbeat_seconds == 0 {
            exn::bail!(ErrorKind::InvalidValue {
                field: "heartbeat_seconds",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.debounce_seconds == 0 {
            exn::bail!(ErrorKind::InvalidValue {
                field: "debounce_seconds",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Resolved location of the persisted-state file.
    pub fn state_path(&self) -> PathBuf {
        self.state_path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "trellis")
                .map(|dirs| dirs.data_dir().join("state.json"))
                // No home directory to speak of; keep state next to the cwd.
                .unwrap_or_else(|| PathBuf::from("trellis-state.json"))
        })
    }

    /// The containing directory the imaging device writes into, exposed for
    /// the filesystem listener.
    pub fn watched_root(&self) -> &Path {
        &self.unprocessed_dir
    }
}
