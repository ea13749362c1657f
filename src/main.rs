//! The trellis daemon.
//!
//! Startup order matters: configuration first (fail fast on structural
//! problems), then telemetry, then reachability probes against the object
//! store and the validator, and only then the event loop. An initial batch
//! is armed immediately so files that arrived while the daemon was down
//! are picked up without waiting for a new event.

mod error;
mod telemetry;
mod watch;

use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use trellis_config::{Config, IdentifierStrategy, ValidatorConfig};
use trellis_intake::{DebounceScheduler, IdentifierResolver, Pipeline, StateFile};
use trellis_storage::StoreHandle;
use trellis_storage::store::S3Store;
use trellis_verify::ValidatorHandle;
use trellis_verify::decode::ImageDecoder;
use trellis_verify::validator::{DbValidator, LambdaValidator};

#[derive(Debug, Parser)]
#[command(name = "trellis", version, about = "Greenhouse image intake daemon")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("trellis: {error:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = trellis_config::load(&cli.config).or_raise(|| ErrorKind::Config)?;
    let _telemetry = telemetry::init(&config.aws, &config.cloudwatch);

    let store = build_store(&config);
    store.check().await.or_raise(|| ErrorKind::Connectivity("object store"))?;
    let validator = build_validator(&config).await?;
    validator.check().await.or_raise(|| ErrorKind::Connectivity("identifier validator"))?;

    let state = StateFile::new(config.state_path());
    let resolver = match config.identifier_strategy {
        IdentifierStrategy::Path => IdentifierResolver::path_derived(validator, &config.upload_device_id, state),
        IdentifierStrategy::Content => {
            IdentifierResolver::content_derived(validator, Arc::new(ImageDecoder), &config.upload_device_id, state)
        },
    };
    let pipeline = Arc::new(Pipeline::new(&config, store, resolver));
    let scheduler = Arc::new(DebounceScheduler::new(pipeline, Duration::from_secs(config.debounce_seconds)));

    // Catch up on anything deposited while we were down.
    scheduler.arm().await;
    let _watcher = watch::spawn(config.watched_root(), Arc::clone(&scheduler))?;
    info!(root = %config.watched_root().display(), "watching for new files");

    idle(&config).await;
    info!("interrupt received, shutting down");
    scheduler.shutdown().await;
    Ok(())
}

fn build_store(config: &Config) -> StoreHandle {
    Arc::new(S3Store::new(
        &config.s3.bucket,
        &config.aws.region,
        config.s3.endpoint.clone(),
        &config.aws.access_key_id,
        &config.aws.secret_access_key,
    ))
}

async fn build_validator(config: &Config) -> Result<ValidatorHandle> {
    Ok(match &config.validator {
        ValidatorConfig::Lambda { function_arn } => Arc::new(LambdaValidator::new(
            function_arn,
            &config.aws.region,
            &config.aws.access_key_id,
            &config.aws.secret_access_key,
        )),
        ValidatorConfig::Database { url } => {
            Arc::new(DbValidator::connect(url).await.or_raise(|| ErrorKind::Connectivity("registry database"))?)
        },
    })
}

/// Block until interrupted, optionally proving liveness in the logs.
async fn idle(config: &Config) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.heartbeat_seconds));
    ticker.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                if config.log_heartbeat {
                    info!("heartbeat");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use trellis_config::{KeyScheme, ScanMode};
    use trellis_storage::store::MockStore;
    use trellis_verify::validator::MockValidator;

    fn config(root: &std::path::Path) -> Config {
        Config {
            unprocessed_dir: root.join("in"),
            error_dir: root.join("err"),
            done_dir: root.join("done"),
            upload_device_id: "greenhouse-3".to_string(),
            log_heartbeat: false,
            heartbeat_seconds: 60,
            debounce_seconds: 10,
            scan_mode: ScanMode::LeafRecursive,
            identifier_strategy: IdentifierStrategy::Path,
            key_scheme: KeyScheme::Partitioned,
            state_path: Some(root.join("state.json")),
            aws: trellis_config::AwsConfig {
                region: "eu-west-1".to_string(),
                access_key_id: "test".to_string(),
                secret_access_key: "test".to_string(),
            },
            s3: trellis_config::S3Config {
                bucket: "photos".to_string(),
                key_prefix: "image/raw".to_string(),
                endpoint: None,
            },
            validator: ValidatorConfig::Lambda { function_arn: "arn:test".to_string() },
            cloudwatch: Default::default(),
        }
    }

    #[test]
    fn test_cli_defaults_to_config_json() {
        let cli = Cli::parse_from(["trellis"]);
        assert_eq!(cli.config, PathBuf::from("config.json"));
    }

    #[tokio::test]
    async fn test_lambda_validator_builds_without_touching_the_network() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(build_validator(&config(temp_dir.path())).await.is_ok());
    }

    // The same wiring `run` performs, with the network collaborators
    // mocked out: an armed scheduler fires one batch that uploads and
    // files the photo away.
    #[tokio::test]
    async fn test_scheduled_batch_flows_through_the_daemon_wiring() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = config(temp_dir.path());
        let file = config.unprocessed_dir.join("cylinder42/leaf.jpg");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"jpeg bytes").unwrap();

        let store = Arc::new(MockStore::default());
        let resolver = IdentifierResolver::path_derived(
            Arc::new(MockValidator::accepting(["cylinder42"])),
            &config.upload_device_id,
            StateFile::new(config.state_path()),
        );
        let pipeline = Arc::new(Pipeline::new(&config, store.clone(), resolver));
        let scheduler = DebounceScheduler::new(pipeline, Duration::from_millis(20));

        scheduler.arm().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.shutdown().await;

        assert_eq!(store.uploads().len(), 1);
        assert!(!file.exists());
    }
}
