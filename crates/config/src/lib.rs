//! Configuration loading and validation.
//!
//! Configuration comes from a JSON file merged with `TRELLIS_`-prefixed
//! environment variables (double underscore as section separator, so
//! `TRELLIS_S3__BUCKET` overrides `s3.bucket`).

pub mod error;
mod model;

pub use crate::model::{
    AwsConfig, CloudWatchConfig, Config, IdentifierStrategy, KeyScheme, S3Config, ScanMode, ValidatorConfig,
};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json};
use std::path::Path;

/// Load and validate configuration from the given JSON file.
///
/// # Errors
///
/// Returns [`ErrorKind::Load`] when the file is missing/malformed and the
/// structural variants from [`Config::validate`] when its contents break an
/// invariant.
pub fn load(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "loading configuration");
    let config: Config = Figment::new()
        .merge(Json::file(path))
        .merge(Env::prefixed("TRELLIS_").split("__"))
        .extract()
        .map_err(|e| ErrorKind::Load(e.to_string()))
        .or_raise(|| ErrorKind::Load(format!("from file `{}`", path.display())))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_json(unprocessed: &str, error: &str, done: &str) -> String {
        format!(
            r#"{{
                "unprocessed_dir": "{unprocessed}",
                "error_dir": "{error}",
                "done_dir": "{done}",
                "upload_device_id": "greenhouse-3",
                "aws": {{
                    "region": "us-west-2",
                    "access_key_id": "AKIATEST",
                    "secret_access_key": "secret"
                }},
                "s3": {{ "bucket": "greenhouse-images", "key_prefix": "image/raw/cylinder/" }},
                "validator": {{ "backend": "lambda", "function_arn": "arn:aws:lambda:us-west-2:1:function:preflight" }}
            }}"#
        )
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal() {
        let file = write_config(&minimal_json("/data/in", "/data/err", "/data/done"));
        let config = load(file.path()).unwrap();
        assert_eq!(config.upload_device_id, "greenhouse-3");
        assert_eq!(config.debounce_seconds, 10);
        assert_eq!(config.scan_mode, ScanMode::LeafRecursive);
        assert_eq!(config.identifier_strategy, IdentifierStrategy::Path);
        assert_eq!(config.key_scheme, KeyScheme::Partitioned);
        assert!(!config.cloudwatch.enabled);
        assert!(matches!(config.validator, ValidatorConfig::Lambda { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load("/nonexistent/config.json").is_err());
    }

    #[test]
    fn test_duplicate_roots_rejected() {
        let file = write_config(&minimal_json("/data/in", "/data/in", "/data/done"));
        let err = load(file.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::DuplicateRoot(_)));
    }

    #[test]
    fn test_relative_roots_rejected() {
        let file = write_config(&minimal_json("relative/in", "/data/err", "/data/done"));
        let err = load(file.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::RelativeRoot(_)));
    }

    #[test]
    fn test_strategy_selectors() {
        let mut json: serde_json::Value = serde_json::from_str(&minimal_json("/a", "/b", "/c")).unwrap();
        json["scan_mode"] = "flat".into();
        json["identifier_strategy"] = "content".into();
        json["key_scheme"] = "flat".into();
        json["validator"] =
            serde_json::json!({ "backend": "database", "url": "postgres://registry.internal/plants" });
        let file = write_config(&json.to_string());
        let config = load(file.path()).unwrap();
        assert_eq!(config.scan_mode, ScanMode::Flat);
        assert_eq!(config.identifier_strategy, IdentifierStrategy::Content);
        assert_eq!(config.key_scheme, KeyScheme::Flat);
        assert!(matches!(config.validator, ValidatorConfig::Database { .. }));
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let mut json: serde_json::Value = serde_json::from_str(&minimal_json("/a", "/b", "/c")).unwrap();
        json["debounce_seconds"] = 0.into();
        let file = write_config(&json.to_string());
        let err = load(file.path()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidValue { field: "debounce_seconds", .. }));
    }
}
