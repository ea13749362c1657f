//! Lambda-backed identifier validation.
//!
//! Invokes the preflight function with the same JSON contract the original
//! uploader used: request `{"qr_code", "upload_device_id"}`, response
//! `{"qr_code_valid": bool}`.

use crate::error::{ErrorKind, Result};
use crate::validator::Validator;
use async_trait::async_trait;
use aws_sdk_lambda::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    primitives::Blob,
};
use exn::OptionExt;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct Request<'a> {
    qr_code: &'a str,
    upload_device_id: &'a str,
}

#[derive(Deserialize)]
struct Response {
    qr_code_valid: bool,
}

/// Validator backend that invokes the preflight Lambda function.
#[derive(Debug, Clone)]
pub struct LambdaValidator {
    client: Client,
    function_arn: String,
}

impl LambdaValidator {
    /// Create a validator for the given function ARN.
    pub fn new(
        function_arn: impl Into<String>,
        region: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(key_id, key_secret, None, None, "trellis-config");
        let config = aws_sdk_lambda::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            .build();
        Self {
            client: Client::from_conf(config),
            function_arn: function_arn.into(),
        }
    }
}

#[async_trait]
impl Validator for LambdaValidator {
    async fn is_valid(&self, identifier: &str, device_id: &str) -> Result<bool> {
        let request = Request { qr_code: identifier, upload_device_id: device_id };
        let payload = serde_json::to_vec(&request)
            .map_err(|e| ErrorKind::Protocol(format!("could not encode request: {e}")))?;
        let output = self
            .client
            .invoke()
            .function_name(&self.function_arn)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| ErrorKind::Transport(format!("invoke `{}` failed: {e}", self.function_arn)))?;
        // A function-side crash comes back as a 200 with this field set.
        if let Some(error) = output.function_error() {
            exn::bail!(ErrorKind::Protocol(format!("function error: {error}")));
        }
        let blob = output.payload().ok_or_raise(|| ErrorKind::Protocol("empty response payload".to_string()))?;
        let response: Response = serde_json::from_slice(blob.as_ref())
            .map_err(|e| ErrorKind::Protocol(format!("could not decode response: {e}")))?;
        Ok(response.qr_code_valid)
    }
}
