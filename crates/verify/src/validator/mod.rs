//! Identifier validation backends.
//!
//! Two interchangeable backends answer the same question, "does this
//! identifier denote a known plant/container?": one through the preflight
//! Lambda function, one by asking the registry database directly. Transport
//! failure surfaces as an error, never as `false`.

#[cfg(feature = "database")]
mod db;
#[cfg(feature = "lambda")]
mod lambda;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "database")]
pub use self::db::DbValidator;
#[cfg(feature = "lambda")]
pub use self::lambda::LambdaValidator;
#[cfg(feature = "mock")]
pub use self::mock::MockValidator;
use crate::error::Result;
use async_trait::async_trait;

/// Boolean identifier validity, asked of an external source of truth.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Whether `identifier` denotes a known entity. `device_id` identifies
    /// the asking machine (the Lambda backend logs/audits by it).
    async fn is_valid(&self, identifier: &str, device_id: &str) -> Result<bool>;

    /// Startup reachability probe. Backends without a meaningful cheap
    /// probe (Lambda) report `Ok` and let the first real call decide.
    async fn check(&self) -> Result<()> {
        Ok(())
    }
}
