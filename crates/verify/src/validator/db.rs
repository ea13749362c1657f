//! Database-backed identifier validation.
//!
//! Looks the identifier up in the registry database directly, for sites
//! where the daemon runs inside the same network as the source of truth
//! and the Lambda round-trip is pointless.

use crate::error::{ErrorKind, Result};
use crate::validator::Validator;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// The registry schema is owned by the greenhouse service; this is the one
/// query we are allowed to lean on.
const LOOKUP: &str = "SELECT EXISTS(SELECT 1 FROM identifiers WHERE code = $1)";
// Sequential pipeline, one in-flight query at a time. One spare for the
// startup probe.
const MAX_CONNECTIONS: u32 = 2;

/// Validator backend that queries the registry database.
#[derive(Debug, Clone)]
pub struct DbValidator {
    pool: PgPool,
}

impl DbValidator {
    /// Connect to the registry database.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Transport`] when the database is unreachable;
    /// startup treats that as fatal.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(url)
            .await
            .map_err(|e| ErrorKind::Transport(format!("could not connect to registry database: {e}")))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Validator for DbValidator {
    async fn is_valid(&self, identifier: &str, _device_id: &str) -> Result<bool> {
        let valid = sqlx::query_scalar::<_, bool>(LOOKUP)
            .bind(identifier)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ErrorKind::Transport(format!("registry lookup failed: {e}")))?;
        Ok(valid)
    }

    async fn check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| ErrorKind::Transport(format!("registry database unreachable: {e}")))?;
        Ok(())
    }
}
