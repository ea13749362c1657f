//! Scripted validator for testing.

use crate::error::{ErrorKind, Result};
use crate::validator::Validator;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// Scripted validator for testing.
///
/// Holds a set of identifiers considered valid and records every query so
/// tests can assert on call counts and order. Can be switched into a
/// failure mode where every call errors (unreachable backend).
#[derive(Default)]
pub struct MockValidator {
    valid: Mutex<HashSet<String>>,
    queries: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl MockValidator {
    /// Create a validator that accepts exactly the given identifiers.
    pub fn accepting(identifiers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            valid: Mutex::new(identifiers.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail with a transport error.
    pub fn fail_calls(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    /// Every identifier queried so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Validator for MockValidator {
    async fn is_valid(&self, identifier: &str, _device_id: &str) -> Result<bool> {
        self.queries.lock().unwrap().push(identifier.to_string());
        if *self.fail.lock().unwrap() {
            exn::bail!(ErrorKind::Transport("mock validator told to fail".to_string()));
        }
        Ok(self.valid.lock().unwrap().contains(identifier))
    }

    async fn check(&self) -> Result<()> {
        if *self.fail.lock().unwrap() {
            exn::bail!(ErrorKind::Transport("mock validator told to fail".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accepts_scripted_identifiers() {
        let validator = MockValidator::accepting(["cylinder42"]);
        assert!(validator.is_valid("cylinder42", "dev").await.unwrap());
        assert!(!validator.is_valid("cylinder43", "dev").await.unwrap());
        assert_eq!(validator.queries(), vec!["cylinder42", "cylinder43"]);
    }

    #[tokio::test]
    async fn test_failure_is_an_error_not_invalid() {
        let validator = MockValidator::accepting(["cylinder42"]);
        validator.fail_calls(true);
        assert!(validator.is_valid("cylinder42", "dev").await.is_err());
    }
}
