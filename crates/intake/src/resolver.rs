//! Identifier resolution.
//!
//! Two intake generations derive the subject identifier differently:
//! older layouts encode it as the containing directory name, newer
//! devices stamp a QR code into the image itself. Both funnel through
//! [`IdentifierResolver`], which owns the carry-over cache for files
//! that arrive without an identifier of their own.

use crate::error::{ErrorKind, Result};
use crate::state::StateFile;
use exn::{OptionExt, ResultExt};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use trellis_verify::{DecoderHandle, ValidatorHandle};

/// The identifier a file will be uploaded under, plus every raw
/// candidate decoded from it (content strategy only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identifier: String,
    pub raw_identifiers: Option<String>,
}

enum Strategy {
    /// Identifier is the containing directory name, validated up front.
    Path,
    /// Identifiers are decoded from the image content.
    Content { decoder: DecoderHandle },
}

/// Resolves the identifier for each file of a batch.
///
/// Holds the last accepted identifier across files, batches and process
/// restarts. Only the content strategy reads or writes that cache; the
/// path strategy validates per file and carries nothing over.
pub struct IdentifierResolver {
    strategy: Strategy,
    validator: ValidatorHandle,
    device_id: String,
    state: StateFile,
    last_accepted: Mutex<String>,
}

impl IdentifierResolver {
    /// Resolver for the directory-per-subject layout.
    pub fn path_derived(validator: ValidatorHandle, device_id: impl Into<String>, state: StateFile) -> Self {
        Self::new(Strategy::Path, validator, device_id, state)
    }

    /// Resolver for the QR-stamped layout.
    pub fn content_derived(
        validator: ValidatorHandle,
        decoder: DecoderHandle,
        device_id: impl Into<String>,
        state: StateFile,
    ) -> Self {
        Self::new(Strategy::Content { decoder }, validator, device_id, state)
    }

    fn new(strategy: Strategy, validator: ValidatorHandle, device_id: impl Into<String>, state: StateFile) -> Self {
        let last_accepted = Mutex::new(state.load());
        Self { strategy, validator, device_id: device_id.into(), state, last_accepted }
    }

    /// The identifier currently carried over between files.
    pub async fn last_accepted(&self) -> String {
        self.last_accepted.lock().await.clone()
    }

    /// Resolve the identifier `file` uploads under.
    ///
    /// Path strategy: errors abort this file (invalid identifier or an
    /// unreachable validator). Content strategy: decode and validation
    /// problems are logged and the file proceeds with the best identifier
    /// currently known, possibly the empty sentinel.
    pub async fn resolve(&self, file: &Path) -> Result<Resolution> {
        match &self.strategy {
            Strategy::Path => self.resolve_from_path(file).await,
            Strategy::Content { decoder } => Ok(self.resolve_from_content(decoder, file).await),
        }
    }

    async fn resolve_from_path(&self, file: &Path) -> Result<Resolution> {
        let identifier = file
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_raise(|| ErrorKind::NoParent(file.to_path_buf()))?;
        let valid = self
            .validator
            .is_valid(&identifier, &self.device_id)
            .await
            .or_raise(|| ErrorKind::Validate)?;
        if !valid {
            exn::bail!(ErrorKind::InvalidIdentifier(identifier));
        }
        Ok(Resolution { identifier, raw_identifiers: None })
    }

    async fn resolve_from_content(&self, decoder: &DecoderHandle, file: &Path) -> Resolution {
        let candidates = match decoder.decode(file) {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(file = %file.display(), %error, "image could not be decoded, carrying identifier over");
                Vec::new()
            },
        };
        for candidate in &candidates {
            match self.validator.is_valid(candidate, &self.device_id).await {
                Ok(true) => self.accept(candidate).await,
                Ok(false) => debug!(%candidate, "decoded identifier not recognized, ignoring"),
                Err(error) => {
                    warn!(%candidate, %error, "validator unreachable, carrying identifier over");
                },
            }
        }
        Resolution {
            identifier: self.last_accepted.lock().await.clone(),
            raw_identifiers: if candidates.is_empty() { None } else { Some(candidates.join(",")) },
        }
    }

    /// Record a freshly validated identifier, persisting it immediately
    /// so it survives a restart mid-batch.
    async fn accept(&self, identifier: &str) {
        let mut last_accepted = self.last_accepted.lock().await;
        *last_accepted = identifier.to_string();
        if let Err(error) = self.state.store(identifier) {
            warn!(%identifier, %error, "could not persist accepted identifier");
        }
    }
}
