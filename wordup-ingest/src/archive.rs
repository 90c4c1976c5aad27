//! Verbatim archiving of uploaded files
//!
//! Stores the uploaded bytes unchanged under the configured upload folder,
//! replacing any earlier file of the same name with the same conditional
//! write the collection uses.

use serde::Serialize;
use std::sync::Arc;

use crate::error::IngestError;
use crate::store::{ContentStore, StoreError, VersionToken};

/// Result of archiving one file
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    /// Path written in the store
    pub path: String,
    /// False when an existing file was replaced
    pub created: bool,
    pub version: VersionToken,
}

/// Archive of raw uploads
pub struct RawArchive {
    store: Arc<dyn ContentStore>,
    upload_dir: String,
    commit_message: String,
}

impl RawArchive {
    pub fn new(
        store: Arc<dyn ContentStore>,
        upload_dir: impl Into<String>,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            store,
            upload_dir: upload_dir.into(),
            commit_message: commit_message.into(),
        }
    }

    /// Store path for an uploaded file name
    ///
    /// Only the final path component of `filename` is kept.
    pub fn archive_path(&self, filename: &str) -> Result<String, IngestError> {
        let base = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if base.is_empty() || base == "." || base == ".." {
            return Err(IngestError::Format(format!(
                "'{}' is not a usable file name",
                filename
            )));
        }

        let dir = self.upload_dir.trim_matches('/');
        if dir.is_empty() {
            Ok(base.to_string())
        } else {
            Ok(format!("{}/{}", dir, base))
        }
    }

    /// Write `bytes` to the archive under `filename`
    pub async fn archive(&self, filename: &str, bytes: &[u8]) -> Result<ArchiveOutcome, IngestError> {
        let path = self.archive_path(filename)?;

        let existing = match self.store.read(&path).await {
            Ok(file) => {
                tracing::debug!(path = %path, version = %file.version, "Replacing archived file");
                Some(file.version)
            }
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(IngestError::StoreRead(e.to_string())),
        };

        let version = self
            .store
            .write(&path, bytes, existing.as_ref(), &self.commit_message)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(msg) => IngestError::ConcurrentModification(msg),
                other => IngestError::StoreWrite(other.to_string()),
            })?;

        tracing::info!(path = %path, bytes = bytes.len(), "Archived uploaded file");

        Ok(ArchiveOutcome {
            path,
            created: existing.is_none(),
            version,
        })
    }
}
