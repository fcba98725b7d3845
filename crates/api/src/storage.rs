//! Document storage.
//!
//! Uploads reach the store only after they have been validated and scanned.
//! The store returns an opaque, stable reference that is saved on the
//! account or background-check record.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tourdesk_core::documents::DocumentKind;
use tourdesk_core::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Document storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document reference: {0}")]
    InvalidReference(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `bytes` and return a reference to them.
    async fn put(
        &self,
        owner_id: DbId,
        kind: DocumentKind,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError>;

    /// Remove a stored document. Missing documents are not an error.
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;
}

/// Stores documents as files under a root directory.
///
/// References look like `{owner_id}/{kind}-{sha256 prefix}-{uuid}.{ext}`.
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a reference to a path inside the root, refusing anything
    /// that could escape it.
    fn resolve(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(reference);
        let safe = !reference.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn put(
        &self,
        owner_id: DbId,
        kind: DocumentKind,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let digest = format!("{:x}", Sha256::digest(bytes));
        let reference = format!(
            "{owner_id}/{}-{}-{}.{extension}",
            kind.as_str(),
            &digest[..16],
            uuid::Uuid::now_v7()
        );

        let path = self.resolve(&reference)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(owner_id, kind = kind.as_str(), size = bytes.len(), %reference, "Document stored");
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
