//! The storage backend contract

use crate::error::StorageError;
use crate::types::{DirectoryRef, StoredArtifact};
use async_trait::async_trait;
use std::path::Path;

/// Result alias for backend operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Uniform artifact storage over one logical directory
///
/// A backend is bound to a single [`DirectoryRef`] at construction, so every
/// operation of a session targets the same location. Implementations must
/// behave identically from the caller's point of view; the differences
/// (pre-creation, two-phase writes) stay inside the adapter.
///
/// Writes are all-or-nothing: a failed write never leaves a partially
/// written artifact visible under its final name.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// The directory this backend writes into
    fn directory(&self) -> &DirectoryRef;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;

    /// Whether an artifact exists. A missing directory or file is `false`,
    /// never an error.
    async fn exists(&self, name: &str) -> bool;

    /// Artifact names in the directory, sorted. An absent directory lists as
    /// empty and is not created.
    async fn list(&self) -> StorageResult<Vec<String>>;

    /// Create the directory if the backend needs it. Idempotent.
    async fn ensure(&self) -> StorageResult<()>;

    /// Store `bytes` under `name`, replacing any previous artifact.
    async fn write(&self, name: &str, bytes: &[u8], mime_type: &str)
    -> StorageResult<StoredArtifact>;

    /// Store the contents of a local file under `name`.
    ///
    /// The default reads the file and delegates to [`write`](Self::write).
    async fn import(
        &self,
        name: &str,
        source: &Path,
        mime_type: &str,
    ) -> StorageResult<StoredArtifact> {
        let bytes = tokio::fs::read(source).await.map_err(|e| {
            StorageError::new(crate::error::StorageOperation::Write, name, e)
        })?;
        self.write(name, &bytes, mime_type).await
    }

    /// Read an artifact's bytes
    async fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Delete a single artifact
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Delete every artifact in the directory, returning how many were removed.
    ///
    /// Not transactional: a crash mid-way can leave the directory partially
    /// emptied.
    async fn delete_all(&self) -> StorageResult<usize>;
}
