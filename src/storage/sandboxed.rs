//! App-private directory backend

use super::traits::{StorageBackend, StorageResult};
use crate::error::{StorageError, StorageOperation};
use crate::types::{DirectoryRef, StoredArtifact};
use crate::utils::{is_partial_name, partial_name, validate_artifact_name};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Backend writing directly into a sandboxed directory path
///
/// Writes land in a hidden sibling file first and are renamed into place,
/// so readers never observe a half-written artifact.
pub struct SandboxedStorage {
    directory: DirectoryRef,
    root: PathBuf,
}

impl SandboxedStorage {
    /// Create a backend rooted at `root`. Nothing is created on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            directory: DirectoryRef::Sandboxed { path: root.clone() },
            root,
        }
    }

    /// Directory path on disk
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, operation: StorageOperation, name: &str) -> StorageResult<PathBuf> {
        validate_artifact_name(name).map_err(|e| StorageError::new(operation, name, e))?;
        Ok(self.root.join(name))
    }

    fn partial_path(&self, name: &str) -> PathBuf {
        self.root.join(partial_name(name))
    }

    fn artifact(&self, name: &str, path: &Path) -> StoredArtifact {
        StoredArtifact {
            directory: self.directory.clone(),
            name: name.to_string(),
            location: path.display().to_string(),
        }
    }

    /// Rename a fully written partial file into place, removing it on failure
    async fn commit(&self, name: &str, partial: &Path, dest: &Path) -> StorageResult<()> {
        if let Err(e) = fs::rename(partial, dest).await {
            if let Err(cleanup) = fs::remove_file(partial).await {
                warn!(path = ?partial, error = %cleanup, "failed to remove partial file");
            }
            return Err(StorageError::new(StorageOperation::Write, name, e));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for SandboxedStorage {
    fn directory(&self) -> &DirectoryRef {
        &self.directory
    }

    fn name(&self) -> &'static str {
        "sandboxed"
    }

    async fn exists(&self, name: &str) -> bool {
        if validate_artifact_name(name).is_err() {
            return false;
        }
        fs::try_exists(self.root.join(name)).await.unwrap_or(false)
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let root_name = self.root.display().to_string();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::new(StorageOperation::List, root_name, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::new(StorageOperation::List, root_name.clone(), e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_partial_name(name) {
                    continue;
                }
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn ensure(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            StorageError::new(StorageOperation::Ensure, self.root.display().to_string(), e)
        })
    }

    async fn write(
        &self,
        name: &str,
        bytes: &[u8],
        _mime_type: &str,
    ) -> StorageResult<StoredArtifact> {
        let dest = self.artifact_path(StorageOperation::Write, name)?;
        self.ensure().await?;

        let partial = self.partial_path(name);
        if let Err(e) = fs::write(&partial, bytes).await {
            fs::remove_file(&partial).await.ok();
            return Err(StorageError::new(StorageOperation::Write, name, e));
        }
        self.commit(name, &partial, &dest).await?;

        debug!(name, bytes = bytes.len(), path = ?dest, "stored artifact");
        Ok(self.artifact(name, &dest))
    }

    async fn import(
        &self,
        name: &str,
        source: &Path,
        _mime_type: &str,
    ) -> StorageResult<StoredArtifact> {
        let dest = self.artifact_path(StorageOperation::Write, name)?;
        self.ensure().await?;

        let partial = self.partial_path(name);
        if let Err(e) = fs::copy(source, &partial).await {
            fs::remove_file(&partial).await.ok();
            return Err(StorageError::new(StorageOperation::Write, name, e));
        }
        self.commit(name, &partial, &dest).await?;

        debug!(name, source = ?source, path = ?dest, "imported artifact");
        Ok(self.artifact(name, &dest))
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let path = self.artifact_path(StorageOperation::Read, name)?;
        fs::read(&path)
            .await
            .map_err(|e| StorageError::new(StorageOperation::Read, name, e))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.artifact_path(StorageOperation::Delete, name)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::new(StorageOperation::Delete, name, e))
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        let root_name = self.root.display().to_string();
        if !fs::try_exists(&self.root).await.unwrap_or(false) {
            debug!(path = ?self.root, "directory absent, nothing to delete");
            return Ok(0);
        }

        let count = self.list().await?.len();
        fs::remove_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::new(StorageOperation::DeleteAll, root_name.clone(), e))?;
        // Recreate so later writes and `ensure` calls find the directory in place
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::new(StorageOperation::DeleteAll, root_name, e))?;

        debug!(path = ?self.root, count, "deleted all artifacts");
        Ok(count)
    }
}
