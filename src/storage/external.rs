//! User-granted external directory backend

use super::granted::GrantedDirectory;
use super::traits::{StorageBackend, StorageResult};
use crate::error::{StorageError, StorageOperation};
use crate::types::{DirectoryRef, StoredArtifact};
use crate::utils::{ScratchPath, is_partial_name, partial_name, validate_artifact_name};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Backend for a directory reached only through a granted URI
///
/// Writes are two-phase: bytes are materialized in a private scratch file,
/// then its content is copied into a file created inside the granted
/// directory. The scratch copy is always removed, even when the copy fails.
///
/// The granted directory is never created or removed by this backend;
/// [`delete_all`](StorageBackend::delete_all) leaves it in place, empty.
pub struct ExternalStorage {
    directory: DirectoryRef,
    uri: String,
    scratch_dir: PathBuf,
    granted: Arc<dyn GrantedDirectory>,
}

impl ExternalStorage {
    /// Create a backend for `uri`, staging writes in `scratch_dir`
    pub fn new(
        uri: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
        granted: Arc<dyn GrantedDirectory>,
    ) -> Self {
        let uri = uri.into();
        Self {
            directory: DirectoryRef::ExternalGranted { uri: uri.clone() },
            uri,
            scratch_dir: scratch_dir.into(),
            granted,
        }
    }

    /// Find the URI of the child called `name`
    async fn find(&self, operation: StorageOperation, name: &str) -> StorageResult<String> {
        validate_artifact_name(name).map_err(|e| StorageError::new(operation, name, e))?;
        let children = self
            .granted
            .list(&self.uri)
            .await
            .map_err(|e| StorageError::new(operation, name, e))?;
        children
            .into_iter()
            .find(|uri| self.granted.display_name(uri).as_deref() == Some(name))
            .ok_or_else(|| {
                StorageError::new(
                    operation,
                    name,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such artifact"),
                )
            })
    }

    /// Copy a local file's content into the granted directory
    ///
    /// The content is staged under a hidden sibling name and renamed over
    /// `name` only once fully written, so a failed write leaves any previous
    /// version of the artifact untouched.
    async fn publish(
        &self,
        name: &str,
        source: &Path,
        mime_type: &str,
    ) -> StorageResult<StoredArtifact> {
        let write_err = |e| StorageError::new(StorageOperation::Write, name, e);

        let content = tokio::fs::read(source).await.map_err(write_err)?;
        let staged_uri = self
            .granted
            .create_file(&self.uri, &partial_name(name), mime_type)
            .await
            .map_err(write_err)?;

        let committed = match self.granted.write_content(&staged_uri, &content).await {
            Ok(()) => self.granted.rename(&staged_uri, name).await,
            Err(e) => Err(e),
        };
        let file_uri = match committed {
            Ok(uri) => uri,
            Err(e) => {
                if let Err(cleanup) = self.granted.delete(&staged_uri).await {
                    warn!(uri = %staged_uri, error = %cleanup, "failed to remove staged artifact");
                }
                return Err(write_err(e));
            }
        };

        debug!(name, bytes = content.len(), uri = %file_uri, "stored artifact in granted directory");
        Ok(StoredArtifact {
            directory: self.directory.clone(),
            name: name.to_string(),
            location: file_uri,
        })
    }
}

#[async_trait]
impl StorageBackend for ExternalStorage {
    fn directory(&self) -> &DirectoryRef {
        &self.directory
    }

    fn name(&self) -> &'static str {
        "external"
    }

    async fn exists(&self, name: &str) -> bool {
        self.find(StorageOperation::Exists, name).await.is_ok()
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let children = self
            .granted
            .list(&self.uri)
            .await
            .map_err(|e| StorageError::new(StorageOperation::List, self.uri.clone(), e))?;
        let mut names: Vec<String> = children
            .iter()
            .filter_map(|uri| self.granted.display_name(uri))
            .filter(|name| !is_partial_name(name))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn ensure(&self) -> StorageResult<()> {
        // Granted directories exist by construction of the grant
        Ok(())
    }

    async fn write(
        &self,
        name: &str,
        bytes: &[u8],
        mime_type: &str,
    ) -> StorageResult<StoredArtifact> {
        validate_artifact_name(name)
            .map_err(|e| StorageError::new(StorageOperation::Write, name, e))?;

        let write_err = |e| StorageError::new(StorageOperation::Write, name, e);
        let scratch = ScratchPath::new(&self.scratch_dir, name)
            .await
            .map_err(write_err)?;
        tokio::fs::write(scratch.path(), bytes)
            .await
            .map_err(write_err)?;
        self.publish(name, scratch.path(), mime_type).await
    }

    async fn import(
        &self,
        name: &str,
        source: &Path,
        mime_type: &str,
    ) -> StorageResult<StoredArtifact> {
        validate_artifact_name(name)
            .map_err(|e| StorageError::new(StorageOperation::Write, name, e))?;
        self.publish(name, source, mime_type).await
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let uri = self.find(StorageOperation::Read, name).await?;
        self.granted
            .read_content(&uri)
            .await
            .map_err(|e| StorageError::new(StorageOperation::Read, name, e))
    }

    async fn delete(&self, name: &str) -> StorageResult<()> {
        let uri = self.find(StorageOperation::Delete, name).await?;
        self.granted
            .delete(&uri)
            .await
            .map_err(|e| StorageError::new(StorageOperation::Delete, name, e))
    }

    async fn delete_all(&self) -> StorageResult<usize> {
        let children = self
            .granted
            .list(&self.uri)
            .await
            .map_err(|e| StorageError::new(StorageOperation::DeleteAll, self.uri.clone(), e))?;

        let mut count = 0;
        for uri in children {
            let staged = self
                .granted
                .display_name(&uri)
                .is_some_and(|name| is_partial_name(&name));
            self.granted
                .delete(&uri)
                .await
                .map_err(|e| StorageError::new(StorageOperation::DeleteAll, uri.clone(), e))?;
            if !staged {
                count += 1;
            }
        }

        debug!(uri = %self.uri, count, "deleted all artifacts from granted directory");
        Ok(count)
    }
}
