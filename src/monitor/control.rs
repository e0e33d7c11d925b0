//! Artifact listing, reading and bulk delete.

use crate::error::Result;
use crate::types::Event;

use super::FieldMonitor;

impl FieldMonitor {
    /// Names of the stored artifacts, sorted
    ///
    /// An absent sandboxed directory lists as empty and is not created.
    pub async fn list_artifacts(&self) -> Result<Vec<String>> {
        Ok(self.storage.list().await?)
    }

    /// Names of the stored images only, sorted
    pub async fn list_images(&self) -> Result<Vec<String>> {
        let mut names = self.list_artifacts().await?;
        names.retain(|name| crate::utils::is_image_name(name));
        Ok(names)
    }

    /// Raw content of a stored artifact
    pub async fn read_artifact(&self, name: &str) -> Result<Vec<u8>> {
        Ok(self.storage.read(name).await?)
    }

    /// Delete every stored artifact
    ///
    /// A sandboxed directory is recreated empty; a granted directory is left
    /// in place, empty. Returns the number of artifacts removed.
    ///
    /// Not transactional: a failure part-way through can leave some artifacts
    /// behind.
    pub async fn delete_all_artifacts(&self) -> Result<usize> {
        let count = self.storage.delete_all().await?;
        tracing::info!(count, backend = self.storage.name(), "deleted all artifacts");
        self.emit(Event::ArtifactsDeleted { count });
        Ok(count)
    }
}
