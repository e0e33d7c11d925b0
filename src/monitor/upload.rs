//! Upload pass over stored images.

use crate::error::Result;
use crate::remote::UploadRequest;
use crate::types::{BatchReport, Event, ItemOutcome, ItemResult};
use crate::utils::is_image_name;

use super::FieldMonitor;

impl FieldMonitor {
    /// Upload every stored image (`.jpg`, `.jpeg`, `.png`) to the station.
    ///
    /// Images are sent one at a time in name order. A failed upload is
    /// recorded and the pass continues with the next image.
    ///
    /// Returns [`Error::ConfigMissing`](crate::Error::ConfigMissing) before
    /// touching storage when no upload URL is configured, and
    /// [`Error::Config`](crate::Error::Config) when it does not parse.
    pub async fn upload_stored_images(&self) -> Result<BatchReport> {
        let upload_url = self.remote.upload_url()?.to_string();

        let names: Vec<String> = self
            .storage
            .list()
            .await?
            .into_iter()
            .filter(|name| is_image_name(name))
            .collect();
        tracing::info!(count = names.len(), "uploading stored images");

        let mut report = BatchReport::default();
        for name in names {
            let result = match self.upload_one(&name).await {
                Ok(()) => {
                    self.emit(Event::UploadComplete { name: name.clone() });
                    ItemResult::Stored {
                        name: name.clone(),
                        location: upload_url.clone(),
                    }
                }
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "upload failed, continuing");
                    self.emit(Event::UploadFailed {
                        name: name.clone(),
                        error: e.to_string(),
                    });
                    ItemResult::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.outcomes.push(ItemOutcome { id: name, result });
        }

        tracing::info!(
            uploaded = report.stored(),
            failed = report.failed(),
            "upload pass complete"
        );
        Ok(report)
    }

    async fn upload_one(&self, name: &str) -> Result<()> {
        let bytes = self.storage.read(name).await?;
        self.remote
            .upload(&UploadRequest::from_image(name, &bytes))
            .await
    }
}
