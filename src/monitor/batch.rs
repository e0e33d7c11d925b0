//! Sequential manifest download with per-item outcomes.

use crate::error::Result;
use crate::remote::RemoteClient;
use crate::storage::StorageBackend;
use crate::types::{BatchReport, Event, ItemOutcome, ItemResult, ManifestItem, StoredArtifact};
use crate::utils::ArtifactNamer;
use tokio::sync::broadcast;

use super::FieldMonitor;

/// MIME type of downloaded station images
const IMAGE_MIME: &str = "image/jpeg";

/// Downloads manifest items one at a time into a storage backend
///
/// Item *i+1* is requested only after item *i* has been stored or has failed.
/// A failure is recorded in the [`BatchReport`] and the pass moves on; nothing
/// is retried.
pub struct BatchDownloader<'a> {
    remote: &'a RemoteClient,
    storage: &'a dyn StorageBackend,
    namer: &'a ArtifactNamer,
    events: Option<&'a broadcast::Sender<Event>>,
}

impl<'a> BatchDownloader<'a> {
    /// Create a downloader writing into `storage`
    pub fn new(
        remote: &'a RemoteClient,
        storage: &'a dyn StorageBackend,
        namer: &'a ArtifactNamer,
    ) -> Self {
        Self {
            remote,
            storage,
            namer,
            events: None,
        }
    }

    /// Emit per-item events on `events`
    pub fn with_events(mut self, events: &'a broadcast::Sender<Event>) -> Self {
        self.events = Some(events);
        self
    }

    /// Attempt every item in order and report what happened to each
    pub async fn run(&self, items: &[ManifestItem]) -> BatchReport {
        let mut report = BatchReport::default();

        for item in items {
            let result = match self.fetch_one(item).await {
                Ok(artifact) => {
                    tracing::debug!(item = %item.id, name = %artifact.name, "stored batch item");
                    self.emit(Event::ItemStored {
                        id: item.id.clone(),
                        name: artifact.name.clone(),
                    });
                    ItemResult::Stored {
                        name: artifact.name,
                        location: artifact.location,
                    }
                }
                Err(e) => {
                    tracing::warn!(item = %item.id, error = %e, "batch item failed, continuing");
                    self.emit(Event::ItemFailed {
                        id: item.id.clone(),
                        error: e.to_string(),
                    });
                    ItemResult::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.outcomes.push(ItemOutcome {
                id: item.id.clone(),
                result,
            });
        }

        report
    }

    async fn fetch_one(&self, item: &ManifestItem) -> Result<StoredArtifact> {
        let bytes = self.remote.fetch_bytes(&item.id).await?;
        let name = self.namer.next_image_name();
        Ok(self.storage.write(&name, &bytes, IMAGE_MIME).await?)
    }

    fn emit(&self, event: Event) {
        if let Some(tx) = self.events {
            tx.send(event).ok();
        }
    }
}

impl FieldMonitor {
    /// Download every image listed by the station into the active directory
    ///
    /// The manifest is fetched once and its items are downloaded strictly in
    /// order. Per-item failures are recorded in the returned report; only a
    /// missing URL, an unreachable manifest or an unusable directory fail the
    /// call as a whole.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigMissing`](crate::Error::ConfigMissing) when no download
    ///   URL is configured (checked before any network or storage access)
    /// - [`Error::Transfer`](crate::Error::Transfer) or
    ///   [`Error::Serialization`](crate::Error::Serialization) when the manifest
    ///   cannot be fetched or parsed
    /// - [`Error::Storage`](crate::Error::Storage) when the directory cannot be prepared
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use birdmon::{Config, FieldMonitor};
    /// # async fn example() -> birdmon::Result<()> {
    /// let monitor = FieldMonitor::new(Config::default())?;
    /// let report = monitor.download_batch().await?;
    /// println!("{} stored, {} failed", report.stored(), report.failed());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download_batch(&self) -> Result<BatchReport> {
        self.config.require_download_url()?;

        let items = self.remote.fetch_manifest().await?;
        self.storage.ensure().await?;

        tracing::info!(total = items.len(), backend = self.storage.name(), "starting batch download");
        self.emit(Event::BatchStarted { total: items.len() });

        let report = BatchDownloader::new(&self.remote, self.storage.as_ref(), &self.namer)
            .with_events(&self.event_tx)
            .run(&items)
            .await;

        tracing::info!(
            stored = report.stored(),
            failed = report.failed(),
            "batch download complete"
        );
        self.emit(Event::BatchComplete {
            stored: report.stored(),
            failed: report.failed(),
        });
        Ok(report)
    }
}
