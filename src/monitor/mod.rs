//! Field monitor façade split into focused submodules.
//!
//! The `FieldMonitor` struct and its methods are organized by domain:
//! - [`batch`] - Sequential manifest download with per-item outcomes
//! - [`upload`] - Upload pass over stored images
//! - [`control`] - Artifact listing, reading and bulk delete
//! - [`refresh`] - Telemetry log acquisition and series refresh
//! - [`config_ops`] - Configuration snapshot and explicit reconfiguration

mod batch;
mod config_ops;
mod control;
mod refresh;
mod upload;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use batch::BatchDownloader;

use crate::config::Config;
use crate::error::Result;
use crate::remote::RemoteClient;
use crate::series::SeriesStore;
use crate::storage::{StorageBackend, open_backend};
use crate::transfer::TransferTracker;
use crate::types::{Event, TransferProgress};
use crate::utils::ArtifactNamer;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Entry point for the acquisition-and-transformation pipeline
/// (cloneable - all fields are Arc-wrapped or cheap handles)
///
/// Every operation works against the configuration snapshot captured when the
/// monitor was built (or last [`reconfigure`](Self::reconfigure)d). Clones made
/// before a reconfiguration keep their original snapshot, so an in-flight
/// batch is never redirected.
#[derive(Clone)]
pub struct FieldMonitor {
    /// Configuration snapshot
    pub(crate) config: Arc<Config>,
    /// Backend selected from the snapshot
    pub(crate) storage: Arc<dyn StorageBackend>,
    /// Station endpoints
    pub(crate) remote: RemoteClient,
    /// Progress-tracked transfer for the telemetry log
    pub(crate) tracker: TransferTracker,
    /// Collision-free image names, shared across reconfigurations
    pub(crate) namer: Arc<ArtifactNamer>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl FieldMonitor {
    /// Create a monitor using the backend selected by the configuration.
    ///
    /// No I/O is performed; directories are created lazily on first write.
    pub fn new(config: Config) -> Result<Self> {
        let storage = open_backend(&config)?;
        Ok(Self::with_storage(config, storage))
    }

    /// Create a monitor with an explicitly provided backend
    pub fn with_storage(config: Config, storage: Arc<dyn StorageBackend>) -> Self {
        let (event_tx, _rx) = broadcast::channel(1000);
        let tracker = TransferTracker::new(
            config.storage.scratch_dir.clone(),
            config.progress.sample_interval,
        );

        tracing::info!(
            backend = storage.name(),
            directory = %storage.directory(),
            "field monitor initialized"
        );

        Self {
            remote: RemoteClient::new(config.remote.clone()),
            config: Arc::new(config),
            storage,
            tracker,
            namer: Arc::new(ArtifactNamer::new()),
            event_tx,
        }
    }

    /// Subscribe to pipeline events
    ///
    /// Each subscriber receives every event emitted after subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Watch the latest telemetry transfer progress
    pub fn watch_progress(&self) -> watch::Receiver<TransferProgress> {
        self.tracker.subscribe()
    }

    /// Latest telemetry transfer progress
    pub fn progress(&self) -> TransferProgress {
        self.tracker.progress()
    }

    /// Active storage backend
    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Series store bound to the active backend
    pub fn series_store(&self) -> SeriesStore {
        SeriesStore::new(
            Arc::clone(&self.storage),
            self.config.telemetry.series_name.clone(),
        )
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
