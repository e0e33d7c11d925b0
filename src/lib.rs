//! # birdmon
//!
//! Acquisition-and-transformation core of a field-monitoring companion app.
//!
//! ## Design Philosophy
//!
//! birdmon is designed to be:
//! - **Backend-agnostic** - Sandboxed and user-granted directories behave identically
//! - **Failure-tolerant** - One bad item never aborts a batch
//! - **Library-first** - No UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use birdmon::{Config, FieldMonitor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.remote.download_url = "http://192.168.4.1".to_string();
//!
//!     let monitor = FieldMonitor::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = monitor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = monitor.download_batch().await?;
//!     println!("stored {} of {}", report.stored(), report.attempted());
//!
//!     let series = monitor.load_series(false).await?;
//!     println!("{} sensors", series.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Field monitor façade (decomposed into focused submodules)
pub mod monitor;
/// Station HTTP client
pub mod remote;
/// Persisted sensor series and chart projections
pub mod series;
/// Artifact storage backends
pub mod storage;
/// Telemetry log transform
pub mod telemetry;
/// Progress-tracked transfers
pub mod transfer;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ProgressConfig, RemoteConfig, StorageConfig, TelemetryConfig};
pub use error::{Error, Result, StorageError, StorageOperation, TransferError};
pub use monitor::{BatchDownloader, FieldMonitor};
pub use remote::{RemoteClient, UploadRequest};
pub use series::SeriesStore;
pub use storage::{
    ExternalStorage, FsGrantedDirectory, GrantedDirectory, SandboxedStorage, StorageBackend,
    open_backend,
};
pub use telemetry::transform;
pub use transfer::{ProgressSampler, ProgressSink, TransferTracker};
pub use types::{
    BatchReport, ChartPoint, DirectoryRef, Event, ItemOutcome, ItemResult, ManifestItem,
    SeriesIndex, SeriesPoint, StoredArtifact, TransferProgress,
};
