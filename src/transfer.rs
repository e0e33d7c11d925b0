//! Progress-tracked network-to-disk transfers
//!
//! A [`TransferTracker`] streams one HTTP body into a private scratch file,
//! sampling progress on every received chunk, and only hands the finished file
//! to its destination once the body is complete. A failed transfer therefore
//! never leaves a partial artifact behind.
//!
//! Progress is published two ways:
//! - the latest [`TransferProgress`] snapshot, via [`TransferTracker::subscribe`]
//! - rate-bounded samples delivered to an optional [`ProgressSink`]

use crate::error::TransferError;
use crate::remote::check_status;
use crate::storage::StorageBackend;
use crate::types::{Event, TransferProgress};
use crate::utils::ScratchPath;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, watch};
use url::Url;

/// Consumer of rate-bounded progress samples
pub trait ProgressSink: Send + Sync {
    /// Called with a progress sample for the artifact `name`
    fn on_progress(&self, name: &str, progress: &TransferProgress);
}

impl ProgressSink for broadcast::Sender<Event> {
    fn on_progress(&self, name: &str, progress: &TransferProgress) {
        self.send(Event::TransferProgress {
            name: name.to_string(),
            progress: progress.clone(),
        })
        .ok();
    }
}

/// Turns raw byte counts into [`TransferProgress`] samples
///
/// Throughput is measured between consecutive samples. A zero-length interval
/// reports 0 bytes per second instead of dividing by zero.
#[derive(Debug, Clone)]
pub struct ProgressSampler {
    started: Instant,
    last_sample: Instant,
    last_bytes: u64,
}

impl ProgressSampler {
    /// Start sampling a transfer that began at `now`
    pub fn start(now: Instant) -> Self {
        Self {
            started: now,
            last_sample: now,
            last_bytes: 0,
        }
    }

    /// Record that `bytes_written` bytes have arrived by `now`
    pub fn sample(
        &mut self,
        now: Instant,
        bytes_written: u64,
        bytes_expected: Option<u64>,
    ) -> TransferProgress {
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let interval = now.saturating_duration_since(self.last_sample).as_secs_f64();
        let delta = bytes_written.saturating_sub(self.last_bytes);
        let instantaneous_bps = if interval > 0.0 {
            delta as f64 / interval
        } else {
            0.0
        };

        self.last_sample = now;
        self.last_bytes = bytes_written;

        TransferProgress {
            bytes_written,
            bytes_expected,
            elapsed_seconds: elapsed,
            instantaneous_bps,
        }
    }
}

/// Where a finished transfer ends up
pub enum Destination<'a> {
    /// An artifact in a storage backend
    Storage {
        /// Backend to store into
        backend: &'a dyn StorageBackend,
        /// Artifact name
        name: &'a str,
        /// MIME type handed to the backend
        mime_type: &'a str,
    },
    /// A plain filesystem path
    Path(&'a Path),
}

impl Destination<'_> {
    fn label(&self) -> String {
        match self {
            Destination::Storage { name, .. } => (*name).to_string(),
            Destination::Path(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("download")
                .to_string(),
        }
    }
}

/// A completed transfer
#[derive(Debug, Clone)]
pub struct Transferred {
    /// Final location (backend location or filesystem path)
    pub location: String,
    /// Total bytes received
    pub bytes: u64,
    /// Progress as frozen at completion
    pub progress: TransferProgress,
}

/// Tracks one network-to-disk transfer at a time
///
/// Cloning is cheap; clones share the published progress.
#[derive(Clone)]
pub struct TransferTracker {
    http: reqwest::Client,
    scratch_dir: PathBuf,
    sample_interval: Duration,
    progress: Arc<watch::Sender<TransferProgress>>,
    generation: Arc<AtomicU64>,
}

impl TransferTracker {
    /// Create a tracker staging downloads in `scratch_dir`
    pub fn new(scratch_dir: impl Into<PathBuf>, sample_interval: Duration) -> Self {
        let (progress, _rx) = watch::channel(TransferProgress::default());
        Self {
            http: reqwest::Client::new(),
            scratch_dir: scratch_dir.into(),
            sample_interval,
            progress: Arc::new(progress),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Receiver that always holds the latest progress snapshot
    pub fn subscribe(&self) -> watch::Receiver<TransferProgress> {
        self.progress.subscribe()
    }

    /// Latest progress snapshot
    pub fn progress(&self) -> TransferProgress {
        self.progress.borrow().clone()
    }

    /// Download `source` into `destination`.
    ///
    /// Progress is reset to zero when the transfer starts, updated on every
    /// chunk and frozen when the transfer completes.
    pub async fn transfer(
        &self,
        source: Url,
        destination: Destination<'_>,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<Transferred, TransferError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.progress.send_replace(TransferProgress::default());

        let label = destination.label();
        let mut sampler = ProgressSampler::start(Instant::now());
        tracing::debug!(url = %source, name = %label, "starting tracked transfer");

        let response = self.http.get(source.clone()).send().await?;
        check_status(&source, &response)?;
        let bytes_expected = response.content_length();

        let scratch = ScratchPath::new(&self.scratch_dir, &label).await?;
        let mut file = tokio::fs::File::create(scratch.path()).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        let mut last_emit: Option<Instant> = None;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            let now = Instant::now();
            let sample = sampler.sample(now, written, bytes_expected);
            tracing::trace!(
                name = %label,
                bytes = written,
                bps = sample.instantaneous_bps,
                "transfer progress"
            );

            let due = last_emit
                .map(|at| now.saturating_duration_since(at) >= self.sample_interval)
                .unwrap_or(true);
            if due && let Some(sink) = sink {
                sink.on_progress(&label, &sample);
                last_emit = Some(now);
            }
            self.progress.send_replace(sample);
        }
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let location = match destination {
            Destination::Storage {
                backend,
                name,
                mime_type,
            } => backend.import(name, scratch.path(), mime_type).await?.location,
            Destination::Path(path) => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::copy(scratch.path(), path).await?;
                path.display().to_string()
            }
        };

        let final_progress = sampler.sample(Instant::now(), written, bytes_expected);
        self.progress.send_replace(final_progress.clone());
        if let Some(sink) = sink {
            sink.on_progress(&label, &final_progress);
        }

        tracing::info!(
            name = %label,
            bytes = written,
            elapsed_secs = final_progress.elapsed_seconds,
            "transfer complete"
        );
        Ok(Transferred {
            location,
            bytes: written,
            progress: final_progress,
        })
    }

    /// Clear the published progress after `delay`, unless another transfer
    /// has started in the meantime.
    pub fn schedule_clear(&self, delay: Duration) -> tokio::task::JoinHandle<()> {
        let generation = Arc::clone(&self.generation);
        let progress = Arc::clone(&self.progress);
        let scheduled_for = generation.load(Ordering::SeqCst);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == scheduled_for {
                progress.send_replace(TransferProgress::default());
            }
        })
    }
}
