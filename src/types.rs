//! Core types for birdmon

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Handle to a logical storage location
///
/// Once a [`FieldMonitor`](crate::FieldMonitor) is built, every operation
/// targets the same ref. Switching kinds goes through
/// [`FieldMonitor::reconfigure`](crate::FieldMonitor::reconfigure).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryRef {
    /// App-private directory, addressed by path
    Sandboxed {
        /// Absolute or working-directory-relative path
        path: PathBuf,
    },
    /// User-granted directory, addressed only by URI
    ExternalGranted {
        /// Opaque, already-authorized directory URI
        uri: String,
    },
}

impl DirectoryRef {
    /// Whether this ref points into the app sandbox
    pub fn is_sandboxed(&self) -> bool {
        matches!(self, DirectoryRef::Sandboxed { .. })
    }
}

impl fmt::Display for DirectoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryRef::Sandboxed { path } => write!(f, "{}", path.display()),
            DirectoryRef::ExternalGranted { uri } => f.write_str(uri),
        }
    }
}

/// One downloadable artifact announced by the server's listing endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItem {
    /// Remote identifier, passed back as `?file=<id>`
    #[serde(rename = "file")]
    pub id: String,

    /// Size in bytes, when the server reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ManifestItem {
    /// Create a manifest item without a size hint
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            size: None,
        }
    }
}

/// A named blob inside a [`DirectoryRef`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    /// Directory the artifact lives in
    pub directory: DirectoryRef,
    /// Artifact name within the directory
    pub name: String,
    /// Backend-specific location (filesystem path or content URI)
    pub location: String,
}

/// One sensor reading
///
/// `v` is `None` for an explicit `nan` in the source log, so gaps stay visible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Opaque timestamp token, e.g. `2025-11-17T22-13-28`
    pub t: String,
    /// Reading, or `None` when the station logged `nan`
    pub v: Option<f64>,
}

impl SeriesPoint {
    /// Create a point
    pub fn new(t: impl Into<String>, v: Option<f64>) -> Self {
        Self { t: t.into(), v }
    }
}

/// Readings grouped by sensor key
///
/// Within a key, points keep the order in which they were appended (log order).
/// Keys are kept sorted so serialization is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesIndex(BTreeMap<String, Vec<SeriesPoint>>);

impl SeriesIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point to a sensor's series, creating the series if needed
    pub fn push(&mut self, sensor: impl Into<String>, point: SeriesPoint) {
        self.0.entry(sensor.into()).or_default().push(point);
    }

    /// Points recorded for a sensor
    pub fn get(&self, sensor: &str) -> Option<&[SeriesPoint]> {
        self.0.get(sensor).map(Vec::as_slice)
    }

    /// Sensor keys present in the index
    pub fn sensors(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over `(sensor, points)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SeriesPoint])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of sensors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no sensor has any point
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of points across all sensors
    pub fn point_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Chart-ready value with a short display label
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Reading
    pub value: f64,
    /// `HH:MM` extracted from the timestamp, or the raw token
    pub label: String,
}

/// Snapshot of a running transfer
///
/// Reset at transfer start, updated on every chunk, frozen at completion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferProgress {
    /// Bytes received so far
    pub bytes_written: u64,
    /// Total size announced by the server (None if unknown)
    pub bytes_expected: Option<u64>,
    /// Seconds since the transfer started
    pub elapsed_seconds: f64,
    /// Throughput between the last two samples, in bytes per second
    pub instantaneous_bps: f64,
}

impl TransferProgress {
    /// Completion percentage (0.0 to 100.0), when the total is known
    pub fn percent(&self) -> Option<f32> {
        match self.bytes_expected {
            Some(total) if total > 0 => {
                Some((self.bytes_written as f64 / total as f64 * 100.0) as f32)
            }
            _ => None,
        }
    }

    /// Whether this is the zeroed, idle snapshot
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of one item in a batch pass
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ItemResult {
    /// The item was stored (or uploaded)
    Stored {
        /// Local artifact name
        name: String,
        /// Backend location, or the upload URL
        location: String,
    },
    /// The item failed; the batch moved on
    Failed {
        /// Error message
        error: String,
    },
}

/// Outcome of one attempted item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Item identifier (remote id for downloads, local name for uploads)
    pub id: String,
    /// What happened
    #[serde(flatten)]
    pub result: ItemResult,
}

impl ItemOutcome {
    /// Whether the item succeeded
    pub fn is_stored(&self) -> bool {
        matches!(self.result, ItemResult::Stored { .. })
    }
}

/// Per-item outcomes of a sequential batch pass, in attempt order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One entry per attempted item
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Number of items attempted
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of items stored
    pub fn stored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_stored()).count()
    }

    /// Number of items that failed
    pub fn failed(&self) -> usize {
        self.attempted() - self.stored()
    }

    /// Whether every attempted item succeeded
    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }

    /// Ids of the failed items, in attempt order
    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_stored())
            .map(|o| o.id.as_str())
    }
}

/// Event emitted by the acquisition pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A download batch started
    BatchStarted {
        /// Number of items in the manifest
        total: usize,
    },

    /// A batch item was stored
    ItemStored {
        /// Remote item id
        id: String,
        /// Local artifact name
        name: String,
    },

    /// A batch item failed; the batch continues
    ItemFailed {
        /// Remote item id
        id: String,
        /// Error message
        error: String,
    },

    /// All batch items were attempted
    BatchComplete {
        /// Items stored
        stored: usize,
        /// Items failed
        failed: usize,
    },

    /// Transfer progress sample (rate-bounded)
    TransferProgress {
        /// Artifact being written
        name: String,
        /// Progress snapshot
        progress: TransferProgress,
    },

    /// Transfer finished and the artifact is stored
    TransferComplete {
        /// Artifact name
        name: String,
        /// Total bytes transferred
        bytes: u64,
    },

    /// Transfer failed; no artifact was stored
    TransferFailed {
        /// Artifact name
        name: String,
        /// Error message
        error: String,
    },

    /// A stored image was uploaded
    UploadComplete {
        /// Local artifact name
        name: String,
    },

    /// Uploading a stored image failed
    UploadFailed {
        /// Local artifact name
        name: String,
        /// Error message
        error: String,
    },

    /// Stored artifacts were deleted
    ArtifactsDeleted {
        /// Number of artifacts removed
        count: usize,
    },

    /// The series document was regenerated
    SeriesUpdated {
        /// Number of sensors in the new index
        sensors: usize,
        /// Total number of points
        points: usize,
    },
}
