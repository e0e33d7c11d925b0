//! Configuration types for birdmon
//!
//! The core never reads ambient settings. A [`Config`] snapshot is handed to
//! [`FieldMonitor`](crate::FieldMonitor) once and shared behind an `Arc`, so a
//! change made by the settings screen never leaks into an in-flight batch.

use crate::error::{Error, Result};
use crate::types::DirectoryRef;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Remote server endpoints
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the station server (`/files` and `/download` live below it)
    #[serde(default)]
    pub download_url: String,

    /// Full URL that accepts image uploads
    #[serde(default)]
    pub upload_url: String,
}

/// Where artifacts are stored
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory name below `documents_dir` (sandboxed mode) or the granted
    /// directory URI (external mode). Default: "birds"
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Store into a user-granted external directory instead of the app sandbox
    #[serde(default)]
    pub use_external_directory: bool,

    /// Root of the app-private documents area (default: "./documents")
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// Private scratch area for transfers and two-phase writes (default: "./cache")
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            use_external_directory: false,
            documents_dir: default_documents_dir(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

/// Telemetry log acquisition and chart settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Name of the telemetry log on the server (default: "log.txt")
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Name under which the raw log is stored locally (default: "data.txt")
    #[serde(default = "default_raw_log_name")]
    pub raw_log_name: String,

    /// Name of the transformed series document (default: "events.json")
    #[serde(default = "default_series_name")]
    pub series_name: String,

    /// Number of most recent points shown per chart (default: 6)
    #[serde(default = "default_chart_window")]
    pub chart_window: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            raw_log_name: default_raw_log_name(),
            series_name: default_series_name(),
            chart_window: default_chart_window(),
        }
    }
}

/// Transfer progress publication
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// How long a finished transfer's progress stays visible (default: 10 seconds)
    #[serde(default = "default_clear_after", with = "duration_serde")]
    pub clear_after: Duration,

    /// Minimum spacing between published progress events (default: 100 ms)
    #[serde(default = "default_sample_interval", with = "millis_serde")]
    pub sample_interval: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            clear_after: default_clear_after(),
            sample_interval: default_sample_interval(),
        }
    }
}

/// Main configuration snapshot
///
/// Sub-configs are flattened, so the serialized form is a single flat object:
///
/// ```json
/// {
///   "download_url": "http://192.168.4.1:8080",
///   "upload_url": "http://192.168.4.1:8080/upload",
///   "directory": "birds",
///   "use_external_directory": false
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints
    #[serde(flatten)]
    pub remote: RemoteConfig,

    /// Storage location
    #[serde(flatten)]
    pub storage: StorageConfig,

    /// Telemetry acquisition
    #[serde(flatten)]
    pub telemetry: TelemetryConfig,

    /// Progress publication
    #[serde(flatten)]
    pub progress: ProgressConfig,
}

impl Config {
    /// Resolve the storage location this snapshot points at.
    ///
    /// Sandboxed mode falls back to "birds" when the directory name is blank.
    pub fn directory_ref(&self) -> Result<DirectoryRef> {
        let directory = self.storage.directory.trim();
        if self.storage.use_external_directory {
            if directory.is_empty() {
                return Err(Error::Config {
                    message: "external directory selected but no directory was granted".into(),
                    key: Some("directory".into()),
                });
            }
            return Ok(DirectoryRef::ExternalGranted {
                uri: directory.to_string(),
            });
        }

        let name = if directory.is_empty() {
            default_directory()
        } else {
            directory.to_string()
        };
        Ok(DirectoryRef::Sandboxed {
            path: self.storage.documents_dir.join(name),
        })
    }

    /// Download base URL, or [`Error::ConfigMissing`] when blank
    pub fn require_download_url(&self) -> Result<&str> {
        require(&self.remote.download_url, "download_url")
    }

    /// Upload URL, or [`Error::ConfigMissing`] when blank
    pub fn require_upload_url(&self) -> Result<&str> {
        require(&self.remote.upload_url, "upload_url")
    }
}

fn require<'a>(value: &'a str, key: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::ConfigMissing { key })
    } else {
        Ok(trimmed)
    }
}

fn default_directory() -> String {
    "birds".to_string()
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("./documents")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_log_file() -> String {
    "log.txt".to_string()
}

fn default_raw_log_name() -> String {
    "data.txt".to_string()
}

fn default_series_name() -> String {
    "events.json".to_string()
}

fn default_chart_window() -> usize {
    6
}

fn default_clear_after() -> Duration {
    Duration::from_secs(10)
}

fn default_sample_interval() -> Duration {
    Duration::from_millis(100)
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_station_layout() {
        let config = Config::default();
        assert_eq!(config.storage.directory, "birds");
        assert!(!config.storage.use_external_directory);
        assert_eq!(config.telemetry.series_name, "events.json");
        assert_eq!(config.telemetry.chart_window, 6);
        assert_eq!(config.progress.clear_after, Duration::from_secs(10));
    }

    #[test]
    fn test_flat_json_snapshot_deserializes_with_defaults() {
        let json = r#"{
            "download_url": "http://station:8080",
            "upload_url": "",
            "directory": "aves",
            "use_external_directory": false
        }"#;
        let config: Config = serde_json::from_str(json).expect("deserialize failed");

        assert_eq!(config.remote.download_url, "http://station:8080");
        assert_eq!(config.storage.directory, "aves");
        assert_eq!(config.telemetry.log_file, "log.txt");
        assert_eq!(config.progress.sample_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_progress_durations_round_trip() {
        let config = Config {
            progress: ProgressConfig {
                clear_after: Duration::from_secs(3),
                sample_interval: Duration::from_millis(250),
            },
            ..Default::default()
        };
        let json = serde_json::to_string(&config).expect("serialize failed");
        let back: Config = serde_json::from_str(&json).expect("deserialize failed");
        assert_eq!(back.progress.clear_after, Duration::from_secs(3));
        assert_eq!(back.progress.sample_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_sandboxed_ref_joins_documents_dir() {
        let mut config = Config::default();
        config.storage.documents_dir = PathBuf::from("/data/app");
        config.storage.directory = "  ".into();

        match config.directory_ref().unwrap() {
            DirectoryRef::Sandboxed { path } => assert_eq!(path, PathBuf::from("/data/app/birds")),
            other => panic!("expected sandboxed ref, got {other:?}"),
        }
    }

    #[test]
    fn test_external_ref_requires_a_granted_uri() {
        let mut config = Config::default();
        config.storage.use_external_directory = true;
        config.storage.directory = String::new();
        assert!(matches!(
            config.directory_ref(),
            Err(Error::Config { .. })
        ));

        config.storage.directory = "file:///sdcard/Birds".into();
        assert_eq!(
            config.directory_ref().unwrap(),
            DirectoryRef::ExternalGranted {
                uri: "file:///sdcard/Birds".into()
            }
        );
    }

    #[test]
    fn test_blank_urls_are_config_missing() {
        let config = Config::default();
        assert!(matches!(
            config.require_download_url(),
            Err(Error::ConfigMissing {
                key: "download_url"
            })
        ));
        assert!(matches!(
            config.require_upload_url(),
            Err(Error::ConfigMissing { key: "upload_url" })
        ));
    }
}
