//! Shared test helpers for creating FieldMonitor instances in tests.

use crate::config::Config;
use crate::monitor::FieldMonitor;
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config rooted in `temp`, pointed at `server` for both endpoints
pub(crate) fn test_config(temp: &TempDir, server: Option<&MockServer>) -> Config {
    let mut config = Config::default();
    config.storage.documents_dir = temp.path().join("documents");
    config.storage.scratch_dir = temp.path().join("cache");
    config.progress.sample_interval = Duration::ZERO;
    config.progress.clear_after = Duration::from_millis(500);
    if let Some(server) = server {
        config.remote.download_url = server.uri();
        config.remote.upload_url = format!("{}/upload", server.uri());
    }
    config
}

/// Sandboxed monitor talking to `server`.
/// Returns the monitor and the tempdir (which must be kept alive).
pub(crate) fn create_test_monitor(server: &MockServer) -> (FieldMonitor, TempDir) {
    let temp = tempdir().unwrap();
    let monitor = FieldMonitor::new(test_config(&temp, Some(server))).unwrap();
    (monitor, temp)
}

/// Mount a manifest listing `ids` in order
pub(crate) async fn mount_manifest(server: &MockServer, ids: &[&str]) {
    let files: Vec<_> = ids.iter().map(|id| serde_json::json!({ "file": id })).collect();
    Mock::given(method("GET"))
        .and(path("/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(files))
        .mount(server)
        .await;
}

/// Serve `body` for `GET /download?file=<file>`, expecting exactly `times` requests
pub(crate) async fn mount_file(server: &MockServer, file: &str, status: u16, body: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path("/download"))
        .and(query_param("file", file))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
        .expect(times)
        .mount(server)
        .await;
}

/// Sample station log with one marker line and a `nan` reading
pub(crate) const SAMPLE_LOG: &str = "2025-11-17T22-13-28,PERIODIC,,\n\
    2025-11-17T22-13-28,DATA,Temperatura ambiente,21.5\n\
    2025-11-17T22-14-00,DATA,Temperatura ambiente,nan\n\
    2025-11-17T22-14-00,BIRD,,\n\
    2025-11-17T22-15-00,DATA,Humedad interna,48.2\n";
