//! Common test utilities for birdmon integration tests

#![allow(dead_code)]

use birdmon::{Config, Event};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Station log covering every record shape the transform has to handle
pub const STATION_LOG: &str = "2025-11-17T22-13-28,PERIODIC,,\n\
    2025-11-17T22-13-28,DATA,Temperatura ambiente,21.5\n\
    2025-11-17T22-13-28,DATA,Humedad interna,47.0\n\
    2025-11-17T22-13-30,BIRD,,\n\
    2025-11-17T22-14-00,DATA,Temperatura ambiente,nan\n\
    2025-11-17T22-14-00,DATA,Corriente de Bateria,0.42\n\
    garbage line without commas\n\
    2025-11-17T22-15-00,DATA,Temperatura ambiente,22.0\n\
    2025-11-17T22-15-00,DATA,Error acumulado,oops\n";

/// A mock station serving a manifest, images and the telemetry log
pub struct Station {
    pub server: MockServer,
}

impl Station {
    /// Start a station whose manifest lists `images`; ids listed in `broken`
    /// answer 500 instead of bytes
    pub async fn start(images: &[&str], broken: &[&str]) -> Self {
        let server = MockServer::start().await;

        let files: Vec<_> = images
            .iter()
            .map(|id| serde_json::json!({ "file": id, "size": id.len() }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": files,
                "has_more": false,
                "total": images.len()
            })))
            .mount(&server)
            .await;

        for id in images {
            let response = if broken.contains(id) {
                ResponseTemplate::new(500)
            } else {
                ResponseTemplate::new(200).set_body_bytes(image_bytes(id))
            };
            Mock::given(method("GET"))
                .and(path("/download"))
                .and(query_param("file", *id))
                .respond_with(response)
                .expect(1)
                .mount(&server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/download"))
            .and(query_param("file", "log.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(STATION_LOG))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Configuration pointing at this station, rooted in `temp`
    pub fn config(&self, temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.remote.download_url = self.server.uri();
        config.remote.upload_url = format!("{}/upload", self.server.uri());
        config.storage.documents_dir = temp.path().join("documents");
        config.storage.scratch_dir = temp.path().join("cache");
        config.progress.clear_after = Duration::from_secs(1);
        config
    }

    /// Number of upload requests received so far
    pub async fn uploads(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/upload")
            .count()
    }
}

/// Fake JPEG bytes that identify the remote item
pub fn image_bytes(id: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend_from_slice(id.as_bytes());
    bytes
}

/// Drain every event currently buffered on `rx`
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
