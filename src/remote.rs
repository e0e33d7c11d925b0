//! HTTP client for the station server
//!
//! The core depends on three endpoints only:
//! - `GET {download_url}/files`: manifest of downloadable artifacts
//! - `GET {download_url}/download?file={name}`: raw bytes of one artifact
//! - `POST {upload_url}`: JSON upload of a base64-encoded image

use crate::config::RemoteConfig;
use crate::error::{Error, Result, TransferError};
use crate::types::ManifestItem;
use crate::utils::mime_for_name;
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use url::Url;

/// Manifest bodies accepted from the listing endpoint
///
/// Older station firmware answers with a bare array, newer firmware wraps it
/// with paging fields that the client ignores.
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestBody {
    Bare(Vec<ManifestItem>),
    Wrapped { files: Vec<ManifestItem> },
}

impl From<ManifestBody> for Vec<ManifestItem> {
    fn from(body: ManifestBody) -> Self {
        match body {
            ManifestBody::Bare(items) | ManifestBody::Wrapped { files: items } => items,
        }
    }
}

/// JSON body of an image upload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Base64-encoded image bytes
    pub image_data: String,
    /// Image name as shown by the server
    pub image_name: String,
    /// Original file name
    pub file_name: String,
    /// MIME type of the image
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl UploadRequest {
    /// Build an upload body for a stored image
    pub fn from_image(name: &str, bytes: &[u8]) -> Self {
        Self {
            image_data: general_purpose::STANDARD.encode(bytes),
            image_name: name.to_string(),
            file_name: name.to_string(),
            mime_type: mime_for_name(name).to_string(),
        }
    }
}

/// Client for the station endpoints of one configuration snapshot
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoints: RemoteConfig,
}

impl RemoteClient {
    /// Create a client for the given endpoints
    pub fn new(endpoints: RemoteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Configured endpoints
    pub fn endpoints(&self) -> &RemoteConfig {
        &self.endpoints
    }

    fn base(&self) -> Result<&str> {
        let base = self.endpoints.download_url.trim();
        if base.is_empty() {
            return Err(Error::ConfigMissing {
                key: "download_url",
            });
        }
        Ok(base.trim_end_matches('/'))
    }

    fn parse(url: &str, key: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::Config {
            message: format!("invalid URL {url}: {e}"),
            key: Some(key.to_string()),
        })
    }

    /// URL of the manifest endpoint
    pub fn manifest_url(&self) -> Result<Url> {
        Self::parse(&format!("{}/files", self.base()?), "download_url")
    }

    /// URL that serves the artifact `file`
    pub fn download_url(&self, file: &str) -> Result<Url> {
        let mut url = Self::parse(&format!("{}/download", self.base()?), "download_url")?;
        url.query_pairs_mut().append_pair("file", file);
        Ok(url)
    }

    /// Fetch the manifest, preserving server order
    pub async fn fetch_manifest(&self) -> Result<Vec<ManifestItem>> {
        let url = self.manifest_url()?;
        let response = self.get(url).await?;
        let body = response.bytes().await.map_err(TransferError::from)?;
        let manifest: ManifestBody = serde_json::from_slice(&body)?;
        Ok(manifest.into())
    }

    /// Start downloading `file`; the body is left unread for streaming
    pub async fn open_download(&self, file: &str) -> Result<reqwest::Response> {
        let url = self.download_url(file)?;
        Ok(self.get(url).await?)
    }

    /// Download `file` fully into memory
    pub async fn fetch_bytes(&self, file: &str) -> Result<Vec<u8>> {
        let response = self.open_download(file).await?;
        let bytes = response.bytes().await.map_err(TransferError::from)?;
        Ok(bytes.to_vec())
    }

    /// URL of the upload endpoint
    pub fn upload_url(&self) -> Result<Url> {
        let raw = self.endpoints.upload_url.trim();
        if raw.is_empty() {
            return Err(Error::ConfigMissing { key: "upload_url" });
        }
        Self::parse(raw, "upload_url")
    }

    /// POST an image upload; any non-success status is a failure
    pub async fn upload(&self, request: &UploadRequest) -> Result<()> {
        let url = self.upload_url()?;

        let response = self
            .http
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(TransferError::from)?;
        check_status(&url, &response)?;
        Ok(())
    }

    async fn get(&self, url: Url) -> std::result::Result<reqwest::Response, TransferError> {
        tracing::debug!(url = %url, "GET");
        let response = self.http.get(url.clone()).send().await?;
        check_status(&url, &response)?;
        Ok(response)
    }
}

/// Fail with [`TransferError::Status`] unless the response is a 2xx
pub(crate) fn check_status(
    url: &Url,
    response: &reqwest::Response,
) -> std::result::Result<(), TransferError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}
