//! HTTP client for a Skynet portal.
//!
//! Uploads are multipart `POST {portal}/skynet/skyfile` requests answered with
//! `{"skylink": "..."}`; downloads are `GET {portal}/{skylink}`.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, error, info};

use skynote_core::defaults::{
    ENV_PORTAL_TIMEOUT_SECS, ENV_PORTAL_URL, PORTAL_FILE_FIELD, PORTAL_TIMEOUT_SECS, PORTAL_URL,
    PORTAL_UPLOAD_PATH, PORTAL_USER_AGENT, SKYLINK_SCHEME,
};
use skynote_core::{ContentStore, Error, Result, Skylink};

/// Configuration for the portal client.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal base URL, e.g. `https://siasky.net`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_seconds: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: PORTAL_URL.to_string(),
            timeout_seconds: PORTAL_TIMEOUT_SECS,
        }
    }
}

impl PortalConfig {
    /// Read `SKYNET_PORTAL_URL` and `SKYNET_TIMEOUT_SECS`, falling back to defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var(ENV_PORTAL_URL)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| PORTAL_URL.to_string());
        let timeout_seconds = std::env::var(ENV_PORTAL_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(PORTAL_TIMEOUT_SECS);
        Self {
            base_url,
            timeout_seconds,
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    skylink: String,
}

/// Skynet portal client.
pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(PORTAL_USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "portal",
            portal_url = %config.base_url,
            timeout_secs = config.timeout_seconds,
            "Initializing portal client"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ContentStore for PortalClient {
    async fn upload(&self, local_path: &Path) -> Result<Skylink> {
        let start = Instant::now();
        let data = fs::read(local_path).await?;
        let size = data.len();
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "note".to_string());

        let form = Form::new().part(PORTAL_FILE_FIELD, Part::bytes(data).file_name(file_name));
        let url = format!("{}{}", self.base_url, PORTAL_UPLOAD_PATH);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!(subsystem = "portal", op = "upload", url = %url, error = %e, "Upload request failed");
                Error::StoreUploadFailed(format!("request to {} failed: {}", url, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::StoreUploadFailed(format!(
                "portal returned {}: {}",
                status, body
            )));
        }

        let parsed: UploadResponse = response.json().await.map_err(|e| {
            Error::StoreUploadFailed(format!("Failed to parse upload response: {}", e))
        })?;
        if parsed.skylink.is_empty() {
            return Err(Error::StoreUploadFailed(
                "portal returned an empty skylink".to_string(),
            ));
        }

        let skylink = Skylink::new(format!("{}{}", SKYLINK_SCHEME, parsed.skylink));
        info!(
            subsystem = "portal",
            op = "upload",
            skylink = %skylink,
            bytes = size,
            duration_ms = start.elapsed().as_millis() as u64,
            "Uploaded file"
        );
        Ok(skylink)
    }

    async fn download(&self, skylink: &Skylink, destination: &Path) -> Result<()> {
        let start = Instant::now();
        let url = format!("{}/{}", self.base_url, skylink.without_scheme());

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(subsystem = "portal", op = "download", url = %url, error = %e, "Download request failed");
            Error::StoreDownloadFailed(format!("request to {} failed: {}", url, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::StoreDownloadFailed(format!(
                "portal returned {} for {}: {}",
                status, skylink, body
            )));
        }

        let data = response.bytes().await.map_err(|e| {
            Error::StoreDownloadFailed(format!("Failed to read response body: {}", e))
        })?;
        fs::write(destination, &data).await?;

        debug!(
            subsystem = "portal",
            op = "download",
            skylink = %skylink,
            destination = %destination.display(),
            bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Downloaded file"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portal_config_default() {
        let config = PortalConfig::default();
        assert_eq!(config.base_url, "https://siasky.net");
        assert_eq!(config.timeout_seconds, PORTAL_TIMEOUT_SECS);
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = PortalClient::new(PortalConfig {
            base_url: "https://portal.example/".to_string(),
            timeout_seconds: 5,
        })
        .unwrap();
        assert_eq!(client.base_url(), "https://portal.example");
    }
}
