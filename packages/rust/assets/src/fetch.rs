//! HTTP download of remote assets.

use newsroom_shared::{AssetConfig, NewsroomError, Result};
use reqwest::Client;
use tracing::debug;

/// Maximum number of redirects to follow for one download.
const MAX_REDIRECTS: usize = 5;

/// Bytes of one downloaded asset.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub url: String,
    pub bytes: Vec<u8>,
    /// `Content-Type` without parameters, if the server sent one.
    pub content_type: Option<String>,
}

/// Downloads assets with a fixed timeout and size cap. Failures are not retried.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: Client,
    max_bytes: u64,
}

impl AssetFetcher {
    pub fn new(config: &AssetConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| NewsroomError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: config.max_download_bytes,
        })
    }

    /// Download `url` in full.
    pub async fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsroomError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsroomError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(self.too_large(url, len));
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        // Servers may omit or understate Content-Length, so cap while reading.
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NewsroomError::Network(format!("{url}: failed to read body: {e}")))?
        {
            let total = (bytes.len() + chunk.len()) as u64;
            if total > self.max_bytes {
                return Err(self.too_large(url, total));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(url, bytes = bytes.len(), content_type = ?content_type, "asset downloaded");
        Ok(FetchedAsset {
            url: url.to_string(),
            bytes,
            content_type,
        })
    }

    fn too_large(&self, url: &str, len: u64) -> NewsroomError {
        NewsroomError::validation(format!(
            "{url}: asset too large ({len} bytes, max {})",
            self.max_bytes
        ))
    }
}
