// Blob storage access - existence checks, listing and uploads over REST

use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("storage request failed: {0}")]
    Request(String),
}

/// Seam over cloud object storage so the locator and orchestrator can be
/// exercised without a network.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Byte size of the blob if it exists
    async fn head(&self, container: &str, key: &str) -> Result<Option<u64>, StorageError>;

    /// Keys of blobs in the container, optionally filtered by prefix
    async fn list(&self, container: &str, prefix: Option<&str>)
        -> Result<Vec<String>, StorageError>;

    /// Write bytes to a blob, overwriting any existing one
    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Containers searched for bare filenames, in order
    fn containers(&self) -> &[String];

    /// Authorized URL for a blob, usable by the translation service
    fn url_for(&self, container: &str, key: &str) -> String;
}

/// Azure Blob Storage client addressed by account + SAS token
pub struct AzureBlobStore {
    client: reqwest::Client,
    base_url: String,
    sas_token: String,
    containers: Vec<String>,
}

impl AzureBlobStore {
    pub fn new(account: &str, sas_token: &str, containers: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");

        Self {
            client,
            base_url: format!("https://{}.blob.core.windows.net", account),
            sas_token: sas_token.trim_start_matches('?').to_string(),
            containers,
        }
    }

    fn blob_url(&self, container: &str, key: &str) -> String {
        format!("{}/{}/{}?{}", self.base_url, container, key, self.sas_token)
    }
}

#[async_trait]
impl ObjectStore for AzureBlobStore {
    async fn head(&self, container: &str, key: &str) -> Result<Option<u64>, StorageError> {
        let response = self
            .client
            .head(self.blob_url(container, key))
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let size = response
                    .headers()
                    .get(reqwest::header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                Ok(Some(size))
            }
            404 => Ok(None),
            401 | 403 => Err(StorageError::AccessDenied(format!(
                "{}/{}",
                container, key
            ))),
            status => Err(StorageError::Request(format!(
                "HEAD {}/{} returned {}",
                container, key, status
            ))),
        }
    }

    async fn list(
        &self,
        container: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<String>, StorageError> {
        let mut url = format!(
            "{}/{}?restype=container&comp=list&{}",
            self.base_url, container, self.sas_token
        );
        if let Some(prefix) = prefix {
            url.push_str(&format!("&prefix={}", prefix));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        match response.status().as_u16() {
            200 => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| StorageError::Request(e.to_string()))?;
                Ok(parse_blob_names(&body))
            }
            401 | 403 => Err(StorageError::AccessDenied(container.to_string())),
            status => Err(StorageError::Request(format!(
                "listing container '{}' returned {}",
                container, status
            ))),
        }
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .client
            .put(self.blob_url(container, key))
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        match response.status().as_u16() {
            201 => Ok(()),
            401 | 403 => Err(StorageError::AccessDenied(format!(
                "{}/{}",
                container, key
            ))),
            status => Err(StorageError::Request(format!(
                "PUT {}/{} returned {}",
                container, key, status
            ))),
        }
    }

    fn containers(&self) -> &[String] {
        &self.containers
    }

    fn url_for(&self, container: &str, key: &str) -> String {
        self.blob_url(container, key)
    }
}

/// Extract blob names from the service's XML list response
fn parse_blob_names(body: &str) -> Vec<String> {
    // The enumeration payload is XML; the only fields we need are the
    // <Name> elements inside each <Blob>.
    let pattern = Regex::new(r"<Name>([^<]+)</Name>").expect("valid regex");
    pattern
        .captures_iter(body)
        .map(|c| c[1].to_string())
        .collect()
}
