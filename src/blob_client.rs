use crate::errors::AppError;
use crate::storage::ArtifactStore;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Writes artifacts into an Azure blob container addressed by a SAS URL.
#[derive(Clone)]
pub struct BlobClient {
    client: reqwest::Client,
    container_url: Url,
}

impl BlobClient {
    /// `sas_url` is the container URL with its SAS token as query string.
    pub fn new(sas_url: &str) -> Result<Self, AppError> {
        let container_url = Url::parse(sas_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid blob SAS URL: {}", e)))?;
        if container_url.cannot_be_a_base() {
            return Err(AppError::ConfigError(
                "Blob SAS URL cannot carry a path".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::StorageError(format!("Failed to create blob client: {}", e)))?;

        Ok(Self {
            client,
            container_url,
        })
    }

    /// Full blob URL for `name` (slashes become path segments), SAS query kept.
    pub fn blob_url(&self, name: &str) -> Result<Url, AppError> {
        let mut url = self.container_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::ConfigError("Blob SAS URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(name.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

#[async_trait]
impl ArtifactStore for BlobClient {
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        let url = self.blob_url(name)?;
        tracing::info!("Uploading {} ({} bytes) to blob storage", name, bytes.len());

        let response = self
            .client
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Blob upload failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::StorageError(format!(
                "Blob storage returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!("✓ Uploaded to blob storage: {}", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_url_keeps_sas_query() {
        let client =
            BlobClient::new("https://acct.blob.core.windows.net/leads?sv=2024&sig=abc").unwrap();
        let url = client
            .blob_url("Leads/Production/processed_api_20251031_110000.csv")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/leads/Leads/Production/processed_api_20251031_110000.csv?sv=2024&sig=abc"
        );
    }

    #[test]
    fn test_trailing_slash_container() {
        let client = BlobClient::new("https://acct.blob.core.windows.net/leads/?sig=x").unwrap();
        let url = client.blob_url("a.csv").unwrap();
        assert_eq!(url.path(), "/leads/a.csv");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(BlobClient::new("not a url").is_err());
    }
}
