use crate::errors::AppError;
use crate::storage::FileShare;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Azure AD app registration used for the client-credentials flow.
#[derive(Debug, Clone)]
pub struct GraphCredentials {
    pub authority_url: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// SharePoint document library accessed through Microsoft Graph.
#[derive(Clone)]
pub struct SharePointClient {
    client: reqwest::Client,
    graph_base_url: String,
    site_id: String,
    drive_id: String,
    credentials: GraphCredentials,
}

impl SharePointClient {
    pub fn new(
        graph_base_url: String,
        site_id: String,
        drive_id: String,
        credentials: GraphCredentials,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::StorageError(format!("Failed to create SharePoint client: {}", e))
            })?;

        Ok(Self {
            client,
            graph_base_url,
            site_id,
            drive_id,
            credentials,
        })
    }

    /// Fetches a fresh app-only token. Tokens are not cached between calls.
    async fn access_token(&self) -> Result<String, AppError> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.credentials.authority_url, self.credentials.tenant_id
        );

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", GRAPH_SCOPE),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::StorageError(format!(
                "Token endpoint returned {}: {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::StorageError(format!("Failed to parse token response: {}", e))
        })?;
        Ok(token.access_token)
    }

    /// Graph content URL for a drive-relative path.
    pub fn content_url(&self, path: &str) -> String {
        format!(
            "{}/v1.0/sites/{}/drives/{}/root:/{}:/content",
            self.graph_base_url,
            self.site_id,
            self.drive_id,
            path.trim_matches('/')
        )
    }
}

#[async_trait]
impl FileShare for SharePointClient {
    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, AppError> {
        let token = self.access_token().await?;
        let url = self.content_url(path);
        tracing::debug!("Downloading {} from SharePoint", path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("SharePoint download failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::StorageError(format!(
                "SharePoint returned {}: {}",
                status, error_text
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            AppError::StorageError(format!("Failed to read SharePoint file: {}", e))
        })?;
        Ok(Some(bytes.to_vec()))
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        let token = self.access_token().await?;
        let url = self.content_url(path);
        tracing::info!("Uploading {} ({} bytes) to SharePoint", path, bytes.len());

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("SharePoint upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::StorageError(format!(
                "SharePoint upload returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!("✓ Uploaded to SharePoint: {}", path);
        Ok(())
    }
}
