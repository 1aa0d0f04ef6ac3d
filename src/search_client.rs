use crate::errors::AppError;
use crate::models::{SearchPage, SearchRequest, SearchWindow};
use crate::storage::LeadSource;
use async_trait::async_trait;
use std::time::Duration;

/// Client for the Dodge project search API.
#[derive(Clone)]
pub struct DodgeSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: usize,
}

impl DodgeSearchClient {
    /// Creates a new `DodgeSearchClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the API, without trailing slash.
    /// * `api_key` - Value of the `x-api-key` header.
    /// * `page_size` - Maximum projects requested per search.
    pub fn new(base_url: String, api_key: String, page_size: usize) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Dodge client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            page_size,
        })
    }
}

#[async_trait]
impl LeadSource for DodgeSearchClient {
    async fn search(
        &self,
        project_types: &[String],
        window: SearchWindow,
    ) -> Result<SearchPage, AppError> {
        let url = format!("{}/project/search", self.base_url);
        tracing::info!(
            "Searching Dodge projects published {} to {} ({} types)",
            window.min,
            window.max,
            project_types.len()
        );

        let body = SearchRequest::new(project_types.to_vec(), window, self.page_size);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Dodge request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Dodge returned {}: {}",
                status, error_text
            )));
        }

        let mut page: SearchPage = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse Dodge response: {}", e))
        })?;

        if page.total > self.page_size {
            tracing::warn!(
                "Dodge reported {} projects but only {} are fetched per run",
                page.total,
                self.page_size
            );
        }
        page.projects.truncate(self.page_size);

        tracing::info!("Found {} projects", page.projects.len());
        Ok(page)
    }
}
