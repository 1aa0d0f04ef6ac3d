//! Narrow interfaces to the external collaborators of a run.
//!
//! The orchestrator only talks to these traits; the HTTP-backed
//! implementations live in `search_client`, `blob_client` and
//! `sharepoint_client`.

use crate::errors::AppError;
use crate::models::{SearchPage, SearchWindow};
use async_trait::async_trait;

/// Project search against the lead provider.
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Returns at most one page of projects published inside `window`.
    async fn search(
        &self,
        project_types: &[String],
        window: SearchWindow,
    ) -> Result<SearchPage, AppError>;
}

/// Primary destination for artifacts (write-by-name).
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Writes `bytes` under `name`, overwriting any existing object.
    async fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), AppError>;
}

/// Authenticated file share used for artifact copies and the tracker mirror.
#[async_trait]
pub trait FileShare: Send + Sync {
    /// `Ok(None)` when the file does not exist.
    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>, AppError>;

    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError>;
}
