//! Persistent run-tracking state: processed lead ids and the run log.
//!
//! The state file is read fully at the start of a run and written fully at
//! the end. A SharePoint copy is refreshed before reading and updated after
//! writing.

use crate::errors::{AppError, ResultExt};
use crate::models::RunOutcome;
use crate::storage::FileShare;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// In-memory tracker state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    /// Every lead id ever committed to an uploaded artifact.
    pub processed_ids: HashSet<String>,
    /// Run outcomes keyed by ISO-8601 run timestamp.
    pub runs: BTreeMap<String, RunOutcome>,
}

impl TrackerState {
    /// Merges ids of a successfully stored run.
    pub fn commit(&mut self, newly_seen: HashSet<String>) {
        self.processed_ids.extend(newly_seen);
    }

    pub fn record_run(&mut self, timestamp: String, outcome: RunOutcome) {
        self.runs.insert(timestamp, outcome);
    }
}

/// On-disk layout; ids are a sorted list.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackerFile {
    #[serde(rename = "apiRuns", alias = "api_runs", default)]
    api_runs: BTreeMap<String, RunOutcome>,
    #[serde(rename = "processedIds", alias = "processed_dr_numbers", default)]
    processed_ids: Vec<String>,
}

impl From<&TrackerState> for TrackerFile {
    fn from(state: &TrackerState) -> Self {
        let mut ids: Vec<String> = state.processed_ids.iter().cloned().collect();
        ids.sort();
        Self {
            api_runs: state.runs.clone(),
            processed_ids: ids,
        }
    }
}

impl From<TrackerFile> for TrackerState {
    fn from(file: TrackerFile) -> Self {
        Self {
            processed_ids: file.processed_ids.into_iter().collect(),
            runs: file.api_runs,
        }
    }
}

/// Parses tracker bytes, falling back to empty state on any corruption.
pub fn decode_state(bytes: &[u8]) -> TrackerState {
    match serde_json::from_slice::<TrackerFile>(bytes) {
        Ok(file) => file.into(),
        Err(e) => {
            tracing::warn!("Tracking file is malformed, starting fresh: {}", e);
            TrackerState::default()
        }
    }
}

pub fn encode_state(state: &TrackerState) -> Result<Vec<u8>, AppError> {
    Ok(serde_json::to_vec_pretty(&TrackerFile::from(state))?)
}

/// Loads and saves [`TrackerState`] via a local file plus an optional mirror.
pub struct RunTracker {
    local_path: PathBuf,
    mirror: Option<(Arc<dyn FileShare>, String)>,
}

impl RunTracker {
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            mirror: None,
        }
    }

    /// Mirrors the tracker file to `remote_path` on `share`.
    pub fn with_mirror(mut self, share: Arc<dyn FileShare>, remote_path: impl Into<String>) -> Self {
        self.mirror = Some((share, remote_path.into()));
        self
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Never fails: a missing or unreadable state yields an empty one.
    pub async fn load(&self) -> TrackerState {
        self.refresh_from_mirror().await;

        let bytes = match tokio::fs::read(&self.local_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No tracking file yet at {}", self.local_path.display());
                return TrackerState::default();
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read tracking file {}: {}",
                    self.local_path.display(),
                    e
                );
                return TrackerState::default();
            }
        };

        let state = decode_state(&bytes);
        tracing::info!("Loaded {} previous API runs", state.runs.len());
        tracing::info!("Loaded {} processed DRNumbers", state.processed_ids.len());
        state
    }

    async fn refresh_from_mirror(&self) {
        let Some((share, remote_path)) = &self.mirror else {
            return;
        };

        match share.download(remote_path).await {
            Ok(Some(bytes)) => {
                if let Err(e) = self.write_local(&bytes).await {
                    tracing::warn!("Could not store downloaded tracking file: {}", e);
                } else {
                    tracing::info!("Downloaded existing tracking file from SharePoint");
                }
            }
            Ok(None) => tracing::info!("No tracking file on SharePoint yet"),
            Err(e) => tracing::warn!("Tracking file download failed, using local copy: {}", e),
        }
    }

    /// Replaces the local file through a sibling temp file and a rename, so
    /// concurrent readers see either the old or the new state.
    async fn write_local(&self, bytes: &[u8]) -> Result<(), AppError> {
        if let Some(parent) = self.local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let staging = self.staging_path();
        if let Err(e) = tokio::fs::write(&staging, bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &self.local_path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .local_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.local_path.with_file_name(name)
    }

    /// Writes the local file (errors surface) and then the mirror (errors logged).
    pub async fn save(&self, state: &TrackerState) -> Result<(), AppError> {
        let bytes = encode_state(state)?;
        self.write_local(&bytes).await.with_context(|| {
            format!("Failed to write tracking file {}", self.local_path.display())
        })?;

        if let Some((share, remote_path)) = &self.mirror {
            match share.upload(remote_path, bytes).await {
                Ok(()) => tracing::info!("Uploaded tracking file to SharePoint: {}", remote_path),
                Err(e) => tracing::warn!("Tracking file mirror upload failed: {}", e),
            }
        }
        Ok(())
    }
}
