//! One end-to-end sync run: search, transform, store, commit, record.

use crate::batch::{Artifact, BatchProcessor, BatchReport};
use crate::config::Config;
use crate::correlation::CorrelationTable;
use crate::errors::{AppError, ResultExt};
use crate::models::{RunOutcome, RunStatus, SearchWindow};
use crate::storage::{ArtifactStore, FileShare, LeadSource};
use crate::tracking::{RunTracker, TrackerState};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Joins a folder prefix and a file name with a single `/`.
pub fn remote_path(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", folder, file_name)
    }
}

/// Tracker key for a run started at `now`.
pub fn run_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

pub struct RunOrchestrator {
    config: Arc<Config>,
    source: Arc<dyn LeadSource>,
    store: Arc<dyn ArtifactStore>,
    share: Arc<dyn FileShare>,
    tracker: RunTracker,
}

impl RunOrchestrator {
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn LeadSource>,
        store: Arc<dyn ArtifactStore>,
        share: Arc<dyn FileShare>,
    ) -> Self {
        let tracker = RunTracker::new(config.tracker_local_path())
            .with_mirror(share.clone(), config.tracker_remote_path.clone());
        Self {
            config,
            source,
            store,
            share,
            tracker,
        }
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub async fn run(&self) -> Result<RunOutcome, AppError> {
        self.run_at(Utc::now()).await
    }

    /// Executes a run as if started at `now`.
    ///
    /// Only a missing mapping table or a failed primary tracker save are
    /// returned as `Err`; every other failure is recorded in the outcome.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunOutcome, AppError> {
        tracing::info!("Starting Dodge API sync at {}", now);

        let table = CorrelationTable::from_csv_path(&self.config.mapping_file)
            .context("Failed to load correlation table")?;
        tracing::info!("Loaded {} correlation entries", table.len());

        let mut state = self.tracker.load().await;
        let outcome = self.execute(&table, &mut state, now).await;

        match outcome.status {
            RunStatus::Success => tracing::info!(
                "Run finished: {} found, {} unique, {} duplicates",
                outcome.projects_found,
                outcome.unique_projects,
                outcome.duplicates_skipped
            ),
            RunStatus::Failed => tracing::error!(
                "Run failed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
        }

        state.record_run(run_key(now), outcome.clone());
        self.tracker.save(&state).await?;
        Ok(outcome)
    }

    async fn execute(
        &self,
        table: &CorrelationTable,
        state: &mut TrackerState,
        now: DateTime<Utc>,
    ) -> RunOutcome {
        let window = SearchWindow::ending(now.date_naive(), self.config.days_back);
        let project_types = table.included_types();
        if project_types.is_empty() {
            tracing::warn!("No project types are marked for inclusion");
        }

        let page = match self.source.search(&project_types, window).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Project search failed: {}", e);
                return RunOutcome::failed(0, format!("Project search failed: {}", e));
            }
        };

        let found = page.projects.len();
        if found == 0 {
            tracing::info!("No projects returned for {} to {}", window.min, window.max);
            return RunOutcome::empty_success(0, 0);
        }

        let processor = BatchProcessor::new(table, &self.config.output_dir);
        let report = match processor.run(&page.projects, &state.processed_ids, now) {
            Ok(report) => report,
            Err(e) => return RunOutcome::failed(found, e.to_string()),
        };

        let BatchReport {
            artifact,
            unique,
            duplicates,
            newly_seen,
        } = report;

        let Some(artifact) = artifact else {
            state.commit(newly_seen);
            return RunOutcome::empty_success(found, duplicates);
        };

        let mut outcome = RunOutcome {
            status: RunStatus::Success,
            projects_found: found,
            unique_projects: unique,
            duplicates_skipped: duplicates,
            output_file: Some(artifact.file_name.clone()),
            blob_uploaded: false,
            sharepoint_uploaded: false,
            error: None,
        };

        if let Err(e) = self.store_artifact(&artifact, &mut outcome).await {
            tracing::error!("{}", e);
            outcome.status = RunStatus::Failed;
            outcome.error = Some(e.to_string());
            return outcome;
        }

        state.commit(newly_seen);
        outcome
    }

    /// Primary upload is required; the SharePoint copy is best effort.
    async fn store_artifact(
        &self,
        artifact: &Artifact,
        outcome: &mut RunOutcome,
    ) -> Result<(), AppError> {
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .with_context(|| format!("Failed to read artifact {}", artifact.path.display()))?;

        let blob_name = remote_path(&self.config.blob_prefix, &artifact.file_name);
        self.store
            .put(&blob_name, bytes.clone())
            .await
            .context("Blob storage upload failed")?;
        outcome.blob_uploaded = true;

        let share_path = remote_path(&self.config.sharepoint_processed_folder, &artifact.file_name);
        match self.share.upload(&share_path, bytes).await {
            Ok(()) => outcome.sharepoint_uploaded = true,
            Err(e) => tracing::warn!("SharePoint upload failed, continuing: {}", e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_remote_path() {
        assert_eq!(remote_path("Leads/Production", "a.csv"), "Leads/Production/a.csv");
        assert_eq!(remote_path("/Processed/", "a.csv"), "Processed/a.csv");
        assert_eq!(remote_path("", "a.csv"), "a.csv");
    }

    #[test]
    fn test_run_key() {
        let now = Utc.with_ymd_and_hms(2025, 10, 31, 11, 0, 0).unwrap();
        assert_eq!(run_key(now), "2025-10-31T11:00:00.000000");
    }
}
