//! Runs the lead transformer over one search result and writes the CSV artifact.

use crate::correlation::CorrelationTable;
use crate::errors::{AppError, ResultExt};
use crate::models::LeadRow;
use crate::transform::{transform, Decision, SkipReason};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// In-memory result of transforming a batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Accepted rows in encounter order.
    pub rows: Vec<LeadRow>,
    /// Ids seen in earlier runs plus repeats within this batch.
    pub duplicates: usize,
    /// Records dropped for any reason other than duplication.
    pub skipped: usize,
    /// Ids of accepted rows, not yet committed to the tracker.
    pub newly_seen: HashSet<String>,
}

/// A written output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
    pub rows: usize,
}

/// Batch result plus the artifact, if any rows were accepted.
#[derive(Debug)]
pub struct BatchReport {
    pub artifact: Option<Artifact>,
    pub unique: usize,
    pub duplicates: usize,
    pub newly_seen: HashSet<String>,
}

/// Transforms every record; `seen` is never modified.
pub fn process_batch(
    records: &[Value],
    table: &CorrelationTable,
    seen: &HashSet<String>,
) -> BatchOutcome {
    tracing::info!("Processing {} projects from API...", records.len());

    let mut outcome = BatchOutcome::default();
    for record in records {
        match transform(record, table, seen, &mut outcome.newly_seen) {
            Decision::Accepted(row) => outcome.rows.push(*row),
            Decision::Skipped(SkipReason::Duplicate(_)) => outcome.duplicates += 1,
            Decision::Skipped(_) => outcome.skipped += 1,
        }
    }
    outcome
}

/// Artifact name for a run started at `now`.
pub fn artifact_file_name(now: DateTime<Utc>) -> String {
    format!("processed_api_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Writes `rows` as CSV into `output_dir`. Zero rows write nothing.
///
/// A failed write removes the partial file.
pub fn write_artifact(
    rows: &[LeadRow],
    output_dir: &Path,
    now: DateTime<Utc>,
) -> Result<Option<Artifact>, AppError> {
    if rows.is_empty() {
        tracing::info!("No unique projects found to process");
        return Ok(None);
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;

    let file_name = artifact_file_name(now);
    let path = output_dir.join(&file_name);

    if let Err(e) = write_rows(rows, &path) {
        if path.exists() {
            if let Err(rm) = std::fs::remove_file(&path) {
                tracing::warn!("Could not remove partial artifact {}: {}", path.display(), rm);
            }
        }
        return Err(AppError::WithContext {
            source: Box::new(e),
            context: format!("Failed to write {}", file_name),
        });
    }

    tracing::info!("Created {}", file_name);
    tracing::info!("   - {} unique projects processed", rows.len());

    Ok(Some(Artifact {
        path,
        file_name,
        rows: rows.len(),
    }))
}

fn write_rows(rows: &[LeadRow], path: &Path) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Transforms a batch and writes its artifact.
pub struct BatchProcessor<'a> {
    table: &'a CorrelationTable,
    output_dir: &'a Path,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(table: &'a CorrelationTable, output_dir: &'a Path) -> Self {
        Self { table, output_dir }
    }

    pub fn run(
        &self,
        records: &[Value],
        seen: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<BatchReport, AppError> {
        let outcome = process_batch(records, self.table, seen);
        if outcome.duplicates > 0 {
            tracing::info!("   - {} duplicates skipped", outcome.duplicates);
        }
        if outcome.skipped > 0 {
            tracing::info!("   - {} projects skipped by type rules", outcome.skipped);
        }

        let artifact = write_artifact(&outcome.rows, self.output_dir, now)?;

        Ok(BatchReport {
            artifact,
            unique: outcome.rows.len(),
            duplicates: outcome.duplicates,
            newly_seen: outcome.newly_seen,
        })
    }
}
