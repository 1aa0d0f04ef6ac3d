use crate::config::Config;
use crate::errors::AppError;
use crate::models::RunOutcome;
use crate::orchestrator::RunOrchestrator;
use crate::tracking::RunTracker;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Held for the whole duration of a run.
    pub orchestrator: Arc<Mutex<RunOrchestrator>>,
    /// Local-only view of the tracker file for read endpoints.
    pub tracker: Arc<RunTracker>,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let busy = state.orchestrator.try_lock().is_err();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "dodge-leads-sync",
            "version": env!("CARGO_PKG_VERSION"),
            "run_in_progress": busy,
            "schedule": state.config.sync_cron,
        })),
    )
}

/// GET /api/v1/runs
///
/// Returns the recorded run log and the number of processed lead ids.
pub async fn list_runs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let tracker_state = state.tracker.load().await;
    Json(json!({
        "runs": tracker_state.runs,
        "processed_ids": tracker_state.processed_ids.len(),
    }))
}

/// POST /api/v1/runs
///
/// Runs the pipeline now. Rejected with 409 while another run holds the lock.
pub async fn trigger_run(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunOutcome>, AppError> {
    let guard = state
        .orchestrator
        .try_lock()
        .map_err(|_| AppError::Conflict("A run is already in progress".to_string()))?;

    tracing::info!("POST /api/v1/runs - manual run triggered");
    let outcome = guard.run().await?;
    Ok(Json(outcome))
}
