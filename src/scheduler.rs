use crate::orchestrator::RunOrchestrator;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Runs the pipeline once unless another run holds the lock.
pub async fn run_exclusive(orchestrator: &Mutex<RunOrchestrator>, trigger: &str) {
    let Ok(guard) = orchestrator.try_lock() else {
        tracing::warn!("{} run skipped: a run is already in progress", trigger);
        return;
    };

    tracing::info!("{} run triggered", trigger);
    if let Err(e) = guard.run().await {
        tracing::error!("{} run aborted: {}", trigger, e);
    }
}

/// Builds and starts the cron scheduler driving periodic runs.
pub async fn start(cron: &str, orchestrator: Arc<Mutex<RunOrchestrator>>) -> Result<JobScheduler> {
    let sched = JobScheduler::new().await.context("creating scheduler")?;

    let job = Job::new_async(cron, move |_uuid, _l| {
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            run_exclusive(&orchestrator, "Scheduled").await;
        })
    })
    .with_context(|| format!("creating scheduler job for cron {cron}"))?;

    sched.add(job).await.context("adding scheduler job")?;
    sched.start().await.context("starting scheduler")?;
    tracing::info!("Scheduler started with cron '{}'", cron);

    Ok(sched)
}
