use axum::{routing::get, Router};
use dodge_leads_sync::blob_client::BlobClient;
use dodge_leads_sync::config::Config;
use dodge_leads_sync::handlers::{self, AppState};
use dodge_leads_sync::orchestrator::RunOrchestrator;
use dodge_leads_sync::scheduler;
use dodge_leads_sync::search_client::DodgeSearchClient;
use dodge_leads_sync::sharepoint_client::{GraphCredentials, SharePointClient};
use dodge_leads_sync::tracking::RunTracker;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the external clients and
/// the run orchestrator, starts the cron scheduler and serves the HTTP
/// surface (health, run log, manual trigger).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dodge_leads_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded successfully");

    let search = DodgeSearchClient::new(
        config.dodge_api_base_url.clone(),
        config.dodge_api_key.clone(),
        config.page_size,
    )?;
    tracing::info!("✓ Dodge client initialized: {}", config.dodge_api_base_url);

    let blob = BlobClient::new(&config.blob_sas_url)?;
    tracing::info!("✓ Blob storage client initialized");

    let sharepoint = SharePointClient::new(
        config.graph_base_url.clone(),
        config.sharepoint_site_id.clone(),
        config.sharepoint_drive_id.clone(),
        GraphCredentials {
            authority_url: config.azure_authority_url.clone(),
            tenant_id: config.azure_tenant_id.clone(),
            client_id: config.azure_client_id.clone(),
            client_secret: config.azure_client_secret.clone(),
        },
    )?;
    tracing::info!("✓ SharePoint client initialized");

    let orchestrator = Arc::new(Mutex::new(RunOrchestrator::new(
        config.clone(),
        Arc::new(search),
        Arc::new(blob),
        Arc::new(sharepoint),
    )));

    let _scheduler = scheduler::start(&config.sync_cron, orchestrator.clone()).await?;

    if config.run_on_startup {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            scheduler::run_exclusive(&orchestrator, "Startup").await;
        });
    }

    let app_state = Arc::new(AppState {
        config: config.clone(),
        orchestrator,
        tracker: Arc::new(RunTracker::new(config.tracker_local_path())),
    });

    let api_routes = Router::new()
        .route(
            "/api/v1/runs",
            get(handlers::list_runs).post(handlers::trigger_run),
        )
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(64 * 1024)));

    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
