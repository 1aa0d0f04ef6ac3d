use serde::Deserialize;
use std::path::PathBuf;

/// Runtime configuration, built once in `main` and shared by reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub dodge_api_key: String,
    pub dodge_api_base_url: String,
    pub days_back: i64,
    pub page_size: usize,
    pub mapping_file: PathBuf,
    pub output_dir: PathBuf,
    pub blob_sas_url: String,
    pub blob_prefix: String,
    pub sharepoint_site_id: String,
    pub sharepoint_drive_id: String,
    pub sharepoint_processed_folder: String,
    pub tracker_remote_path: String,
    pub graph_base_url: String,
    pub azure_authority_url: String,
    pub azure_tenant_id: String,
    pub azure_client_id: String,
    pub azure_client_secret: String,
    pub sync_cron: String,
    pub run_on_startup: bool,
    pub port: u16,
}

fn required(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(value)
}

fn required_url(name: &str) -> anyhow::Result<String> {
    let value = required(name)?;
    if !value.starts_with("http://") && !value.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(value)
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_url(name: &str, default: &str) -> anyhow::Result<String> {
    let value = optional(name, default);
    if !value.starts_with("http://") && !value.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Longest search window accepted, in days.
const MAX_DAYS_BACK: i64 = 3650;

fn parse_days_back(raw: &str) -> anyhow::Result<i64> {
    match raw.trim().parse::<i64>() {
        Ok(days) if (1..=MAX_DAYS_BACK).contains(&days) => Ok(days),
        _ => anyhow::bail!("DODGE_DAYS_BACK must be a number between 1 and {}", MAX_DAYS_BACK),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            dodge_api_key: required("DODGE_API_KEY")?,
            dodge_api_base_url: optional_url(
                "DODGE_API_BASE_URL",
                "https://www.construction.com/api/1.0/int",
            )?,
            days_back: parse_days_back(&optional("DODGE_DAYS_BACK", "2"))?,
            page_size: optional("DODGE_PAGE_SIZE", "100")
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or_else(|| anyhow::anyhow!("DODGE_PAGE_SIZE must be a positive number"))?,
            mapping_file: PathBuf::from(optional("MAPPING_FILE", "dodgeMapping.csv")),
            output_dir: PathBuf::from(optional("OUTPUT_DIR", "/tmp/processed_csv_files")),
            blob_sas_url: required_url("BLOB_SAS_URL").and_then(|url| {
                if !url.contains('?') {
                    anyhow::bail!("BLOB_SAS_URL must carry a SAS query string");
                }
                Ok(url)
            })?,
            blob_prefix: optional("BLOB_PREFIX", "Leads/Production")
                .trim_matches('/')
                .to_string(),
            sharepoint_site_id: required("SHAREPOINT_SITE_ID")?,
            sharepoint_drive_id: required("SHAREPOINT_DRIVE_ID")?,
            sharepoint_processed_folder: optional("SHAREPOINT_PROCESSED_FOLDER", "Processed")
                .trim_matches('/')
                .to_string(),
            tracker_remote_path: optional("TRACKER_REMOTE_PATH", "processed_files.json")
                .trim_matches('/')
                .to_string(),
            graph_base_url: optional_url("GRAPH_BASE_URL", "https://graph.microsoft.com")?,
            azure_authority_url: optional_url(
                "AZURE_AUTHORITY_URL",
                "https://login.microsoftonline.com",
            )?,
            azure_tenant_id: required("AZURE_TENANT_ID")?,
            azure_client_id: required("AZURE_CLIENT_ID")?,
            azure_client_secret: required("AZURE_CLIENT_SECRET")?,
            sync_cron: optional("SYNC_CRON", "0 0 11 */2 * *"),
            run_on_startup: matches!(
                optional("RUN_ON_STARTUP", "false").as_str(),
                "1" | "true" | "TRUE" | "True"
            ),
            port: optional("PORT", "3000")
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Dodge API Base URL: {}", config.dodge_api_base_url);
        tracing::debug!(
            "Search window: {} days, page size {}",
            config.days_back,
            config.page_size
        );
        tracing::debug!("Mapping file: {}", config.mapping_file.display());
        tracing::debug!("Output dir: {}", config.output_dir.display());
        tracing::debug!("Blob prefix: {}", config.blob_prefix);
        tracing::debug!("Schedule: {}", config.sync_cron);

        Ok(config)
    }

    /// Path of the local working copy of the tracker file.
    pub fn tracker_local_path(&self) -> PathBuf {
        self.output_dir.join("processed_files.json")
    }
}
