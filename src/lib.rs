//! Dodge Construction Lead Sync Library
//!
//! Pulls recently published construction projects from the Dodge search API,
//! flattens them into CRM lead rows, writes a CSV artifact and delivers it to
//! blob storage and SharePoint. Processed lead ids and a run log are kept in a
//! JSON tracker file so each lead is exported once.
//!
//! # Modules
//!
//! - `batch`: Batch transformation and CSV artifact writing.
//! - `blob_client`: Azure blob storage (SAS URL) client.
//! - `config`: Configuration management.
//! - `correlation`: Project type to CRM segment mapping table.
//! - `country`: Country name/code normalization.
//! - `errors`: Error handling types.
//! - `extract`: Tolerant value extraction and field formatting.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `orchestrator`: One end-to-end sync run.
//! - `scheduler`: Cron-driven run scheduling.
//! - `search_client`: Dodge project search client.
//! - `sharepoint_client`: SharePoint (Microsoft Graph) client.
//! - `storage`: Collaborator traits used by the orchestrator.
//! - `tracking`: Persistent run tracker.
//! - `transform`: Raw project record to lead row.

pub mod batch;
pub mod blob_client;
pub mod config;
pub mod correlation;
pub mod country;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod search_client;
pub mod sharepoint_client;
pub mod storage;
pub mod tracking;
pub mod transform;
