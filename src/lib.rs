//! Genealogy-Harvest: a resumable academic-genealogy crawler
//!
//! This crate crawls a directory of numerically indexed person records,
//! follows advisor/descendant references to discover the full ID space, and
//! persists a snapshot on failure so multi-hour crawls can be resumed. A second
//! phase enriches the most popular records with ranking data from an external
//! knowledge base.

pub mod config;
pub mod crawler;
pub mod enrich;
pub mod job;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Genealogy-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to extract record {id}: {message}")]
    Extraction { id: state::NodeId, message: String },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Registry error: {0}")]
    Registry(#[from] state::RegistryError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch task failed: {0}")]
    Task(String),

    #[error("Interrupted")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use state::{Degree, NodeId, Record, Registry, Slot};
