//! Crate-wide error type.
//!
//! Catalogue, configuration and ingestion plumbing return `EpiResult`. The
//! execution adapter never surfaces these directly: its public contract
//! converts every failure into a [`crate::execution::ToolResult`].

use thiserror::Error;

pub type EpiResult<T> = Result<T, EpiError>;

#[derive(Debug, Error)]
pub enum EpiError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serde(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Catalogue error: {0}")]
    Catalog(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Ingestion failed: {0}")]
    Ingest(String),
}

impl From<std::io::Error> for EpiError {
    fn from(e: std::io::Error) -> Self {
        EpiError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EpiError {
    fn from(e: serde_json::Error) -> Self {
        EpiError::Serde(e.to_string())
    }
}

impl From<toml::de::Error> for EpiError {
    fn from(e: toml::de::Error) -> Self {
        EpiError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for EpiError {
    fn from(e: reqwest::Error) -> Self {
        EpiError::Http(e.to_string())
    }
}
