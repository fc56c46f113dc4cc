//! Configuration for the epiagent runtime
//!
//! Loaded from TOML. Every section is optional; missing keys fall back to the
//! defaults below so an empty file (or no file at all) is a valid setup.

use crate::error::{EpiError, EpiResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the catalogue snapshot path
pub const CATALOG_PATH_ENV: &str = "EPIAGENT_CATALOG";
/// Environment variable supplying a GitHub token for catalogue refresh
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EpiagentConfig {
    pub catalog: CatalogConfig,
    pub router: RouterConfig,
    pub shortlist: ShortlistConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Persisted JSON snapshot of the catalogue
    pub path: PathBuf,
    /// GitHub organisations listed on refresh
    pub organisations: Vec<String>,
    pub per_page: u32,
    pub api_base: String,
    pub user_agent: String,
    pub token: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("docs/epiverse_packages.json"),
            organisations: vec!["epiverse-trace".to_string()],
            per_page: 100,
            api_base: "https://api.github.com".to_string(),
            user_agent: "epiagent-registry".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    pub top_k: usize,
    pub min_score: f64,
    pub category: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 1.0,
            category: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShortlistConfig {
    pub top_k: usize,
}

impl Default for ShortlistConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    pub max_concurrent: usize,
    pub output_dir: Option<PathBuf>,
    /// External digest tool invoked by the command ingestor
    pub command: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_concurrent: crate::ingest::DEFAULT_MAX_CONCURRENT,
            output_dir: None,
            command: "gitingest".to_string(),
        }
    }
}

impl EpiagentConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> EpiResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file. A missing file yields the defaults.
    pub fn load(path: &Path) -> EpiResult<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            EpiError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_toml_str(&content).map_err(|e| {
            EpiError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Apply environment overrides (`EPIAGENT_CATALOG`, `GITHUB_TOKEN`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(path) = std::env::var(CATALOG_PATH_ENV) {
            if !path.trim().is_empty() {
                self.catalog.path = PathBuf::from(path);
            }
        }
        if self.catalog.token.is_none() {
            self.catalog.token = std::env::var(GITHUB_TOKEN_ENV)
                .ok()
                .filter(|t| !t.trim().is_empty());
        }
        self
    }

    /// Check values that would make the runtime misbehave
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.catalog.organisations.is_empty() {
            warnings.push("No organisations configured; refresh will empty the catalogue".to_string());
        }
        if self.catalog.per_page == 0 {
            warnings.push("catalog.per_page is 0".to_string());
        }
        if self.router.top_k == 0 {
            warnings.push("router.top_k is 0; find will never return matches".to_string());
        }
        if self.ingest.max_concurrent == 0 {
            warnings.push("ingest.max_concurrent is 0; treated as 1".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EpiagentConfig::from_toml_str("").unwrap();
        assert_eq!(config, EpiagentConfig::default());
        assert_eq!(config.router.top_k, 5);
        assert_eq!(config.ingest.max_concurrent, 5);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = EpiagentConfig::from_toml_str(
            r#"
            [catalog]
            organisations = ["epiverse-trace", "epiforecasts"]

            [router]
            min_score = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.catalog.organisations.len(), 2);
        assert_eq!(config.catalog.per_page, 100);
        assert_eq!(config.router.min_score, 2.5);
        assert_eq!(config.router.top_k, 5);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = EpiagentConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EpiagentConfig::default());
    }

    #[test]
    fn malformed_file_reports_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epiagent.toml");
        std::fs::write(&path, "[router\ntop_k = ").unwrap();
        let err = EpiagentConfig::load(&path).unwrap_err();
        assert!(matches!(err, EpiError::Config(_)));
    }
}
