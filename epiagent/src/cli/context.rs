//! CLI context - shared state and services for all commands

use crate::agent::EpiAgent;
use crate::catalog::{Catalog, GitHubRepoSource};
use crate::config::EpiagentConfig;
use crate::error::EpiResult;
use crate::execution::ExecutionAdapter;
use crate::router::RouterOptions;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared context for CLI commands
pub struct CliContext {
    /// Path to the configuration file
    pub config_path: PathBuf,
    pub config: EpiagentConfig,
    pub output_format: super::OutputFormat,
    /// Suppress status messages
    pub quiet: bool,
    pub verbose: bool,
    catalog: Option<Arc<Catalog>>,
    adapter: Option<Arc<ExecutionAdapter>>,
}

impl CliContext {
    /// Create a context from an explicit configuration path
    pub fn new(config_path: PathBuf) -> EpiResult<Self> {
        let config = EpiagentConfig::load(&config_path)?.with_env_overrides();
        Ok(Self::from_config(config_path, config))
    }

    /// Use the first configuration file found in the usual places, else defaults
    pub fn with_defaults() -> EpiResult<Self> {
        let default_paths = [
            PathBuf::from("epiagent.toml"),
            PathBuf::from("config/epiagent.toml"),
        ];

        for path in &default_paths {
            if path.exists() {
                return Self::new(path.clone());
            }
        }

        Ok(Self::from_config(
            PathBuf::from("epiagent.toml"),
            EpiagentConfig::default().with_env_overrides(),
        ))
    }

    pub fn from_config(config_path: PathBuf, config: EpiagentConfig) -> Self {
        Self {
            config_path,
            config,
            output_format: super::OutputFormat::Table,
            quiet: false,
            verbose: false,
            catalog: None,
            adapter: None,
        }
    }

    /// Catalogue loaded from the configured snapshot on first use
    pub fn catalog(&mut self) -> EpiResult<Arc<Catalog>> {
        if let Some(ref catalog) = self.catalog {
            return Ok(Arc::clone(catalog));
        }

        let catalog = Arc::new(Catalog::load(&self.config.catalog.path)?);
        self.debug(&format!(
            "Loaded {} packages from {:?}",
            catalog.len(),
            self.config.catalog.path
        ));
        self.catalog = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    pub fn router_options(&self) -> RouterOptions {
        let router = &self.config.router;
        let options = RouterOptions::default()
            .with_top_k(router.top_k)
            .with_min_score(router.min_score);
        match &router.category {
            Some(category) => options.with_category(category.clone()),
            None => options,
        }
    }

    /// Execution adapter over the catalogue, refreshing from GitHub
    pub fn adapter(&mut self) -> EpiResult<Arc<ExecutionAdapter>> {
        if let Some(ref adapter) = self.adapter {
            return Ok(Arc::clone(adapter));
        }

        let catalog = self.catalog()?;
        let source = Arc::new(GitHubRepoSource::from_config(&self.config.catalog));
        let adapter = Arc::new(
            ExecutionAdapter::new(catalog)
                .with_router_options(self.router_options())
                .with_repo_source(source, self.config.catalog.organisations.clone()),
        );
        self.adapter = Some(Arc::clone(&adapter));
        Ok(adapter)
    }

    pub fn agent(&mut self) -> EpiResult<EpiAgent> {
        let adapter = self.adapter()?;
        Ok(EpiAgent::new(adapter).with_shortlist_size(self.config.shortlist.top_k))
    }

    /// Print status message (respects quiet mode)
    pub fn status(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    /// Print verbose message (only in verbose mode)
    pub fn debug(&self, message: &str) {
        if self.verbose {
            eprintln!("[DEBUG] {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_options_follow_config() {
        let mut config = EpiagentConfig::default();
        config.router.top_k = 2;
        config.router.category = Some("r_package".to_string());
        let ctx = CliContext::from_config(PathBuf::from("epiagent.toml"), config);

        let options = ctx.router_options();
        assert_eq!(options.top_k, 2);
        assert_eq!(options.category_filter.as_deref(), Some("r_package"));
    }

    #[test]
    fn catalog_is_loaded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.json");
        std::fs::write(&path, r#"["cfr", "epichains"]"#).unwrap();

        let mut config = EpiagentConfig::default();
        config.catalog.path = path;
        let mut ctx = CliContext::from_config(dir.path().join("epiagent.toml"), config);

        let first = ctx.catalog().unwrap();
        let second = ctx.catalog().unwrap();
        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
