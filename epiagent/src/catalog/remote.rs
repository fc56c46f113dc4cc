//! Remote repository listings used to refresh the catalogue
//!
//! Listings are paginated: each page may carry the URL of the next one
//! (GitHub's `Link: <...>; rel="next"` header). Paging is driven by
//! [`list_repositories`] so any [`RepoSource`] gets it for free.

use crate::config::CatalogConfig;
use crate::error::{EpiError, EpiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Repository-like object returned by a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteRepo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct RepoPage {
    pub items: Vec<RemoteRepo>,
    pub next_url: Option<String>,
}

#[async_trait]
pub trait RepoSource: Send + Sync {
    /// URL of the first listing page for `organisation`
    fn first_page_url(&self, organisation: &str) -> String;

    async fn fetch_page(&self, url: &str) -> EpiResult<RepoPage>;
}

/// Safety valve against sources that keep returning a `next` link
const MAX_PAGES: usize = 1000;

/// Follow `next` links from the first page until the listing is exhausted
pub async fn list_repositories(
    source: &dyn RepoSource,
    organisation: &str,
) -> EpiResult<Vec<RemoteRepo>> {
    let mut url = Some(source.first_page_url(organisation));
    let mut repos = Vec::new();
    let mut pages = 0;

    while let Some(current) = url.take() {
        pages += 1;
        if pages > MAX_PAGES {
            return Err(EpiError::Http(format!(
                "Listing for '{}' exceeded {} pages",
                organisation, MAX_PAGES
            )));
        }
        log::debug!("Fetching repository page {}", current);
        let page = source.fetch_page(&current).await?;
        repos.extend(page.items);
        url = page.next_url;
    }
    Ok(repos)
}

/// Extract the `rel="next"` target from an HTTP `Link` header
pub fn parse_next_link(header: &str) -> Option<String> {
    header
        .split(',')
        .find(|part| part.contains("rel=\"next\""))
        .and_then(|part| {
            let start = part.find('<')?;
            let end = part.find('>')?;
            (end > start + 1).then(|| part[start + 1..end].trim().to_string())
        })
}

/// GitHub organisation listing over the REST API
pub struct GitHubRepoSource {
    client: reqwest::Client,
    api_base: String,
    per_page: u32,
    user_agent: String,
    token: Option<String>,
}

impl GitHubRepoSource {
    pub fn new(api_base: impl Into<String>, per_page: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            per_page: per_page.max(1),
            user_agent: "epiagent-registry".to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        let mut source = Self::new(config.api_base.clone(), config.per_page);
        source.user_agent = config.user_agent.clone();
        source.token = config.token.clone();
        source
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl RepoSource for GitHubRepoSource {
    fn first_page_url(&self, organisation: &str) -> String {
        format!(
            "{}/orgs/{}/repos?per_page={}",
            self.api_base, organisation, self.per_page
        )
    }

    async fn fetch_page(&self, url: &str) -> EpiResult<RepoPage> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", &self.user_agent);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| EpiError::Http(format!("Failed to list repositories: {}", e)))?;

        if !response.status().is_success() {
            return Err(EpiError::Http(format!(
                "GitHub API error {} for {}",
                response.status(),
                url
            )));
        }

        let next_url = response
            .headers()
            .get("Link")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);

        let items: Vec<RemoteRepo> = response
            .json()
            .await
            .map_err(|e| EpiError::Http(format!("Failed to parse repository listing: {}", e)))?;

        Ok(RepoPage { items, next_url })
    }
}
