//! Repository ingestion into text digests
//!
//! A [`RepositoryIngestor`] turns a repository URL into a summary, a
//! directory tree and concatenated file content. [`batch_ingest`] runs many
//! ingestions with bounded concurrency and reports every outcome, so one
//! failing repository never cancels the others.

pub mod command;

use crate::error::EpiResult;
use crate::execution::ToolResult;
use async_trait::async_trait;
use futures::future::join_all;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub use command::CommandIngestor;

pub const DEFAULT_MAX_CONCURRENT: usize = 5;

const GITHUB_PREFIX: &str = "https://github.com/";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Shell-style patterns of files to include
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Largest file, in bytes, worth reading
    #[serde(default)]
    pub max_file_size: Option<u64>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// The three text sections an ingestor produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDigest {
    pub summary: String,
    pub tree: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestDigest {
    pub summary: String,
    pub tree: String,
    pub content: String,
    pub repository_url: String,
    pub files_analyzed: u64,
    pub estimated_tokens: u64,
}

impl IngestDigest {
    pub fn from_raw(repository_url: &str, raw: RawDigest) -> Self {
        let (files_analyzed, estimated_tokens) = parse_summary_metadata(&raw.summary);
        Self {
            summary: raw.summary,
            tree: raw.tree,
            content: raw.content,
            repository_url: repository_url.to_string(),
            files_analyzed,
            estimated_tokens,
        }
    }

    /// Summary, tree and content separated by blank lines
    pub fn full_context(&self) -> String {
        format!("{}\n\n{}\n\n{}", self.summary, self.tree, self.content)
    }
}

#[async_trait]
pub trait RepositoryIngestor: Send + Sync {
    async fn ingest(&self, repository_url: &str, options: &IngestOptions) -> EpiResult<RawDigest>;
}

/// Read `Files analyzed: N` and `Estimated tokens: N` (or `1.2k`) from a
/// digest summary; unreadable values count as zero
pub fn parse_summary_metadata(summary: &str) -> (u64, u64) {
    let mut files_analyzed = 0;
    let mut estimated_tokens = 0;

    for line in summary.lines() {
        if let Some(value) = line.strip_prefix("Files analyzed:") {
            files_analyzed = value.trim().parse().unwrap_or(0);
        } else if let Some(value) = line.strip_prefix("Estimated tokens:") {
            let value = value.trim();
            estimated_tokens = if value.contains('k') {
                value
                    .replace('k', "")
                    .trim()
                    .parse::<f64>()
                    .map(|v| (v * 1000.0) as u64)
                    .unwrap_or(0)
            } else {
                value.parse().unwrap_or(0)
            };
        }
    }
    (files_analyzed, estimated_tokens)
}

/// `https://github.com/owner/repo` → `owner_repo_digest.txt`
pub fn digest_file_name(repository_url: &str) -> String {
    let stem = repository_url
        .strip_prefix(GITHUB_PREFIX)
        .unwrap_or(repository_url)
        .replace('/', "_");
    format!("{}_digest.txt", stem)
}

/// Ingest one repository, optionally writing the full context to `output_path`
pub async fn ingest_repository(
    ingestor: &dyn RepositoryIngestor,
    repository_url: &str,
    options: &IngestOptions,
    output_path: Option<&Path>,
) -> ToolResult {
    match try_ingest(ingestor, repository_url, options, output_path).await {
        Ok(result) => result,
        Err(e) => ToolResult::error(format!(
            "Failed to ingest repository '{}': {}",
            repository_url, e
        )),
    }
}

async fn try_ingest(
    ingestor: &dyn RepositoryIngestor,
    repository_url: &str,
    options: &IngestOptions,
    output_path: Option<&Path>,
) -> EpiResult<ToolResult> {
    let raw = ingestor.ingest(repository_url, options).await?;
    let digest = IngestDigest::from_raw(repository_url, raw);
    log::debug!(
        "Ingested {} ({} files, ~{} tokens)",
        repository_url,
        digest.files_analyzed,
        digest.estimated_tokens
    );
    let data = serde_json::to_value(&digest)?;

    match output_path {
        Some(path) => {
            tokio::fs::write(path, digest.full_context()).await?;
            Ok(ToolResult::success(data)
                .with_message(format!("Repository analysis saved to {}", path.display()))
                .with_artifact(path))
        }
        None => Ok(ToolResult::success(data)),
    }
}

/// Ingest `repository_urls` with at most `max_concurrent` in flight.
///
/// Repeated URLs are ingested once. Every distinct URL is accounted for in
/// the result: successes under `successful_ingests`, failures (including
/// panicked tasks) under `errors`. Any failure makes the status `partial`.
pub async fn batch_ingest(
    ingestor: Arc<dyn RepositoryIngestor>,
    repository_urls: &[String],
    options: &IngestOptions,
    output_dir: Option<&Path>,
    max_concurrent: usize,
) -> ToolResult {
    if let Some(dir) = output_dir {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            return ToolResult::error(format!(
                "Failed to create output directory {}: {}",
                dir.display(),
                e
            ));
        }
    }

    let repository_urls: Vec<&String> = repository_urls.iter().unique().collect();
    let max_concurrent = max_concurrent.max(1);
    log::info!(
        "Ingesting {} repositories with max concurrency {}",
        repository_urls.len(),
        max_concurrent
    );
    let semaphore = Arc::new(Semaphore::new(max_concurrent));
    let mut handles = Vec::with_capacity(repository_urls.len());

    for url in repository_urls.iter().copied() {
        let permits = Arc::clone(&semaphore);
        let ingestor = Arc::clone(&ingestor);
        let options = options.clone();
        let repository_url = url.clone();
        let output_path: Option<PathBuf> = output_dir.map(|dir| dir.join(digest_file_name(url)));

        let handle = tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return ToolResult::error(format!("Ingestion queue closed: {}", e)),
            };
            ingest_repository(
                ingestor.as_ref(),
                &repository_url,
                &options,
                output_path.as_deref(),
            )
            .await
        });
        handles.push((url.clone(), handle));
    }

    let (urls, handles): (Vec<String>, Vec<_>) = handles.into_iter().unzip();
    let outcomes = join_all(handles).await;

    let mut successes: Vec<Value> = Vec::new();
    let mut errors: Vec<Value> = Vec::new();
    for (url, outcome) in urls.into_iter().zip(outcomes) {
        match outcome {
            Ok(result) if result.is_success() => {
                successes.push(result.data.unwrap_or(Value::Null));
            }
            Ok(result) => {
                let error = result.message.unwrap_or_else(|| "unknown error".to_string());
                log::warn!("Ingestion of {} failed: {}", url, error);
                errors.push(json!({ "repository": url, "error": error }));
            }
            Err(e) => {
                log::warn!("Ingestion task for {} panicked: {}", url, e);
                errors.push(json!({ "repository": url, "error": e.to_string() }));
            }
        }
    }

    let message = format!(
        "Processed {} repositories: {} successful, {} errors",
        repository_urls.len(),
        successes.len(),
        errors.len()
    );
    let data = json!({
        "successful_count": successes.len(),
        "error_count": errors.len(),
        "total_repositories": repository_urls.len(),
        "successful_ingests": successes,
        "errors": errors,
    });

    if errors.is_empty() {
        ToolResult::success(data).with_message(message)
    } else {
        ToolResult::partial(data, message)
    }
}
