use async_trait::async_trait;
use epiagent::error::{EpiError, EpiResult};
use epiagent::execution::ToolStatus;
use epiagent::ingest::{batch_ingest, IngestOptions, RawDigest, RepositoryIngestor};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records how many ingestions overlap; URLs ending in `broken` fail
#[derive(Default)]
struct SlowIngestor {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl RepositoryIngestor for SlowIngestor {
    async fn ingest(&self, repository_url: &str, _options: &IngestOptions) -> EpiResult<RawDigest> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if repository_url.ends_with("broken") {
            return Err(EpiError::Ingest("clone failed".to_string()));
        }
        Ok(RawDigest {
            summary: format!("Repository: {}\nFiles analyzed: 3", repository_url),
            tree: "Directory structure:".to_string(),
            content: "FILE: R/main.R".to_string(),
        })
    }
}

fn urls() -> Vec<String> {
    (0..10)
        .map(|i| {
            if i == 3 || i == 7 {
                format!("https://github.com/epiverse-trace/repo{}-broken", i)
            } else {
                format!("https://github.com/epiverse-trace/repo{}", i)
            }
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_respects_concurrency_and_accounts_for_every_url() {
    let ingestor = Arc::new(SlowIngestor::default());
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("digests");

    let result = batch_ingest(
        ingestor.clone(),
        &urls(),
        &IngestOptions::default(),
        Some(&output_dir),
        3,
    )
    .await;

    assert!(ingestor.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(result.status, ToolStatus::Partial);
    assert_eq!(
        result.message.as_deref(),
        Some("Processed 10 repositories: 8 successful, 2 errors")
    );

    let data = result.data.unwrap();
    assert_eq!(data["successful_count"], 8);
    assert_eq!(data["error_count"], 2);
    assert_eq!(data["total_repositories"], 10);
    assert_eq!(data["successful_ingests"][0]["files_analyzed"], 3);
    let failed: Vec<&str> = data["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["repository"].as_str())
        .collect();
    assert_eq!(
        failed,
        vec![
            "https://github.com/epiverse-trace/repo3-broken",
            "https://github.com/epiverse-trace/repo7-broken"
        ]
    );

    let written = std::fs::read_dir(&output_dir).unwrap().count();
    assert_eq!(written, 8);
    assert!(output_dir.join("epiverse-trace_repo0_digest.txt").exists());
}

#[tokio::test]
async fn clean_batch_is_a_success() {
    let ingestor = Arc::new(SlowIngestor::default());
    let urls = vec!["https://github.com/epiverse-trace/cfr".to_string()];

    let result = batch_ingest(ingestor, &urls, &IngestOptions::default(), None, 0).await;

    assert_eq!(result.status, ToolStatus::Success);
    assert!(result.artifact_path.is_none());
    assert_eq!(result.data.unwrap()["error_count"], 0);
}

#[tokio::test]
async fn repeated_urls_are_ingested_once() {
    let ingestor = Arc::new(SlowIngestor::default());
    let dir = tempfile::tempdir().unwrap();
    let cfr = "https://github.com/epiverse-trace/cfr".to_string();
    let urls = vec![cfr.clone(), cfr.clone(), "https://github.com/epiverse-trace/epichains".to_string(), cfr];

    let result = batch_ingest(
        ingestor.clone(),
        &urls,
        &IngestOptions::default(),
        Some(dir.path()),
        4,
    )
    .await;

    assert_eq!(ingestor.calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.status, ToolStatus::Success);
    let data = result.data.unwrap();
    assert_eq!(data["total_repositories"], 2);
    assert_eq!(data["successful_count"], 2);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}
