use async_trait::async_trait;
use epiagent::catalog::{Catalog, PackageRecord, RemoteRepo, RepoPage, RepoSource};
use epiagent::error::{EpiError, EpiResult};
use pretty_assertions::assert_eq;
use std::collections::HashMap;

/// Listing served from memory, keyed by page URL
struct MemorySource {
    pages: HashMap<String, RepoPage>,
}

impl MemorySource {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    fn page(mut self, url: &str, items: Vec<RemoteRepo>, next_url: Option<&str>) -> Self {
        self.pages.insert(
            url.to_string(),
            RepoPage {
                items,
                next_url: next_url.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl RepoSource for MemorySource {
    fn first_page_url(&self, organisation: &str) -> String {
        format!("mem://{}/1", organisation)
    }

    async fn fetch_page(&self, url: &str) -> EpiResult<RepoPage> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| EpiError::Http(format!("no page at {}", url)))
    }
}

fn repo(name: &str, description: &str, topics: &[&str]) -> RemoteRepo {
    RemoteRepo {
        name: name.to_string(),
        description: Some(description.to_string()),
        topics: topics.iter().map(|t| t.to_string()).collect(),
        html_url: Some(format!("https://github.com/epiverse-trace/{}", name)),
        archived: false,
    }
}

fn organisations() -> Vec<String> {
    vec!["epiverse-trace".to_string(), "reconverse".to_string()]
}

fn source() -> MemorySource {
    let mut archived = repo("old-tool", "Superseded", &[]);
    archived.archived = true;

    MemorySource::new()
        .page(
            "mem://epiverse-trace/1",
            vec![
                repo("cfr", "Remote cfr description", &["severity", "outbreaks"]),
                archived,
            ],
            Some("mem://epiverse-trace/2"),
        )
        .page(
            "mem://epiverse-trace/2",
            vec![repo("epichains", "Transmission chains", &["branching-process"])],
            None,
        )
        .page(
            "mem://reconverse/1",
            vec![repo("incidence2", "", &["incidence"])],
            None,
        )
}

fn curated() -> Vec<PackageRecord> {
    vec![
        PackageRecord::new("cfr")
            .with_summary("Curated severity estimates")
            .with_category("r_package")
            .with_topics(["case-fatality-rate"]),
        PackageRecord::new("vanished").with_summary("No longer listed"),
    ]
}

#[tokio::test]
async fn refresh_follows_pages_across_organisations() {
    let catalog = Catalog::from_records(curated());
    let packages = catalog.refresh(&source(), &organisations()).await.unwrap();

    let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["cfr", "epichains", "incidence2"]);
    assert!(!catalog.has_package("old-tool"));
    assert!(!catalog.has_package("vanished"));
}

#[tokio::test]
async fn refresh_keeps_curated_fields() {
    let catalog = Catalog::from_records(curated());
    catalog.refresh(&source(), &organisations()).await.unwrap();

    let cfr = catalog.get("cfr").unwrap();
    assert_eq!(cfr.summary, "Curated severity estimates");
    assert_eq!(cfr.category, "r_package");
    let topics: Vec<&str> = cfr.topics.iter().map(String::as_str).collect();
    assert_eq!(topics, vec!["case-fatality-rate", "outbreaks", "severity"]);
    assert_eq!(
        cfr.homepage.as_deref(),
        Some("https://github.com/epiverse-trace/cfr")
    );

    let incidence = catalog.get("incidence2").unwrap();
    assert!(incidence.summary.is_empty());
    assert_eq!(incidence.category, "unknown");
}

#[tokio::test]
async fn failed_listing_leaves_catalogue_untouched() {
    let catalog = Catalog::from_records(curated());
    let broken = MemorySource::new().page(
        "mem://epiverse-trace/1",
        vec![repo("cfr", "", &[])],
        Some("mem://epiverse-trace/missing"),
    );

    let err = catalog
        .refresh(&broken, &organisations())
        .await
        .unwrap_err();
    assert!(matches!(err, EpiError::Http(_)));
    assert!(catalog.has_package("vanished"));
    assert_eq!(catalog.len(), 2);
}

#[tokio::test]
async fn refreshed_snapshot_is_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packages.json");
    std::fs::write(&path, r#"["cfr", "vanished"]"#).unwrap();

    let catalog = Catalog::load(&path).unwrap();
    catalog.refresh(&source(), &organisations()).await.unwrap();

    let reloaded = Catalog::load(&path).unwrap();
    assert_eq!(reloaded.sorted_packages(), catalog.sorted_packages());
    assert_eq!(
        reloaded.get("cfr").unwrap().summary,
        "Remote cfr description"
    );
}

#[tokio::test]
async fn unwritable_snapshot_keeps_previous_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("packages.json");
    std::fs::write(&path, r#"["cfr", "vanished"]"#).unwrap();
    let catalog = Catalog::load(&path).unwrap();

    // A directory in place of the snapshot makes the write fail
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let err = catalog
        .refresh(&source(), &organisations())
        .await
        .unwrap_err();
    assert!(matches!(err, EpiError::Io(_)));
    assert!(catalog.has_package("vanished"));
    assert!(!catalog.has_package("epichains"));
}
