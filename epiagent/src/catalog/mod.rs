//! In-memory catalogue of analysis packages
//!
//! The catalogue is an explicitly constructed, shareable service. Readers take
//! a cheap snapshot (`Arc` of the whole mapping); a refresh builds a complete
//! new mapping and swaps it in under the write lock, so concurrent readers
//! observe either the old or the new catalogue, never a mix.

pub mod remote;

use crate::error::{EpiError, EpiResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

pub use remote::{GitHubRepoSource, RemoteRepo, RepoPage, RepoSource};

/// Category assigned when a record does not carry one
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Name-ordered mapping; iteration order is the canonical scoring order
pub type PackageMap = BTreeMap<String, PackageRecord>;

/// Metadata describing a single analysis package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub topics: BTreeSet<String>,
}

fn default_category() -> String {
    UNKNOWN_CATEGORY.to_string()
}

impl PackageRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: String::new(),
            category: default_category(),
            homepage: None,
            topics: BTreeSet::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    pub fn with_topics<I, T>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Merge remote metadata, preferring fields that are already set.
    ///
    /// Topics are unioned; empty topic strings are dropped.
    pub fn merge(
        &mut self,
        summary: Option<&str>,
        topics: &[String],
        homepage: Option<&str>,
    ) -> &mut Self {
        if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
            if self.summary.is_empty() {
                self.summary = summary.to_string();
            }
        }
        self.topics
            .extend(topics.iter().filter(|t| !t.is_empty()).cloned());
        if let Some(homepage) = homepage.filter(|h| !h.is_empty()) {
            if self.homepage.is_none() {
                self.homepage = Some(homepage.to_string());
            }
        }
        self
    }

    /// Persisted / API representation; empty optional fields are omitted
    pub fn to_payload(&self) -> Value {
        let mut payload = serde_json::Map::new();
        payload.insert("name".to_string(), json!(self.name));
        payload.insert("category".to_string(), json!(self.category));
        if !self.summary.is_empty() {
            payload.insert("summary".to_string(), json!(self.summary));
        }
        if let Some(homepage) = &self.homepage {
            payload.insert("homepage".to_string(), json!(homepage));
        }
        if !self.topics.is_empty() {
            payload.insert("topics".to_string(), json!(self.topics));
        }
        Value::Object(payload)
    }
}

/// One entry of the persisted snapshot: either a bare name or a full record
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotEntry {
    Name(String),
    Record(SnapshotRecord),
}

#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

impl SnapshotEntry {
    fn into_record(self) -> Option<PackageRecord> {
        match self {
            SnapshotEntry::Name(name) => {
                let name = name.trim().to_string();
                (!name.is_empty()).then(|| PackageRecord::new(name))
            }
            SnapshotEntry::Record(raw) => {
                let name = raw.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
                Some(PackageRecord {
                    name,
                    summary: raw.summary.unwrap_or_default(),
                    category: raw
                        .category
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(default_category),
                    homepage: raw.homepage.filter(|h| !h.is_empty()),
                    topics: raw.topics.into_iter().filter(|t| !t.is_empty()).collect(),
                })
            }
        }
    }
}

/// Parse a snapshot document into a name-keyed map.
///
/// Entries without a usable name are skipped with a warning. A later entry
/// with the same name replaces an earlier one.
pub fn parse_snapshot(content: &str) -> EpiResult<PackageMap> {
    let entries: Vec<SnapshotEntry> = serde_json::from_str(content)
        .map_err(|e| EpiError::Catalog(format!("Invalid catalogue snapshot: {}", e)))?;

    let mut packages = PackageMap::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match entry.into_record() {
            Some(record) => {
                packages.insert(record.name.clone(), record);
            }
            None => log::warn!("Skipping catalogue entry #{} without a name", index),
        }
    }
    Ok(packages)
}

fn snapshot_json(packages: &PackageMap) -> EpiResult<String> {
    let entries: Vec<Value> = packages.values().map(PackageRecord::to_payload).collect();
    Ok(serde_json::to_string_pretty(&entries)? + "\n")
}

fn write_snapshot(target: &Path, packages: &PackageMap) -> EpiResult<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, snapshot_json(packages)?)?;
    log::debug!("Saved catalogue snapshot to {:?}", target);
    Ok(())
}

/// Shared package catalogue
pub struct Catalog {
    packages: RwLock<Arc<PackageMap>>,
    source: Option<PathBuf>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Empty catalogue without a backing snapshot
    pub fn new() -> Self {
        Self {
            packages: RwLock::new(Arc::new(PackageMap::new())),
            source: None,
        }
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PackageRecord>,
    {
        let packages = records
            .into_iter()
            .filter(|r| !r.name.is_empty())
            .map(|r| (r.name.clone(), r))
            .collect();
        Self {
            packages: RwLock::new(Arc::new(packages)),
            source: None,
        }
    }

    pub fn from_json_str(content: &str) -> EpiResult<Self> {
        Ok(Self {
            packages: RwLock::new(Arc::new(parse_snapshot(content)?)),
            source: None,
        })
    }

    /// Load the persisted snapshot at `path`.
    ///
    /// A missing file yields an empty catalogue that remembers `path`, so a
    /// later refresh writes the snapshot there.
    pub fn load(path: impl AsRef<Path>) -> EpiResult<Self> {
        let path = path.as_ref();
        let packages = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            parse_snapshot(&content)?
        } else {
            log::debug!("Catalogue snapshot {:?} not found, starting empty", path);
            PackageMap::new()
        };
        log::info!("Loaded {} packages from {:?}", packages.len(), path);
        Ok(Self {
            packages: RwLock::new(Arc::new(packages)),
            source: Some(path.to_path_buf()),
        })
    }

    /// Snapshot path this catalogue was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Consistent view of the current mapping
    pub fn snapshot(&self) -> Arc<PackageMap> {
        let guard = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Replace the whole mapping in one step
    pub fn replace(&self, packages: PackageMap) {
        let mut guard = self.packages.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(packages);
    }

    /// Records in canonical (name ascending) order
    pub fn sorted_packages(&self) -> Vec<PackageRecord> {
        self.snapshot().values().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<PackageRecord> {
        self.snapshot().get(name).cloned()
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.snapshot().contains_key(name)
    }

    /// Sorted subset of `names` present in the catalogue
    pub fn ensure_packages<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let snapshot = self.snapshot();
        names
            .into_iter()
            .filter(|n| snapshot.contains_key(n.as_ref()))
            .map(|n| n.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn describe(&self, name: &str) -> Option<Value> {
        self.snapshot().get(name).map(PackageRecord::to_payload)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Serialised snapshot document (canonical order, pretty printed)
    pub fn to_json_string(&self) -> EpiResult<String> {
        snapshot_json(&self.snapshot())
    }

    /// Write the snapshot to `path`, or to the path it was loaded from
    pub fn save(&self, path: Option<&Path>) -> EpiResult<()> {
        let target = path
            .or(self.source.as_deref())
            .ok_or_else(|| EpiError::Catalog("No target path supplied for saving the catalogue".to_string()))?;
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        write_snapshot(target, &self.snapshot())
    }

    /// Rebuild the catalogue from the repositories of `organisations`.
    ///
    /// Archived repositories are dropped. Existing records are merged into, so
    /// curated summaries, categories and homepages survive. Repositories that
    /// vanished remotely disappear from the catalogue. The new mapping is
    /// swapped in only after every listing succeeded and, for a catalogue
    /// loaded from a snapshot, after the snapshot was rewritten.
    pub async fn refresh(
        &self,
        source: &dyn RepoSource,
        organisations: &[String],
    ) -> EpiResult<Vec<PackageRecord>> {
        let mut repos = Vec::new();
        for organisation in organisations {
            let listed = remote::list_repositories(source, organisation).await?;
            log::info!("Listed {} repositories for '{}'", listed.len(), organisation);
            repos.extend(listed);
        }

        let current = self.snapshot();
        let mut refreshed = PackageMap::new();
        for repo in repos.into_iter().filter(|r| !r.archived) {
            if repo.name.trim().is_empty() {
                continue;
            }
            let mut record = refreshed
                .remove(&repo.name)
                .or_else(|| current.get(&repo.name).cloned())
                .unwrap_or_else(|| PackageRecord::new(repo.name.clone()));
            if record.category.is_empty() {
                record.category = default_category();
            }
            record.merge(
                repo.description.as_deref(),
                &repo.topics,
                repo.html_url.as_deref(),
            );
            refreshed.insert(repo.name.clone(), record);
        }

        if let Some(path) = &self.source {
            write_snapshot(path, &refreshed)?;
        }
        self.replace(refreshed);
        Ok(self.sorted_packages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_accepts_bare_names_and_records() {
        let catalog = Catalog::from_json_str(
            r#"[
                "cfr",
                {"name": "incidence2", "summary": "Incidence curves", "category": "r_package",
                 "topics": ["incidence", "epidemic-curves", "incidence"]},
                {"summary": "nameless"}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let cfr = catalog.get("cfr").unwrap();
        assert_eq!(cfr.category, UNKNOWN_CATEGORY);
        assert!(cfr.summary.is_empty());
        assert!(cfr.topics.is_empty());

        let incidence = catalog.get("incidence2").unwrap();
        assert_eq!(incidence.topics.len(), 2);
        assert_eq!(incidence.category, "r_package");
    }

    #[test]
    fn sorted_packages_are_name_ordered() {
        let catalog = Catalog::from_records(vec![
            PackageRecord::new("zeta"),
            PackageRecord::new("alpha"),
            PackageRecord::new("mu"),
        ]);
        let names: Vec<_> = catalog.sorted_packages().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "mu", "zeta"]);
    }

    #[test]
    fn merge_prefers_existing_fields_and_unions_topics() {
        let mut record = PackageRecord::new("cfr")
            .with_summary("Curated summary")
            .with_topics(["severity"]);
        record.merge(
            Some("  Remote summary "),
            &["cfr".to_string(), "severity".to_string(), String::new()],
            Some("https://github.com/epiverse-trace/cfr"),
        );
        assert_eq!(record.summary, "Curated summary");
        assert_eq!(
            record.topics.iter().cloned().collect::<Vec<_>>(),
            vec!["cfr".to_string(), "severity".to_string()]
        );
        assert_eq!(
            record.homepage.as_deref(),
            Some("https://github.com/epiverse-trace/cfr")
        );

        let mut blank = PackageRecord::new("blank");
        blank.merge(Some("  Remote summary "), &[], None);
        assert_eq!(blank.summary, "Remote summary");
    }

    #[test]
    fn payload_omits_empty_fields() {
        let payload = PackageRecord::new("bare").to_payload();
        assert_eq!(payload, json!({"name": "bare", "category": "unknown"}));
    }

    #[test]
    fn ensure_packages_returns_sorted_known_subset() {
        let catalog = Catalog::from_records(vec![PackageRecord::new("b"), PackageRecord::new("a")]);
        assert_eq!(catalog.ensure_packages(["b", "x", "a", "b"]), vec!["a", "b"]);
        assert!(catalog.describe("x").is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.json");
        let catalog = Catalog::from_records(vec![PackageRecord::new("epichains")
            .with_summary("Branching processes")
            .with_category("r_package")
            .with_topics(["transmission-chain", "branching-processes"])]);
        catalog.save(Some(&path)).unwrap();

        let reloaded = Catalog::load(&path).unwrap();
        assert_eq!(reloaded.sorted_packages(), catalog.sorted_packages());
        assert_eq!(reloaded.source(), Some(path.as_path()));
    }

    #[test]
    fn save_without_target_is_an_error() {
        let err = Catalog::new().save(None).unwrap_err();
        assert!(matches!(err, EpiError::Catalog(_)));
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::load(dir.path().join("none.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn replace_does_not_affect_existing_snapshots() {
        let catalog = Catalog::from_records(vec![PackageRecord::new("old")]);
        let before = catalog.snapshot();
        catalog.replace(PackageMap::new());
        assert_eq!(before.len(), 1);
        assert!(catalog.is_empty());
    }
}
