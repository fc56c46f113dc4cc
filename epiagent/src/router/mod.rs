//! Package relevance router
//!
//! Maps a free-text analysis query to a ranked list of catalogue packages
//! using additive, explainable lexical signals. Every point of a score is
//! traceable through the `matched_keywords` provenance tags:
//!
//! | signal                                   | weight | provenance        |
//! |------------------------------------------|--------|-------------------|
//! | query/name containment (either way)      | 3.0    | `name:<package>`  |
//! | query token (len > 2) in summary         | 2.0    | `summary:<token>` |
//! | topic in task-expanded keyword set       | 1.5    | `topic:<topic>`   |
//! | query token (len > 2) inside a topic     | 1.0    | `topic:<topic>`   |
//! | task-expanded keyword inside summary     | 0.5    | `keyword:<kw>`    |
//!
//! The two topic signals may both fire for one topic; only the provenance
//! tag is deduplicated.

pub mod task_keywords;

use crate::catalog::{Catalog, PackageRecord};
use serde::Serialize;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub use task_keywords::{TaskKeywords, TASK_KEYWORDS};

/// Non-analytical categories that never surface as tools for a task
pub const EXCLUDED_CATEGORIES: &[&str] = &["infrastructure", "documentation", "repository"];

const NAME_WEIGHT: f64 = 3.0;
const SUMMARY_TERM_WEIGHT: f64 = 2.0;
const TOPIC_KEYWORD_WEIGHT: f64 = 1.5;
const TOPIC_TERM_WEIGHT: f64 = 1.0;
const SUMMARY_KEYWORD_WEIGHT: f64 = 0.5;

/// Query tokens shorter than this are ignored by the term signals
const MIN_TERM_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct RouterOptions {
    pub top_k: usize,
    pub min_score: f64,
    pub category_filter: Option<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 1.0,
            category_filter: None,
        }
    }
}

impl RouterOptions {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category_filter = Some(category.into());
        self
    }
}

/// A package judged relevant to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageMatch {
    pub package: PackageRecord,
    pub score: f64,
    pub matched_keywords: Vec<String>,
}

impl PackageMatch {
    /// Flat payload handed to callers of `find_tools`
    pub fn to_payload(&self) -> Value {
        json!({
            "name": self.package.name,
            "summary": self.package.summary,
            "score": (self.score * 100.0).round() / 100.0,
            "matched_keywords": self.matched_keywords,
            "homepage": self.package.homepage,
            "topics": self.package.topics,
        })
    }
}

/// Lower-case and drop everything that is not ASCII alphanumeric or whitespace
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Relevance scorer over a fixed task keyword table
#[derive(Debug, Clone, Copy)]
pub struct Router {
    task_keywords: TaskKeywords,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            task_keywords: TASK_KEYWORDS,
        }
    }

    pub fn with_task_keywords(task_keywords: TaskKeywords) -> Self {
        Self { task_keywords }
    }

    /// Union of the keyword lists of every task phrase sharing a token with the query
    pub fn relevant_keywords(&self, query_tokens: &BTreeSet<&str>) -> BTreeSet<&'static str> {
        let mut relevant = BTreeSet::new();
        for (task, keywords) in self.task_keywords.iter() {
            let task_normalized = normalize(task);
            if task_normalized
                .split_whitespace()
                .any(|t| query_tokens.contains(t))
            {
                relevant.extend(keywords.iter().copied());
            }
        }
        relevant
    }

    /// Score a single package against a query, returning the score and its provenance
    pub fn score(&self, query: &str, package: &PackageRecord) -> (f64, Vec<String>) {
        let query_normalized = normalize(query);
        let query_terms: Vec<&str> = query_normalized.split_whitespace().collect();
        let query_token_set: BTreeSet<&str> = query_terms.iter().copied().collect();
        let relevant = self.relevant_keywords(&query_token_set);
        self.score_with(&query_normalized, &query_terms, &relevant, package)
    }

    fn score_with(
        &self,
        query_normalized: &str,
        query_terms: &[&str],
        relevant: &BTreeSet<&'static str>,
        package: &PackageRecord,
    ) -> (f64, Vec<String>) {
        let mut score = 0.0;
        let mut matched: Vec<String> = Vec::new();

        let name_normalized = normalize(&package.name);
        let summary_normalized = normalize(&package.summary);

        // An empty query is contained in every name.
        if query_normalized.contains(&name_normalized) || name_normalized.contains(query_normalized)
        {
            score += NAME_WEIGHT;
            matched.push(format!("name:{}", package.name));
        }

        for term in query_terms.iter().filter(|t| t.len() >= MIN_TERM_LEN) {
            if summary_normalized.contains(term) {
                score += SUMMARY_TERM_WEIGHT;
                matched.push(format!("summary:{}", term));
            }
        }

        for topic in &package.topics {
            let topic_normalized = normalize(topic);
            let tag = format!("topic:{}", topic);
            if relevant.contains(topic_normalized.as_str()) || relevant.contains(topic.as_str()) {
                score += TOPIC_KEYWORD_WEIGHT;
                if !matched.contains(&tag) {
                    matched.push(tag.clone());
                }
            }
            for term in query_terms.iter().filter(|t| t.len() >= MIN_TERM_LEN) {
                if topic_normalized.contains(term) {
                    score += TOPIC_TERM_WEIGHT;
                    if !matched.contains(&tag) {
                        matched.push(tag.clone());
                    }
                }
            }
        }

        for keyword in relevant {
            if summary_normalized.contains(keyword) {
                score += SUMMARY_KEYWORD_WEIGHT;
                matched.push(format!("keyword:{}", keyword));
            }
        }

        (score, matched)
    }

    /// Rank catalogue packages by relevance to `query`.
    ///
    /// Results have `score >= min_score`, are sorted by descending score with
    /// ties broken by package name, and hold at most `top_k` entries.
    pub fn find_relevant_packages(
        &self,
        query: &str,
        catalog: &Catalog,
        options: &RouterOptions,
    ) -> Vec<PackageMatch> {
        let query_normalized = normalize(query);
        let query_terms: Vec<&str> = query_normalized.split_whitespace().collect();
        let query_token_set: BTreeSet<&str> = query_terms.iter().copied().collect();
        let relevant = self.relevant_keywords(&query_token_set);

        let snapshot = catalog.snapshot();
        let mut matches: Vec<PackageMatch> = Vec::new();

        for package in snapshot.values() {
            if let Some(category) = &options.category_filter {
                if &package.category != category {
                    continue;
                }
            }
            if EXCLUDED_CATEGORIES.contains(&package.category.as_str()) {
                continue;
            }

            let (score, matched_keywords) =
                self.score_with(&query_normalized, &query_terms, &relevant, package);
            if score >= options.min_score {
                matches.push(PackageMatch {
                    package: package.clone(),
                    score,
                    matched_keywords,
                });
            }
        }

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.package.name.cmp(&b.package.name))
        });
        matches.truncate(options.top_k);

        log::debug!(
            "Router matched {} package(s) for query '{}'",
            matches.len(),
            query
        );
        matches
    }
}

/// Rank packages with the default task keyword table
pub fn find_relevant_packages(
    query: &str,
    catalog: &Catalog,
    options: &RouterOptions,
) -> Vec<PackageMatch> {
    Router::new().find_relevant_packages(query, catalog, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_catalog() -> Catalog {
        Catalog::from_records(vec![
            PackageRecord::new("cfr")
                .with_summary("Estimate disease severity and under-reporting")
                .with_category("r_package")
                .with_topics(["case-fatality-rate", "severity"]),
            PackageRecord::new("incidence2")
                .with_summary("Compute, handle and plot incidence of dated events")
                .with_category("r_package")
                .with_topics(["incidence", "epidemic-curves", "time-series"]),
            PackageRecord::new("epiparameter")
                .with_summary("Library of epidemiological parameters")
                .with_category("r_package")
                .with_topics(["probability-distribution", "delay"]),
            PackageRecord::new("severity-docs")
                .with_summary("Documentation about severity estimation")
                .with_category("documentation")
                .with_topics(["severity"]),
            PackageRecord::new("packagetemplate")
                .with_summary("Template for incidence packages")
                .with_category("infrastructure"),
        ])
    }

    #[test]
    fn normalize_strips_punctuation_but_keeps_spaces() {
        assert_eq!(normalize("Case-Fatality Rate (CFR)!"), "casefatality rate cfr");
        assert_eq!(normalize("  R0 "), "  r0 ");
    }

    #[test]
    fn excluded_categories_never_surface() {
        let catalog = sample_catalog();
        let options = RouterOptions::default().with_top_k(10).with_min_score(0.0);
        for query in ["severity documentation", "incidence template", "packagetemplate"] {
            let matches = find_relevant_packages(query, &catalog, &options);
            assert!(matches
                .iter()
                .all(|m| !EXCLUDED_CATEGORIES.contains(&m.package.category.as_str())));
        }
    }

    #[test]
    fn name_match_contributes_exactly_three() {
        let catalog = Catalog::from_records(vec![PackageRecord::new("cfr").with_category("r_package")]);
        let matches = find_relevant_packages("cfr", &catalog, &RouterOptions::default());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 3.0);
        assert_eq!(matches[0].matched_keywords, vec!["name:cfr".to_string()]);
    }

    #[test]
    fn topic_signals_stack_but_provenance_is_deduplicated() {
        let package = PackageRecord::new("zzz")
            .with_category("r_package")
            .with_topics(["cfr"]);
        let (score, matched) = Router::new().score("cfr", &package);
        // 1.5 for the task-keyword topic, 1.0 for the query token inside the topic
        assert_eq!(score, 2.5);
        assert_eq!(matched, vec!["topic:cfr".to_string()]);
    }

    #[test]
    fn summary_terms_and_keywords_are_counted() {
        let package = PackageRecord::new("incidence2")
            .with_summary("Compute incidence curves")
            .with_topics(["incidence"]);
        let (score, matched) = Router::new().score("incidence", &package);
        // name 3.0 + summary term 2.0 + topic keyword 1.5 + topic term 1.0
        // + keyword "incidence" in summary 0.5
        assert_eq!(score, 8.0);
        assert_eq!(
            matched,
            vec![
                "name:incidence2".to_string(),
                "summary:incidence".to_string(),
                "topic:incidence".to_string(),
                "keyword:incidence".to_string(),
            ]
        );
    }

    #[test]
    fn results_sorted_and_truncated() {
        let catalog = sample_catalog();
        let options = RouterOptions::default().with_top_k(2).with_min_score(0.0);
        let matches = find_relevant_packages("estimate severity and incidence", &catalog, &options);
        assert!(matches.len() <= 2);
        for pair in matches.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn ties_break_by_name() {
        let catalog = Catalog::from_records(vec![
            PackageRecord::new("beta").with_summary("outbreak tools"),
            PackageRecord::new("alpha").with_summary("outbreak tools"),
        ]);
        let matches = find_relevant_packages("outbreak", &catalog, &RouterOptions::default());
        let names: Vec<_> = matches.iter().map(|m| m.package.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn min_score_and_category_filter_apply() {
        let catalog = sample_catalog();
        let high = RouterOptions::default().with_min_score(100.0);
        assert!(find_relevant_packages("severity", &catalog, &high).is_empty());

        let filtered = RouterOptions::default().with_category("python_package");
        assert!(find_relevant_packages("severity", &catalog, &filtered).is_empty());
    }

    #[test]
    fn cfr_query_ranks_cfr_first() {
        let matches = find_relevant_packages(
            "estimate CFR for COVID-19",
            &sample_catalog(),
            &RouterOptions::default(),
        );
        assert_eq!(matches[0].package.name, "cfr");
    }

    #[test]
    fn empty_query_matches_every_name() {
        let matches = find_relevant_packages("", &sample_catalog(), &RouterOptions::default());
        let names: Vec<&str> = matches.iter().map(|m| m.package.name.as_str()).collect();
        assert_eq!(names, vec!["cfr", "epiparameter", "incidence2"]);
        for m in &matches {
            assert_eq!(m.score, 3.0);
            assert_eq!(m.matched_keywords, vec![format!("name:{}", m.package.name)]);
        }
    }

    #[test]
    fn padded_query_is_not_trimmed_for_name_containment() {
        let (score, tags) = Router::new().score("epi ", &PackageRecord::new("epiparameter"));
        assert_eq!(score, 0.0);
        assert!(tags.is_empty());
    }

    #[test]
    fn payload_rounds_score() {
        let m = PackageMatch {
            package: PackageRecord::new("cfr"),
            score: 6.499,
            matched_keywords: vec!["name:cfr".to_string()],
        };
        assert_eq!(m.to_payload()["score"], json!(6.5));
    }
}
