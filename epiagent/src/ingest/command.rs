//! Ingestor backed by an external digest command
//!
//! The command is invoked as `<program> <url> --output -` plus pattern,
//! size, branch and token flags. Its standard output is split into the
//! summary (everything before `Directory structure:`), the tree, and the
//! file content (from the first `====` separator line on).

use super::{IngestOptions, RawDigest, RepositoryIngestor};
use crate::config::IngestConfig;
use crate::error::{EpiError, EpiResult};
use async_trait::async_trait;
use tokio::process::Command;

const TREE_MARKER: &str = "Directory structure:";
const CONTENT_SEPARATOR: &str = "====";

#[derive(Debug, Clone)]
pub struct CommandIngestor {
    program: String,
}

impl CommandIngestor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.command.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for one repository
    pub fn arguments(&self, repository_url: &str, options: &IngestOptions) -> Vec<String> {
        let mut args = vec![
            repository_url.to_string(),
            "--output".to_string(),
            "-".to_string(),
        ];
        for pattern in &options.include_patterns {
            args.push("--include-pattern".to_string());
            args.push(pattern.clone());
        }
        for pattern in &options.exclude_patterns {
            args.push("--exclude-pattern".to_string());
            args.push(pattern.clone());
        }
        if let Some(size) = options.max_file_size {
            args.push("--max-size".to_string());
            args.push(size.to_string());
        }
        if let Some(branch) = &options.branch {
            args.push("--branch".to_string());
            args.push(branch.clone());
        }
        args
    }
}

impl Default for CommandIngestor {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

/// Split digest text into summary, tree and content sections
pub fn split_digest(output: &str) -> RawDigest {
    let lines: Vec<&str> = output.lines().collect();
    let tree_start = lines.iter().position(|l| l.trim_start().starts_with(TREE_MARKER));
    let content_start = lines
        .iter()
        .enumerate()
        .skip(tree_start.unwrap_or(0))
        .find(|(_, l)| l.starts_with(CONTENT_SEPARATOR))
        .map(|(i, _)| i);

    let section = |from: usize, to: usize| lines[from..to].join("\n").trim().to_string();
    let end = lines.len();
    match (tree_start, content_start) {
        (Some(tree), Some(content)) => RawDigest {
            summary: section(0, tree),
            tree: section(tree, content),
            content: section(content, end),
        },
        (Some(tree), None) => RawDigest {
            summary: section(0, tree),
            tree: section(tree, end),
            content: String::new(),
        },
        (None, Some(content)) => RawDigest {
            summary: section(0, content),
            tree: String::new(),
            content: section(content, end),
        },
        (None, None) => RawDigest {
            summary: String::new(),
            tree: String::new(),
            content: output.trim().to_string(),
        },
    }
}

#[async_trait]
impl RepositoryIngestor for CommandIngestor {
    async fn ingest(&self, repository_url: &str, options: &IngestOptions) -> EpiResult<RawDigest> {
        let mut command = Command::new(&self.program);
        command.args(self.arguments(repository_url, options));
        if let Some(token) = &options.token {
            command.env("GITHUB_TOKEN", token);
        }

        log::debug!("Running {} for {}", self.program, repository_url);
        let output = command.output().await.map_err(|e| {
            EpiError::Ingest(format!("Failed to run '{}': {}", self.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EpiError::Ingest(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(split_digest(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn digest_sections_are_split() {
        let output = "Repository: epiverse-trace/cfr\nFiles analyzed: 2\n\nDirectory structure:\n└── cfr/\n    └── R/\n\n================================================\nFILE: R/cfr.R\n================================================\ncfr <- function() {}\n";
        let digest = split_digest(output);
        assert_eq!(digest.summary, "Repository: epiverse-trace/cfr\nFiles analyzed: 2");
        assert_eq!(digest.tree, "Directory structure:\n└── cfr/\n    └── R/");
        assert!(digest.content.starts_with("====="));
        assert!(digest.content.ends_with("cfr <- function() {}"));
    }

    #[test]
    fn unstructured_output_is_content() {
        let digest = split_digest("just text\n");
        assert_eq!(digest.content, "just text");
        assert!(digest.summary.is_empty());
    }

    #[test]
    fn options_become_flags() {
        let ingestor = CommandIngestor::new("gitingest");
        let options = IngestOptions {
            include_patterns: vec!["*.R".to_string()],
            max_file_size: Some(10_240),
            branch: Some("main".to_string()),
            ..IngestOptions::default()
        };
        assert_eq!(
            ingestor.arguments("https://github.com/epiverse-trace/cfr", &options),
            vec![
                "https://github.com/epiverse-trace/cfr",
                "--output",
                "-",
                "--include-pattern",
                "*.R",
                "--max-size",
                "10240",
                "--branch",
                "main",
            ]
        );
    }

    #[tokio::test]
    async fn missing_program_is_an_ingest_error() {
        let ingestor = CommandIngestor::new("epiagent-definitely-missing-tool");
        let err = ingestor
            .ingest("https://github.com/epiverse-trace/cfr", &IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EpiError::Ingest(_)));
    }
}
