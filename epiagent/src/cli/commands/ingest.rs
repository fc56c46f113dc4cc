use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::{EpiError, EpiResult};
use crate::execution::{ToolResult, ToolStatus};
use crate::ingest::{self, CommandIngestor, IngestOptions};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct IngestArgs {
    /// Repository URLs to digest
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Maximum concurrent ingestions (defaults to ingest.max_concurrent)
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Directory receiving one digest file per repository
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only include files matching this pattern (repeatable)
    #[arg(long = "include", value_name = "PATTERN")]
    pub include_patterns: Vec<String>,

    /// Skip files matching this pattern (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude_patterns: Vec<String>,

    /// Largest file size in bytes to read
    #[arg(long)]
    pub max_file_size: Option<u64>,

    #[arg(long)]
    pub branch: Option<String>,
}

pub async fn execute(ctx: &mut CliContext, args: IngestArgs) -> EpiResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let ingestor = Arc::new(CommandIngestor::from_config(&ctx.config.ingest));
    let options = IngestOptions {
        include_patterns: args.include_patterns,
        exclude_patterns: args.exclude_patterns,
        max_file_size: args.max_file_size,
        branch: args.branch,
        token: ctx.config.catalog.token.clone(),
    };
    let output_dir = args.output_dir.or_else(|| ctx.config.ingest.output_dir.clone());
    let max_concurrent = args
        .max_concurrent
        .unwrap_or(ctx.config.ingest.max_concurrent);

    ctx.status(&format!(
        "Ingesting {} repository(ies) with {}",
        args.urls.len(),
        ingestor.program()
    ));
    let result = ingest::batch_ingest(
        ingestor,
        &args.urls,
        &options,
        output_dir.as_deref(),
        max_concurrent,
    )
    .await;

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&result.to_payload());
    } else {
        print_batch(&formatter, &result);
    }

    if result.status == ToolStatus::Error {
        return Err(EpiError::Ingest(
            result.message.unwrap_or_else(|| "ingestion failed".to_string()),
        ));
    }
    Ok(())
}

fn print_batch(formatter: &OutputFormatter, result: &ToolResult) {
    formatter.kv("status", &formatter.status_label(result.status));
    if let Some(message) = &result.message {
        formatter.kv("message", message);
    }
    let Some(data) = &result.data else {
        return;
    };

    let empty = Vec::new();
    let successes = data["successful_ingests"].as_array().unwrap_or(&empty);
    if !successes.is_empty() {
        formatter.section("Digests");
        formatter.table_header(&["REPOSITORY", "FILES", "TOKENS"]);
        for digest in successes {
            let url = digest["repository_url"].as_str().unwrap_or("");
            let files = digest["files_analyzed"].to_string();
            let tokens = digest["estimated_tokens"].to_string();
            formatter.table_row(&[url, &files, &tokens]);
        }
    }

    let errors = data["errors"].as_array().unwrap_or(&empty);
    if !errors.is_empty() {
        formatter.section("Errors");
        for error in errors {
            formatter.list_item(&format!(
                "{}: {}",
                error["repository"].as_str().unwrap_or("?"),
                error["error"].as_str().unwrap_or("")
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_printing_tolerates_missing_sections() {
        let formatter = OutputFormatter::new(OutputFormat::Plain);
        print_batch(&formatter, &ToolResult::error("boom"));
        print_batch(
            &formatter,
            &ToolResult::success(json!({"errors": Value::Null})).with_message("Processed 0 repositories"),
        );
    }
}
