use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::EpiResult;
use crate::router::{PackageMatch, Router};
use clap::Args;
use serde_json::Value;

#[derive(Args)]
pub struct FindArgs {
    /// Free-text analysis query, e.g. "estimate the case fatality rate"
    pub query: String,

    /// Maximum number of matches (defaults to router.top_k)
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Minimum relevance score (defaults to router.min_score)
    #[arg(long)]
    pub min_score: Option<f64>,

    /// Only consider packages of this category
    #[arg(long)]
    pub category: Option<String>,
}

pub async fn execute(ctx: &mut CliContext, args: FindArgs) -> EpiResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let catalog = ctx.catalog()?;

    let mut options = ctx.router_options();
    if let Some(top_k) = args.top_k {
        options = options.with_top_k(top_k);
    }
    if let Some(min_score) = args.min_score {
        options = options.with_min_score(min_score);
    }
    if let Some(category) = args.category {
        options = options.with_category(category);
    }

    let matches = Router::new().find_relevant_packages(&args.query, &catalog, &options);
    ctx.debug(&format!("{} package(s) matched", matches.len()));

    if ctx.output_format == OutputFormat::Json {
        let payloads: Vec<Value> = matches.iter().map(PackageMatch::to_payload).collect();
        formatter.json(&payloads);
        return Ok(());
    }

    if matches.is_empty() {
        formatter.warning(&format!("No packages matched '{}'", args.query));
        return Ok(());
    }

    formatter.table_header(&["NAME", "SCORE", "MATCHED"]);
    for m in &matches {
        let score = format!("{:.2}", m.score);
        let matched = m.matched_keywords.join(", ");
        formatter.table_row(&[&m.package.name, &score, &matched]);
    }
    Ok(())
}
