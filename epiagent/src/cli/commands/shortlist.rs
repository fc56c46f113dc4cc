use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::EpiResult;
use clap::Args;

#[derive(Args)]
pub struct ShortlistArgs {
    /// Analysis goal
    pub goal: String,

    /// Maximum number of packages (defaults to shortlist.top_k)
    #[arg(long)]
    pub top_k: Option<usize>,
}

pub async fn execute(ctx: &mut CliContext, args: ShortlistArgs) -> EpiResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let top_k = args.top_k.unwrap_or(ctx.config.shortlist.top_k);
    let agent = ctx.agent()?;

    let shortlist = agent.shortlist_packages(&args.goal, top_k);

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&shortlist);
        return Ok(());
    }
    if shortlist.is_empty() {
        formatter.warning("No package shares a keyword with this goal");
        return Ok(());
    }

    formatter.table_header(&["NAME", "SCORE", "REASON"]);
    for package in &shortlist {
        let score = format!("{:.3}", package.score);
        formatter.table_row(&[&package.name, &score, &package.reason]);
    }
    Ok(())
}
