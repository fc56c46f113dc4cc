use crate::agent::{PlannedToolCall, ShortlistedPackage};
use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::EpiResult;
use clap::Args;

#[derive(Args)]
pub struct PlanArgs {
    /// Analysis goal
    pub goal: String,

    /// Shortlist size (defaults to shortlist.top_k)
    #[arg(long)]
    pub top_k: Option<usize>,
}

pub async fn execute(ctx: &mut CliContext, args: PlanArgs) -> EpiResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let top_k = args.top_k.unwrap_or(ctx.config.shortlist.top_k);
    let agent = ctx.agent()?;

    let report = agent.plan_goal(&args.goal, top_k);

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&report);
        return Ok(());
    }

    print_shortlist(&formatter, &report.shortlist);
    print_plan(&formatter, &report.plan);
    Ok(())
}

pub(crate) fn print_shortlist(formatter: &OutputFormatter, shortlist: &[ShortlistedPackage]) {
    formatter.section("Shortlist");
    if shortlist.is_empty() {
        formatter.list_item("(no related packages)");
    }
    for package in shortlist {
        formatter.list_item(&format!("{} ({:.3}) {}", package.name, package.score, package.reason));
    }
}

pub(crate) fn print_plan(formatter: &OutputFormatter, plan: &[PlannedToolCall]) {
    formatter.section("Plan");
    if plan.is_empty() {
        formatter.list_item("(no rule matched this goal)");
    }
    for (index, step) in plan.iter().enumerate() {
        formatter.list_item(&format!("{}. {} - {}", index + 1, step.key(), step.description));
    }
}
