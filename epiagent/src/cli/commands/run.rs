use super::plan::{print_plan, print_shortlist};
use crate::agent::StepOutcome;
use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::{EpiError, EpiResult};
use clap::Args;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Analysis goal
    pub goal: String,

    /// JSON dataset (records, column map or dataframe envelope) threaded through the plan
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Extra named arguments per step, e.g. '{"incidence2::incidence": {"date_index": "date_onset"}}'
    #[arg(long, value_name = "JSON", requires = "data")]
    pub step_kwargs: Option<String>,
}

pub async fn execute(ctx: &mut CliContext, args: RunArgs) -> EpiResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let agent = ctx.agent()?;

    let Some(path) = args.data else {
        let report = agent.run(&args.goal);
        if ctx.output_format == OutputFormat::Json {
            formatter.json(&report);
        } else {
            print_shortlist(&formatter, &report.shortlist);
            print_plan(&formatter, &report.plan);
            print_outcomes(&formatter, &report.execution);
        }
        return Ok(());
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| EpiError::Io(format!("Failed to read dataset {:?}: {}", path, e)))?;
    let data: Value = serde_json::from_str(&content)
        .map_err(|e| EpiError::InvalidInput(format!("Dataset {:?} is not JSON: {}", path, e)))?;
    let step_kwargs = parse_step_kwargs(args.step_kwargs.as_deref())?;

    let plan = agent.plan(&args.goal);
    ctx.status(&format!("Running {} step(s) over {:?}", plan.len(), path));
    let report = agent.execute_pipeline(&plan, data, &step_kwargs);

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&report);
        return Ok(());
    }
    print_plan(&formatter, &plan);
    print_outcomes(&formatter, &report.steps);
    formatter.section("Result");
    formatter.value(&report.data);
    Ok(())
}

fn parse_step_kwargs(raw: Option<&str>) -> EpiResult<HashMap<String, Map<String, Value>>> {
    match raw {
        None => Ok(HashMap::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| {
            EpiError::InvalidInput(format!(
                "--step-kwargs must map 'package::function' to an object: {}",
                e
            ))
        }),
    }
}

fn print_outcomes(formatter: &OutputFormatter, outcomes: &[StepOutcome]) {
    formatter.section("Execution");
    if outcomes.is_empty() {
        formatter.list_item("(nothing executed)");
    }
    for outcome in outcomes {
        let mut line = format!(
            "{}::{} [{}]",
            outcome.package,
            outcome.function,
            formatter.status_label(outcome.status)
        );
        if let Some(message) = &outcome.message {
            line.push(' ');
            line.push_str(message);
        }
        formatter.list_item(&line);
    }
}
