use crate::cli::{CliContext, OutputFormatter};
use crate::error::{EpiError, EpiResult};
use crate::execution::ToolStatus;
use clap::Args;
use serde_json::{Map, Value};

#[derive(Args)]
pub struct CallArgs {
    /// Package name, e.g. incidence2
    pub package: String,

    /// Function exported by the package
    pub function: String,

    /// Positional arguments as a JSON array
    #[arg(long, value_name = "JSON")]
    pub args: Option<String>,

    /// Named arguments as a JSON object
    #[arg(long, value_name = "JSON")]
    pub kwargs: Option<String>,

    /// Pass values to the runtime without tabular marshalling
    #[arg(long)]
    pub no_convert: bool,
}

pub async fn execute(ctx: &mut CliContext, args: CallArgs) -> EpiResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let adapter = ctx.adapter()?;

    let positional = parse_positional(args.args.as_deref())?;
    let named = parse_named(args.kwargs.as_deref())?;

    ctx.status(&format!("Calling {}::{}", args.package, args.function));
    let result = adapter.call_function(
        &args.package,
        &args.function,
        &positional,
        &named,
        !args.no_convert,
    );
    formatter.tool_result(&result);

    if result.status == ToolStatus::Error {
        return Err(EpiError::Bridge(format!(
            "{}::{} did not execute",
            args.package, args.function
        )));
    }
    Ok(())
}

fn parse_positional(raw: Option<&str>) -> EpiResult<Vec<Value>> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) => match serde_json::from_str::<Value>(text)? {
            Value::Array(items) => Ok(items),
            other => Ok(vec![other]),
        },
    }
}

fn parse_named(raw: Option<&str>) -> EpiResult<Map<String, Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(text) => match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(map),
            _ => Err(EpiError::InvalidInput(
                "--kwargs must be a JSON object".to_string(),
            )),
        },
    }
}
