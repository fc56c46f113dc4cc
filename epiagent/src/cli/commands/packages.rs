use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::{EpiError, EpiResult};
use crate::execution::ToolStatus;
use clap::Args;
use serde_json::Value;

#[derive(Args)]
pub struct PackagesArgs {
    /// Re-list the configured GitHub organisations before printing
    #[arg(long)]
    pub refresh: bool,
}

pub async fn execute(ctx: &mut CliContext, args: PackagesArgs) -> EpiResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let adapter = ctx.adapter()?;

    if args.refresh {
        ctx.status(&format!(
            "Refreshing catalogue from {}...",
            ctx.config.catalog.organisations.join(", ")
        ));
    }
    let result = adapter.list_packages(args.refresh).await;
    if result.status == ToolStatus::Error {
        return Err(EpiError::Catalog(
            result.message.unwrap_or_else(|| "listing failed".to_string()),
        ));
    }

    if ctx.output_format == OutputFormat::Json {
        formatter.json(&result.to_payload());
        return Ok(());
    }

    let packages = result
        .data
        .as_ref()
        .and_then(|d| d.get("packages"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    formatter.section(&format!("Packages ({})", packages.len()));
    formatter.table_header(&["NAME", "CATEGORY", "SUMMARY"]);
    for package in &packages {
        let field = |name: &str| package.get(name).and_then(Value::as_str).unwrap_or("").to_string();
        formatter.table_row(&[&field("name"), &field("category"), &field("summary")]);
    }
    Ok(())
}
