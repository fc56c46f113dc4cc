//! epiagent CLI - route, plan and run epidemiological analysis packages
//!
//! # Usage
//!
//! ```bash
//! # List the catalogue, refreshing it from GitHub first
//! epiagent packages --refresh
//!
//! # Rank packages for a task
//! epiagent find "estimate the reproduction number"
//!
//! # Shortlist and plan without executing
//! epiagent plan "clean the linelist and count cases"
//!
//! # Plan and execute over a JSON dataset
//! epiagent run "clean the linelist and count cases" --data linelist.json \
//!     --step-kwargs '{"incidence2::incidence": {"date_index": "date_of_onset"}}'
//!
//! # Call a single function
//! epiagent call linelist clean_variable_names --args '[[{"Case ID": 1}]]'
//!
//! # Digest repositories, four at a time
//! epiagent ingest https://github.com/epiverse-trace/cfr --max-concurrent 4
//! ```

use clap::{Parser, Subcommand};
use epiagent::cli::commands::{
    call::CallArgs, find::FindArgs, ingest::IngestArgs, packages::PackagesArgs, plan::PlanArgs,
    run::RunArgs, shortlist::ShortlistArgs,
};
use epiagent::cli::{commands, CliContext, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "epiagent")]
#[command(version)]
#[command(about = "Route, plan and run epidemiological analysis packages", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format (table, json, plain)
    #[arg(short, long, global = true, default_value = "table")]
    output_format: String,

    /// Suppress status messages
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalogue packages
    Packages(PackagesArgs),

    /// Rank packages by relevance to a query
    Find(FindArgs),

    /// Packages sharing keywords with a goal
    Shortlist(ShortlistArgs),

    /// Shortlist and plan without executing
    Plan(PlanArgs),

    /// Plan and execute a goal
    Run(RunArgs),

    /// Invoke one package function
    Call(CallArgs),

    /// Digest repositories for analysis
    Ingest(IngestArgs),
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_directive = if verbose { "epiagent=debug" } else { "epiagent=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let output_format: OutputFormat = cli.output_format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using table format.", e);
        OutputFormat::Table
    });

    let mut ctx = match cli.config {
        Some(path) => CliContext::new(path)?,
        None => CliContext::with_defaults()?,
    };
    ctx.output_format = output_format;
    ctx.quiet = cli.quiet;
    ctx.verbose = cli.verbose;

    for warning in ctx.config.validate() {
        tracing::warn!("{}", warning);
    }

    let result = match cli.command {
        Commands::Packages(args) => commands::packages::execute(&mut ctx, args).await,
        Commands::Find(args) => commands::find::execute(&mut ctx, args).await,
        Commands::Shortlist(args) => commands::shortlist::execute(&mut ctx, args).await,
        Commands::Plan(args) => commands::plan::execute(&mut ctx, args).await,
        Commands::Run(args) => commands::run::execute(&mut ctx, args).await,
        Commands::Call(args) => commands::call::execute(&mut ctx, args).await,
        Commands::Ingest(args) => commands::ingest::execute(&mut ctx, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
