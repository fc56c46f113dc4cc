//! epiagent CLI module
//!
//! # Commands
//!
//! - `packages` - List (and optionally refresh) the catalogue
//! - `find` - Rank packages for an analysis query
//! - `shortlist` - Packages similar to a goal
//! - `plan` - Shortlist and plan without executing
//! - `run` - Plan and execute, optionally over a dataset
//! - `call` - Invoke a single package function
//! - `ingest` - Build text digests of repositories

pub mod commands;
pub mod context;
pub mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputFormatter};
