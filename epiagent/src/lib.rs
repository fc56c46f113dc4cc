//! Epidemiological package routing, planning and execution
//!
//! - [`catalog`]: the package catalogue and its remote refresh
//! - [`router`]: weighted relevance ranking of packages for a query
//! - [`agent`]: goal shortlisting, rule-based planning and plan execution
//! - [`execution`]: the adapter that calls runtime functions or local fallbacks
//! - [`ingest`]: bounded-concurrency repository digests

pub mod agent;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod ingest;
pub mod router;
pub mod table;

pub use agent::{EpiAgent, PlannedToolCall, ShortlistedPackage};
pub use catalog::{Catalog, PackageRecord};
pub use config::EpiagentConfig;
pub use error::{EpiError, EpiResult};
pub use execution::{ExecutionAdapter, ToolResult, ToolStatus};
pub use router::{find_relevant_packages, PackageMatch, Router, RouterOptions};
pub use table::Table;
