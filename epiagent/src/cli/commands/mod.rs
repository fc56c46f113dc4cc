//! CLI commands module

pub mod call;
pub mod find;
pub mod ingest;
pub mod packages;
pub mod plan;
pub mod run;
pub mod shortlist;
