//! Local substitutes for runtime functions
//!
//! Dispatch is an exact `(package, function)` lookup; there is no fuzzy
//! matching on either half of the key.

pub mod incidence;
pub mod linelist;

use crate::table::{Table, TableError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FallbackError {
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("column '{0}' not present in data")]
    MissingColumn(String),

    #[error("invalid table input: {0}")]
    InvalidTable(#[from] TableError),

    #[error("column '{0}' contains no parseable dates")]
    NoParseableDates(String),

    #[error("invalid value for '{name}': {reason}")]
    InvalidOption { name: String, reason: String },
}

pub type FallbackFn = fn(&[Value], &Map<String, Value>) -> Result<Value, FallbackError>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FallbackKey {
    pub package: String,
    pub function: String,
}

impl FallbackKey {
    pub fn new(package: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            function: function.into(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FallbackRegistry {
    fallbacks: HashMap<FallbackKey, FallbackFn>,
}

impl FallbackRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in linelist and incidence fallbacks
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("linelist", "clean_variable_names", linelist::clean_variable_names);
        registry.register("incidence2", "incidence", incidence::incidence);
        registry
    }

    pub fn register(&mut self, package: &str, function: &str, fallback: FallbackFn) {
        self.fallbacks
            .insert(FallbackKey::new(package, function), fallback);
    }

    pub fn get(&self, package: &str, function: &str) -> Option<FallbackFn> {
        self.fallbacks
            .get(&FallbackKey::new(package, function))
            .copied()
    }

    pub fn contains(&self, package: &str, function: &str) -> bool {
        self.get(package, function).is_some()
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<FallbackKey> {
        let mut keys: Vec<FallbackKey> = self.fallbacks.keys().cloned().collect();
        keys.sort_by(|a, b| (&a.package, &a.function).cmp(&(&b.package, &b.function)));
        keys
    }
}

/// Table argument: first positional, else `x` or `data` keyword
pub(crate) fn table_argument(
    args: &[Value],
    kwargs: &Map<String, Value>,
) -> Result<Table, FallbackError> {
    let value = args
        .first()
        .or_else(|| kwargs.get("x"))
        .or_else(|| kwargs.get("data"))
        .ok_or_else(|| FallbackError::MissingArgument("x".to_string()))?;
    Ok(Table::from_value(value)?)
}
