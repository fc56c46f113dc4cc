//! Tabular values exchanged with tools
//!
//! Tool arguments and results are opaque JSON, but analysis functions mostly
//! consume and produce data frames. `Table` is the column-oriented model used
//! when marshalling those values. Accepted JSON shapes:
//!
//! - an array of record objects: `[{"a": 1}, {"a": 2}]`
//! - the dataframe envelope produced by [`Table::to_value`]:
//!   `{"type": "dataframe", "columns": ["a"], "records": [{"a": 1}]}`
//! - a column map: `{"a": [1, 2], "b": ["x", "y"]}`

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use thiserror::Error;

pub const DATAFRAME_TYPE: &str = "dataframe";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("value is not tabular: {0}")]
    NotTabular(String),

    #[error("column '{column}' has {found} values, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("row {0} is not a record object")]
    NotARecord(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Vec<Value>>,
    n_rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from named columns; all columns must have the same length
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (index, (name, values)) in columns.into_iter().enumerate() {
            let name = name.into();
            if index == 0 {
                table.n_rows = values.len();
            } else if values.len() != table.n_rows {
                return Err(TableError::RaggedColumns {
                    column: name,
                    expected: table.n_rows,
                    found: values.len(),
                });
            }
            table.columns.insert(name, values);
        }
        Ok(table)
    }

    /// Build from record objects; columns appear in first-seen order and
    /// missing cells become `null`
    pub fn from_records(records: &[Value]) -> Result<Self, TableError> {
        Self::from_records_ordered(records, &[])
    }

    fn from_records_ordered(records: &[Value], order: &[String]) -> Result<Self, TableError> {
        let mut names: Vec<String> = order.to_vec();
        for (index, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or(TableError::NotARecord(index))?;
            for key in object.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let mut columns: IndexMap<String, Vec<Value>> = names
            .into_iter()
            .map(|n| (n, Vec::with_capacity(records.len())))
            .collect();
        for record in records {
            if let Some(object) = record.as_object() {
                for (name, values) in columns.iter_mut() {
                    values.push(object.get(name).cloned().unwrap_or(Value::Null));
                }
            }
        }

        Ok(Self {
            columns,
            n_rows: records.len(),
        })
    }

    /// Interpret a JSON value as a table
    pub fn from_value(value: &Value) -> Result<Self, TableError> {
        match value {
            Value::Array(records) => Self::from_records(records),
            Value::Object(object) => {
                if let Some(records) = object.get("records").and_then(Value::as_array) {
                    let order: Vec<String> = object
                        .get("columns")
                        .and_then(Value::as_array)
                        .map(|cols| {
                            cols.iter()
                                .filter_map(|c| c.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                    return Self::from_records_ordered(records, &order);
                }
                if object.is_empty() || !object.values().all(Value::is_array) {
                    return Err(TableError::NotTabular(
                        "expected records, a dataframe envelope or a map of columns".to_string(),
                    ));
                }
                Self::from_columns(object.iter().map(|(name, values)| {
                    (name.clone(), values.as_array().cloned().unwrap_or_default())
                }))
            }
            other => Err(TableError::NotTabular(format!(
                "found {}",
                json_type_name(other)
            ))),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Replace every column label with `rename(label)`, keeping column order
    pub fn rename_columns<F>(self, mut rename: F) -> Self
    where
        F: FnMut(&str) -> String,
    {
        let n_rows = self.n_rows;
        let columns = self
            .columns
            .into_iter()
            .map(|(name, values)| (rename(&name), values))
            .collect();
        Self { columns, n_rows }
    }

    pub fn records(&self) -> Vec<Value> {
        (0..self.n_rows)
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .map(|(name, values)| (name.clone(), values[row].clone()))
                    .collect();
                Value::Object(record)
            })
            .collect()
    }

    /// Dataframe envelope carrying column order alongside the records
    pub fn to_value(&self) -> Value {
        json!({
            "type": DATAFRAME_TYPE,
            "columns": self.column_names(),
            "records": self.records(),
        })
    }
}

/// Does `value` look like the dataframe envelope or a list of records?
pub fn is_tabular(value: &Value) -> bool {
    match value {
        Value::Object(object) => {
            object.get("type").and_then(Value::as_str) == Some(DATAFRAME_TYPE)
        }
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        _ => false,
    }
}

/// Canonicalise tabular values into the dataframe envelope; other values pass through
pub fn normalize_value(value: Value) -> Value {
    if is_tabular(&value) {
        match Table::from_value(&value) {
            Ok(table) => table.to_value(),
            Err(_) => value,
        }
    } else {
        value
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
