//! Output formatting for CLI commands

use crate::execution::{ToolResult, ToolStatus};
use crate::table::{is_tabular, Table};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

/// Rows shown when a result table is printed in table format
const PREVIEW_ROWS: usize = 20;

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    Json,
    /// Plain text (minimal formatting)
    Plain,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "plain" => Ok(OutputFormat::Plain),
            _ => Err(format!(
                "Unknown output format '{}'. Valid options: table, json, plain",
                s
            )),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Plain => write!(f, "plain"),
        }
    }
}

/// Output formatter for consistent CLI output
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            _ => {
                println!("{} {}", "✓".green(), message);
            }
        }
    }

    pub fn error(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message})
                );
            }
            _ => {
                eprintln!("{} {}", "✗".red(), message);
            }
        }
    }

    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": message})
                );
            }
            _ => {
                eprintln!("{} {}", "⚠".yellow(), message);
            }
        }
    }

    /// Print data as JSON
    pub fn json<T: Serialize>(&self, data: &T) {
        match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => self.error(&format!("Failed to serialize to JSON: {}", e)),
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({key: value}));
            }
            OutputFormat::Table => {
                println!("{}: {}", key.cyan(), value);
            }
            OutputFormat::Plain => {
                println!("{}: {}", key, value);
            }
        }
    }

    pub fn table_header(&self, columns: &[&str]) {
        if self.format == OutputFormat::Table {
            let header: Vec<_> = columns.iter().map(|c| c.bold().to_string()).collect();
            println!("{}", header.join("  "));
            println!("{}", "-".repeat(columns.iter().map(|c| c.len() + 2).sum()));
        }
    }

    /// Print a row; plain format separates cells with tabs
    pub fn table_row(&self, values: &[&str]) {
        match self.format {
            OutputFormat::Table => println!("{}", values.join("  ")),
            OutputFormat::Plain => println!("{}", values.join("\t")),
            OutputFormat::Json => {}
        }
    }

    pub fn section(&self, title: &str) {
        match self.format {
            OutputFormat::Table => {
                println!();
                println!("{}", title.bold().underline());
                println!();
            }
            OutputFormat::Plain => {
                println!();
                println!("{}", title);
                println!();
            }
            OutputFormat::Json => {}
        }
    }

    pub fn list_item(&self, item: &str) {
        match self.format {
            OutputFormat::Table => {
                println!("  {} {}", "•".cyan(), item);
            }
            _ => {
                println!("  - {}", item);
            }
        }
    }

    /// Coloured status label
    pub fn status_label(&self, status: ToolStatus) -> String {
        if self.format != OutputFormat::Table {
            return status.to_string();
        }
        match status {
            ToolStatus::Success => status.as_str().green().to_string(),
            ToolStatus::Error => status.as_str().red().to_string(),
            ToolStatus::Partial => status.as_str().yellow().to_string(),
            ToolStatus::Skipped => status.as_str().dimmed().to_string(),
        }
    }

    /// Print a tool result: the payload in JSON mode, otherwise status,
    /// message, artifact and data
    pub fn tool_result(&self, result: &ToolResult) {
        if self.format == OutputFormat::Json {
            self.json(&result.to_payload());
            return;
        }

        self.kv("status", &self.status_label(result.status));
        if let Some(message) = &result.message {
            self.kv("message", message);
        }
        if let Some(path) = &result.artifact_path {
            self.kv("artifact", &path.display().to_string());
        }
        if let Some(data) = &result.data {
            self.section("Data");
            self.value(data);
        }
    }

    /// Tables are printed as rows, anything else as pretty JSON
    pub fn value(&self, value: &Value) {
        let table = if is_tabular(value) {
            Table::from_value(value).ok()
        } else {
            None
        };
        match table {
            Some(table) if self.format != OutputFormat::Json => self.data_table(&table),
            _ => self.json(value),
        }
    }

    fn data_table(&self, table: &Table) {
        let columns = table.column_names();
        self.table_header(&columns);
        for record in table.records().iter().take(PREVIEW_ROWS) {
            let cells: Vec<String> = columns.iter().map(|c| cell_text(&record[*c])).collect();
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            self.table_row(&cells);
        }
        if table.n_rows() > PREVIEW_ROWS {
            self.list_item(&format!("... {} more rows", table.n_rows() - PREVIEW_ROWS));
        }
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
