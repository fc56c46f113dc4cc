//! Uniform result envelope for tool invocations

use crate::table::normalize_value;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
    Partial,
    Skipped,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Success => "success",
            ToolStatus::Error => "error",
            ToolStatus::Partial => "partial",
            ToolStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a tool call.
///
/// Constructed through the status-specific helpers so an `Error` result never
/// carries data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
}

impl ToolResult {
    pub fn success(data: Value) -> Self {
        Self {
            status: ToolStatus::Success,
            data: Some(data),
            message: None,
            artifact_path: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            data: None,
            message: Some(message.into()),
            artifact_path: None,
        }
    }

    pub fn partial(data: Value, message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Partial,
            data: Some(data),
            message: Some(message.into()),
            artifact_path: None,
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Skipped,
            data: None,
            message: Some(message.into()),
            artifact_path: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    /// JSON payload handed across the process boundary; tables are wrapped
    /// in the dataframe envelope
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("status".to_string(), json!(self.status));
        if let Some(message) = &self.message {
            payload.insert("message".to_string(), json!(message));
        }
        if let Some(data) = &self.data {
            payload.insert("data".to_string(), normalize_value(data.clone()));
        }
        if let Some(path) = &self.artifact_path {
            payload.insert(
                "artifact_path".to_string(),
                json!(path.to_string_lossy()),
            );
        }
        Value::Object(payload)
    }
}
