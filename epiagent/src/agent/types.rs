//! Shortlist, plan and report types

use crate::agent::rules::PlanRule;
use crate::execution::{ToolResult, ToolStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Package judged similar to a goal by token overlap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistedPackage {
    pub name: String,
    pub score: f64,
    pub reason: String,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedToolCall {
    pub package: String,
    pub function: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub kwargs: Map<String, Value>,
}

impl PlannedToolCall {
    pub fn new(
        package: impl Into<String>,
        function: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            package: package.into(),
            function: function.into(),
            description: description.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }

    /// `package::function`
    pub fn key(&self) -> String {
        format!("{}::{}", self.package, self.function)
    }
}

impl From<&PlanRule> for PlannedToolCall {
    fn from(rule: &PlanRule) -> Self {
        PlannedToolCall::new(rule.package, rule.function, rule.description)
    }
}

/// Result of one executed plan step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub package: String,
    pub function: String,
    pub description: String,
    pub status: ToolStatus,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl StepOutcome {
    pub fn from_result(step: &PlannedToolCall, result: ToolResult) -> Self {
        Self {
            package: step.package.clone(),
            function: step.function.clone(),
            description: step.description.clone(),
            status: result.status,
            message: result.message,
            data: result.data,
        }
    }
}

/// Shortlist and plan without execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub goal: String,
    pub shortlist: Vec<ShortlistedPackage>,
    pub plan: Vec<PlannedToolCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub goal: String,
    pub shortlist: Vec<ShortlistedPackage>,
    pub plan: Vec<PlannedToolCall>,
    pub execution: Vec<StepOutcome>,
}

/// Outcome of running a plan over a working dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub steps: Vec<StepOutcome>,
    /// Working table after the last step that produced one
    pub data: Value,
}

impl PipelineReport {
    pub fn count(&self, status: ToolStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}
