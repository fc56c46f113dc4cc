//! Shortlisting, planning and plan execution
//!
//! The shortlist answers "which packages look like this goal" with a
//! symmetric token overlap. The planner answers "which calls does this goal
//! ask for" from a fixed rule table. Execution runs steps one after another
//! through the [`ExecutionAdapter`] and keeps going after a failed step.

pub mod rules;
pub mod tokens;
pub mod types;

use crate::catalog::Catalog;
use crate::execution::{ExecutionAdapter, ToolResult, ToolStatus};
use crate::table::is_tabular;
use itertools::Itertools;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use rules::{PlanRule, DEFAULT_PLAN_RULES};
pub use tokens::{overlap_score, tokenize};
pub use types::{
    PipelineReport, PlanReport, PlannedToolCall, RunReport, ShortlistedPackage, StepOutcome,
};

pub const DEFAULT_SHORTLIST_SIZE: usize = 5;

pub struct EpiAgent {
    adapter: Arc<ExecutionAdapter>,
    rules: Vec<PlanRule>,
    shortlist_size: usize,
}

impl EpiAgent {
    pub fn new(adapter: Arc<ExecutionAdapter>) -> Self {
        Self {
            adapter,
            rules: DEFAULT_PLAN_RULES.to_vec(),
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
        }
    }

    /// Replace the planning table; order is kept as given
    pub fn with_rules(mut self, rules: Vec<PlanRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Shortlist size used by [`EpiAgent::run`]
    pub fn with_shortlist_size(mut self, size: usize) -> Self {
        self.shortlist_size = size;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        self.adapter.catalog()
    }

    pub fn adapter(&self) -> &ExecutionAdapter {
        &self.adapter
    }

    pub fn rules(&self) -> &[PlanRule] {
        &self.rules
    }

    /// Catalogue packages ranked by token overlap with `goal`.
    ///
    /// Candidates sharing no token with the goal are never returned. Equal
    /// scores keep catalogue (name) order.
    pub fn shortlist_packages(&self, goal: &str, top_k: usize) -> Vec<ShortlistedPackage> {
        let goal_tokens = tokenize(goal);
        let goal_set: HashSet<&str> = goal_tokens.iter().map(String::as_str).collect();

        let mut ranked: Vec<ShortlistedPackage> = Vec::new();
        for package in self.catalog().sorted_packages() {
            let topics = package.topics.iter().join(" ");
            let text = [
                package.name.as_str(),
                package.summary.as_str(),
                package.category.as_str(),
                topics.as_str(),
            ]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
            let candidate_tokens = tokenize(&text);

            let score = overlap_score(&goal_tokens, &candidate_tokens);
            if score <= 0.0 {
                continue;
            }

            let matched = candidate_tokens
                .iter()
                .map(String::as_str)
                .filter(|t| goal_set.contains(t))
                .sorted()
                .dedup()
                .join(", ");
            let reason = if matched.is_empty() {
                "Related metadata match.".to_string()
            } else {
                format!("Matched keywords {} against package metadata.", matched)
            };

            ranked.push(ShortlistedPackage {
                name: package.name.clone(),
                score,
                reason,
                metadata: package.to_payload(),
            });
        }

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(top_k);
        ranked
    }

    /// Tool calls whose rule keywords intersect the goal tokens, in rule order
    pub fn plan(&self, goal: &str) -> Vec<PlannedToolCall> {
        let goal_tokens: HashSet<String> = tokenize(goal).into_iter().collect();
        self.rules
            .iter()
            .filter(|rule| rule.matches(&goal_tokens))
            .map(PlannedToolCall::from)
            .collect()
    }

    /// Run every step in order; a failed step does not stop later ones
    pub fn execute(&self, plan: &[PlannedToolCall]) -> Vec<StepOutcome> {
        plan.iter()
            .map(|step| {
                let result = self.adapter.call_function(
                    &step.package,
                    &step.function,
                    &step.args,
                    &step.kwargs,
                    true,
                );
                log::info!("Step {} finished with status {}", step.key(), result.status);
                StepOutcome::from_result(step, result)
            })
            .collect()
    }

    /// Shortlist, plan and, when the plan is non-empty, execute
    pub fn run(&self, goal: &str) -> RunReport {
        let shortlist = self.shortlist_packages(goal, self.shortlist_size);
        let plan = self.plan(goal);
        let execution = if plan.is_empty() {
            Vec::new()
        } else {
            self.execute(&plan)
        };
        RunReport {
            goal: goal.to_string(),
            shortlist,
            plan,
            execution,
        }
    }

    /// Shortlist and plan without executing anything
    pub fn plan_goal(&self, goal: &str, top_k: usize) -> PlanReport {
        PlanReport {
            goal: goal.to_string(),
            shortlist: self.shortlist_packages(goal, top_k),
            plan: self.plan(goal),
        }
    }

    /// Execute `plan` while threading a working table through the steps.
    ///
    /// A step without positional arguments receives the current table, and a
    /// tabular success result becomes the new current table. `step_kwargs`
    /// adds named arguments per `package::function`, overriding the step's
    /// own. Steps that neither the runtime nor a fallback can serve are
    /// reported as skipped.
    pub fn execute_pipeline(
        &self,
        plan: &[PlannedToolCall],
        data: Value,
        step_kwargs: &HashMap<String, Map<String, Value>>,
    ) -> PipelineReport {
        let mut current = data;
        let mut steps = Vec::with_capacity(plan.len());

        for step in plan {
            let key = step.key();
            if !self.adapter.can_execute(&step.package, &step.function) {
                log::info!("Skipping {}: no runtime or local fallback", key);
                let result = ToolResult::skipped(format!(
                    "No runtime function or local fallback exists for {}. Install the package in the statistical runtime to run this step.",
                    key
                ));
                steps.push(StepOutcome::from_result(step, result));
                continue;
            }

            let args = if step.args.is_empty() {
                vec![current.clone()]
            } else {
                step.args.clone()
            };
            let mut kwargs = step.kwargs.clone();
            if let Some(extra) = step_kwargs.get(&key) {
                kwargs.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
            }

            let result = self
                .adapter
                .call_function(&step.package, &step.function, &args, &kwargs, true);
            if result.status == ToolStatus::Success {
                if let Some(output) = result.data.as_ref().filter(|d| is_tabular(d)) {
                    current = output.clone();
                }
            }
            log::info!("Pipeline step {} finished with status {}", key, result.status);
            steps.push(StepOutcome::from_result(step, result));
        }

        PipelineReport {
            steps,
            data: current,
        }
    }
}
