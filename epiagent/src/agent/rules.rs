//! Fixed, ordered planning rules
//!
//! A rule fires when the goal shares at least one token with its keywords.
//! Plans list fired rules in table order, never by relevance.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRule {
    pub keywords: &'static [&'static str],
    pub package: &'static str,
    pub function: &'static str,
    pub description: &'static str,
}

impl PlanRule {
    pub fn matches(&self, goal_tokens: &HashSet<String>) -> bool {
        self.keywords.iter().any(|k| goal_tokens.contains(*k))
    }
}

pub static DEFAULT_PLAN_RULES: &[PlanRule] = &[
    PlanRule {
        keywords: &["incidence", "case", "count"],
        package: "incidence2",
        function: "incidence",
        description: "Compute incidence curves from linelist data.",
    },
    PlanRule {
        keywords: &["reproduction", "rt", "estimate"],
        package: "EpiEstim",
        function: "estimate_R",
        description: "Estimate time-varying reproduction numbers.",
    },
    PlanRule {
        keywords: &["clean", "linelist", "standardise"],
        package: "linelist",
        function: "clean_variable_names",
        description: "Standardise column names in linelist style datasets.",
    },
    PlanRule {
        keywords: &["contact", "network", "epicontacts"],
        package: "epicontacts",
        function: "make_epicontacts",
        description: "Build an epicontacts object from contact tracing data.",
    },
];
