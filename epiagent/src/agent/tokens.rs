//! Goal and metadata tokenisation shared by shortlisting and planning

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("valid token pattern"));

/// Lower-cased word tokens in order of appearance, duplicates kept
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Multiset overlap normalised by `sqrt(|goal| * |candidate|)`; zero when
/// either side is empty
pub fn overlap_score(goal: &[String], candidate: &[String]) -> f64 {
    if goal.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for token in goal {
        *remaining.entry(token.as_str()).or_insert(0) += 1;
    }
    let mut overlap = 0usize;
    for token in candidate {
        if let Some(count) = remaining.get_mut(token.as_str()) {
            if *count > 0 {
                *count -= 1;
                overlap += 1;
            }
        }
    }
    overlap as f64 / ((goal.len() * candidate.len()) as f64).sqrt()
}
