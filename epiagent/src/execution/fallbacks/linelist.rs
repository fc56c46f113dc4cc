//! Column label standardisation for linelist-style data

use super::{table_argument, FallbackError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid label pattern"));

/// Label used when cleaning leaves nothing behind
const EMPTY_LABEL: &str = "x";

/// `"Date of Onset"` → `"date_of_onset"`
pub fn clean_label(label: &str) -> String {
    let lowered = label.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Standardise every column label of the input table.
///
/// Labels that collide after cleaning get `_2`, `_3`, ... suffixes in column
/// order so no column is lost.
pub fn clean_variable_names(
    args: &[Value],
    kwargs: &Map<String, Value>,
) -> Result<Value, FallbackError> {
    let table = table_argument(args, kwargs)?;

    let mut used: HashSet<String> = HashSet::new();
    let cleaned = table.rename_columns(|label| {
        let mut base = clean_label(label);
        if base.is_empty() {
            base = EMPTY_LABEL.to_string();
        }
        let mut candidate = base.clone();
        let mut suffix = 2;
        while used.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        used.insert(candidate.clone());
        candidate
    });

    log::debug!("Cleaned {} column label(s)", cleaned.n_cols());
    Ok(cleaned.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn labels_are_snake_cased() {
        assert_eq!(clean_label("Case ID"), "case_id");
        assert_eq!(clean_label("Date of Onset"), "date_of_onset");
        assert_eq!(clean_label("  __Age (years)__ "), "age_years");
        assert_eq!(clean_label("---"), "");
    }

    #[test]
    fn table_columns_are_renamed_in_order() {
        let result = clean_variable_names(
            &[json!([{"Case ID": 1, "Date of Onset": "2020-01-01"}])],
            &Map::new(),
        )
        .unwrap();
        let table = Table::from_value(&result).unwrap();
        assert_eq!(table.column_names(), vec!["case_id", "date_of_onset"]);
        assert_eq!(table.column("case_id").unwrap()[0], json!(1));
    }

    #[test]
    fn colliding_labels_are_suffixed() {
        let mut kwargs = Map::new();
        kwargs.insert(
            "x".to_string(),
            json!({"Case ID": [1], "case id": [2], "case_id": [3], "%%": [4]}),
        );
        let result = clean_variable_names(&[], &kwargs).unwrap();
        let table = Table::from_value(&result).unwrap();
        assert_eq!(table.n_cols(), 4);
        for name in ["case_id", "case_id_2", "case_id_3", "x"] {
            assert!(table.has_column(name), "missing {}", name);
        }
    }
}
