//! Daily incidence counts from a linelist date column

use super::{table_argument, FallbackError};
use crate::table::Table;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%Y%m%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MAX_INTERVAL_DAYS: i64 = 36_525;
/// Upper bound on the bins produced by gap filling
const MAX_FILLED_BINS: i64 = 36_525;

static INTERVAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)?\s*(d|day|days|daily|w|week|weeks|weekly)?$").expect("valid interval pattern")
});

/// Parse a cell to a calendar day; time of day is discarded
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Bin width in days; accepts a positive integer or strings like `"7 days"`, `"2w"`, `"week"`
fn parse_interval(value: Option<&Value>) -> Result<i64, FallbackError> {
    let invalid = |reason: &str| FallbackError::InvalidOption {
        name: "interval".to_string(),
        reason: reason.to_string(),
    };

    let days = match value {
        None | Some(Value::Null) => 1,
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| invalid("expected a whole number of days"))?,
        Some(Value::String(s)) => {
            let text = s.trim().to_lowercase();
            let captures = INTERVAL
                .captures(&text)
                .filter(|_| !text.is_empty())
                .ok_or_else(|| invalid("expected e.g. 7, \"7 days\" or \"week\""))?;
            let count: i64 = match captures.get(1) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| invalid("interval count is too large"))?,
                None => 1,
            };
            let unit = captures.get(2).map(|m| m.as_str()).unwrap_or("d");
            if unit.starts_with('w') {
                count.saturating_mul(7)
            } else {
                count
            }
        }
        Some(_) => return Err(invalid("expected a number or a string")),
    };

    if days < 1 {
        return Err(invalid("must be at least one day"));
    }
    if days > MAX_INTERVAL_DAYS {
        return Err(invalid("must not exceed a century"));
    }
    Ok(days)
}

fn parse_fill_dates(value: Option<&Value>) -> Result<bool, FallbackError> {
    match value {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(FallbackError::InvalidOption {
            name: "fill_dates".to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn date_index(args: &[Value], kwargs: &Map<String, Value>) -> Result<String, FallbackError> {
    let value = kwargs
        .get("date_index")
        .or_else(|| args.get(1))
        .ok_or_else(|| FallbackError::MissingArgument("date_index".to_string()))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| FallbackError::InvalidOption {
            name: "date_index".to_string(),
            reason: "expected a column name".to_string(),
        })
}

/// Count rows per day of `date_index`.
///
/// Named arguments: `date_index` (required, may also be the second positional
/// argument), `interval` (bin width, default one day, bins anchored at the
/// earliest date) and `fill_dates` (insert zero-count bins for gaps, default
/// true, refused when it would exceed `MAX_FILLED_BINS` bins). Rows whose
/// date cannot be parsed are discarded. The result is a
/// `(date, count)` table sorted by date.
pub fn incidence(args: &[Value], kwargs: &Map<String, Value>) -> Result<Value, FallbackError> {
    let table = table_argument(args, kwargs)?;
    let date_column = date_index(args, kwargs)?;
    let interval = parse_interval(kwargs.get("interval"))?;
    let fill_dates = parse_fill_dates(kwargs.get("fill_dates"))?;

    let cells = table
        .column(&date_column)
        .ok_or_else(|| FallbackError::MissingColumn(date_column.clone()))?;
    let dates: Vec<NaiveDate> = cells.iter().filter_map(parse_date).collect();
    let (start, end) = match (dates.iter().min(), dates.iter().max()) {
        (Some(start), Some(end)) => (*start, *end),
        _ => return Err(FallbackError::NoParseableDates(date_column)),
    };
    if dates.len() < cells.len() {
        log::debug!(
            "Discarded {} row(s) with unparseable '{}'",
            cells.len() - dates.len(),
            date_column
        );
    }

    let bin_of = |date: NaiveDate| {
        let offset = date.signed_duration_since(start).num_days();
        start + Duration::days(offset / interval * interval)
    };

    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for date in &dates {
        *counts.entry(bin_of(*date)).or_insert(0) += 1;
    }
    if fill_dates {
        let last = bin_of(end);
        let bins = last.signed_duration_since(start).num_days() / interval + 1;
        if bins > MAX_FILLED_BINS {
            return Err(FallbackError::InvalidOption {
                name: "fill_dates".to_string(),
                reason: format!(
                    "filling {} to {} needs {} bins, more than {}; widen the interval or disable filling",
                    start, end, bins, MAX_FILLED_BINS
                ),
            });
        }
        let mut day = start;
        while day <= last {
            counts.entry(day).or_insert(0);
            match day.checked_add_signed(Duration::days(interval)) {
                Some(next) => day = next,
                None => break,
            }
        }
    }

    let (labels, totals): (Vec<Value>, Vec<Value>) = counts
        .into_iter()
        .map(|(date, count)| (json!(date.format("%Y-%m-%d").to_string()), json!(count)))
        .unzip();
    let result = Table::from_columns(vec![("date", labels), ("count", totals)])?;
    Ok(result.to_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kwargs(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn rows(result: &Value) -> Vec<(String, u64)> {
        let table = Table::from_value(result).unwrap();
        table
            .records()
            .iter()
            .map(|r| {
                (
                    r["date"].as_str().unwrap().to_string(),
                    r["count"].as_u64().unwrap(),
                )
            })
            .collect()
    }

    fn onsets(dates: &[&str]) -> Value {
        Value::Array(dates.iter().map(|d| json!({"date_onset": d})).collect())
    }

    #[test]
    fn gaps_are_filled_with_zero_by_default() {
        let result = incidence(
            &[onsets(&["2020-01-01", "2020-01-01", "2020-01-03"])],
            &kwargs(&[("date_index", json!("date_onset"))]),
        )
        .unwrap();
        assert_eq!(
            rows(&result),
            vec![
                ("2020-01-01".to_string(), 2),
                ("2020-01-02".to_string(), 0),
                ("2020-01-03".to_string(), 1),
            ]
        );
    }

    #[test]
    fn fill_can_be_disabled() {
        let result = incidence(
            &[onsets(&["2020-01-03", "2020-01-01"])],
            &kwargs(&[("date_index", json!("date_onset")), ("fill_dates", json!(false))]),
        )
        .unwrap();
        assert_eq!(
            rows(&result),
            vec![("2020-01-01".to_string(), 1), ("2020-01-03".to_string(), 1)]
        );
    }

    #[test]
    fn weekly_interval_sums_bins_from_first_date() {
        let result = incidence(
            &[onsets(&["2020-01-01", "2020-01-07", "2020-01-08", "2020-01-20"])],
            &kwargs(&[("date_index", json!("date_onset")), ("interval", json!("week"))]),
        )
        .unwrap();
        assert_eq!(
            rows(&result),
            vec![
                ("2020-01-01".to_string(), 2),
                ("2020-01-08".to_string(), 1),
                ("2020-01-15".to_string(), 1),
            ]
        );
    }

    #[test]
    fn unparseable_rows_are_discarded_and_times_floored() {
        let result = incidence(
            &[onsets(&["2020-01-01T08:30:00Z", "not a date", "", "2020-01-01 23:59:59"])],
            &kwargs(&[("date_index", json!("date_onset"))]),
        )
        .unwrap();
        assert_eq!(rows(&result), vec![("2020-01-01".to_string(), 2)]);
    }

    #[test]
    fn failures_are_descriptive() {
        let data = onsets(&["2020-01-01"]);
        assert_eq!(
            incidence(&[data.clone()], &Map::new()).unwrap_err(),
            FallbackError::MissingArgument("date_index".to_string())
        );
        assert_eq!(
            incidence(&[data], &kwargs(&[("date_index", json!("date_report"))])).unwrap_err(),
            FallbackError::MissingColumn("date_report".to_string())
        );
        assert_eq!(
            incidence(
                &[onsets(&["n/a", "unknown"])],
                &kwargs(&[("date_index", json!("date_onset"))])
            )
            .unwrap_err(),
            FallbackError::NoParseableDates("date_onset".to_string())
        );
    }

    #[test]
    fn gap_filling_is_bounded() {
        let data = onsets(&["1900-01-01", "2100-01-01"]);
        let daily = kwargs(&[("date_index", json!("date_onset"))]);
        assert!(matches!(
            incidence(&[data.clone()], &daily).unwrap_err(),
            FallbackError::InvalidOption { name, .. } if name == "fill_dates"
        ));

        let unfilled = kwargs(&[("date_index", json!("date_onset")), ("fill_dates", json!(false))]);
        assert_eq!(rows(&incidence(&[data.clone()], &unfilled).unwrap()).len(), 2);

        let weekly = kwargs(&[("date_index", json!("date_onset")), ("interval", json!("week"))]);
        let bins = rows(&incidence(&[data], &weekly).unwrap());
        assert_eq!(bins.first().unwrap().0, "1900-01-01");
        assert_eq!(bins.iter().map(|(_, n)| n).sum::<u64>(), 2);
    }

    #[test]
    fn interval_forms() {
        assert_eq!(parse_interval(None).unwrap(), 1);
        assert_eq!(parse_interval(Some(&json!(3))).unwrap(), 3);
        assert_eq!(parse_interval(Some(&json!("7 days"))).unwrap(), 7);
        assert_eq!(parse_interval(Some(&json!("2w"))).unwrap(), 14);
        assert!(parse_interval(Some(&json!(0))).is_err());
        assert!(parse_interval(Some(&json!("fortnight"))).is_err());
        assert!(parse_interval(Some(&json!(""))).is_err());
    }
}
