//! Per-student result rows and their ordering.

use serde::Serialize;
use serde_json::Value;

use crate::scoring::to_ascii_digits;

/// One processed sheet: one row of the exported report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    /// Original file name of the sheet photo
    pub source: String,
    /// Seat number as read, or the unknown-seat marker
    pub seat_number: String,
    /// Rounded average of the highest scores
    pub final_score: i64,
    /// Raw score list as returned by the model, for checking against the photo
    pub raw_scores: String,
}

/// Renders the raw score list for manual checking, e.g. `[90, 85, "70", null]`.
pub fn render_raw_scores(scores: &[Value]) -> String {
    let items: Vec<String> = scores.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(", "))
}

/// Orders records by seat number.
///
/// When every seat number parses as an integer the records are sorted
/// numerically; if any one does not, the whole set is sorted as text.
/// Digits of other scripts, such as full-width `"３"`, count as integers.
pub fn build_result_set(mut records: Vec<ResultRecord>) -> Vec<ResultRecord> {
    let numeric: Option<Vec<i64>> = records
        .iter()
        .map(|r| to_ascii_digits(r.seat_number.trim()).parse::<i64>().ok())
        .collect();

    match numeric {
        Some(keys) => {
            let mut keyed: Vec<(i64, ResultRecord)> = keys.into_iter().zip(records).collect();
            keyed.sort_by_key(|(key, _)| *key);
            keyed.into_iter().map(|(_, record)| record).collect()
        }
        None => {
            records.sort_by(|a, b| a.seat_number.cmp(&b.seat_number));
            records
        }
    }
}
