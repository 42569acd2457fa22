//! Result set ordering and report output.
//!
//! This module provides:
//! - Result rows and seat-number ordering
//! - Excel export
//! - Class summary statistics with JSON export

pub mod records;
pub mod summary;
pub mod xlsx;

pub use records::{build_result_set, render_raw_scores, ResultRecord};
pub use summary::ScoreSummary;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Writes the workbook and its summary JSON.
///
/// Returns (workbook_path, summary_path).
pub fn write_report(
    records: &[ResultRecord],
    workbook_path: &Path,
    sheet_name: &str,
) -> Result<(PathBuf, PathBuf)> {
    xlsx::export_to_xlsx(records, workbook_path, sheet_name)?;
    crate::log(&format!("Workbook saved: {}", workbook_path.display()));

    let summary_path = summary::summary_path_for(workbook_path);
    summary::export_summary_json(&ScoreSummary::from_records(records), &summary_path)?;
    crate::log(&format!("Summary JSON saved: {}", summary_path.display()));

    Ok((workbook_path.to_path_buf(), summary_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_report_creates_both_files() {
        let dir = tempdir().unwrap();
        let records = vec![ResultRecord {
            source: "a.jpg".to_string(),
            seat_number: "1".to_string(),
            final_score: 91,
            raw_scores: "[91]".to_string(),
        }];

        let (workbook, summary) =
            write_report(&records, &dir.path().join("grades.xlsx"), "成績結算").unwrap();

        assert!(workbook.exists());
        assert_eq!(summary, dir.path().join("grades.summary.json"));
        assert!(summary.exists());
    }
}
