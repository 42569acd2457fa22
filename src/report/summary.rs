//! Class-level statistics over final scores.
//!
//! Calculates count, mean, median, min, max and standard deviation, and
//! writes them as JSON next to the workbook.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::records::ResultRecord;

/// Summary statistics for one batch of final scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    /// Number of students
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Median (middle value)
    pub median: f64,
    /// Lowest final score
    pub min: i64,
    /// Highest final score
    pub max: i64,
    /// Standard deviation (population)
    pub std_dev: f64,
}

impl ScoreSummary {
    /// Calculate statistics for the final scores in a result set.
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let values: Vec<i64> = records.iter().map(|r| r.final_score).collect();
        calculate_summary(&values)
    }
}

fn calculate_summary(values: &[i64]) -> ScoreSummary {
    if values.is_empty() {
        return ScoreSummary {
            count: 0,
            mean: 0.0,
            median: 0.0,
            min: 0,
            max: 0,
            std_dev: 0.0,
        };
    }

    let count = values.len();
    let mut sorted = values.to_vec();
    sorted.sort();

    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / count as f64;

    let median = if count % 2 == 0 {
        let mid = count / 2;
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[count / 2] as f64
    };

    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    ScoreSummary {
        count,
        mean,
        median,
        min: sorted[0],
        max: sorted[count - 1],
        std_dev: variance.sqrt(),
    }
}

/// Path of the summary file written next to a workbook: `<stem>.summary.json`.
pub fn summary_path_for(workbook_path: &Path) -> PathBuf {
    let stem = workbook_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    workbook_path.with_file_name(format!("{}.summary.json", stem))
}

/// Export the summary to a pretty-printed JSON file.
pub fn export_summary_json(summary: &ScoreSummary, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(summary).context("Failed to serialize summary to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}
