//! Excel export of the result set.
//!
//! Writes one header row and one row per record:
//! file name, seat number, final score, raw score list.

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

use super::records::ResultRecord;

/// Column headers, in order.
pub const XLSX_HEADERS: [&str; 4] = ["原始檔名", "座號", "採計分數平均", "辨識到的有效分數"];

/// Column widths (characters), matching `XLSX_HEADERS`.
const COLUMN_WIDTHS: [f64; 4] = [28.0, 10.0, 14.0, 48.0];

/// Writes the records to an .xlsx workbook with a single named sheet.
///
/// Creates the parent directory if needed and overwrites an existing file.
pub fn export_to_xlsx(records: &[ResultRecord], output_path: &Path, sheet_name: &str) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet_name)
        .context(format!("Invalid sheet name: {}", sheet_name))?;

    for (col, (title, width)) in XLSX_HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, *title, &header_format)
            .context("Failed to write header row")?;
        worksheet
            .set_column_width(col, width)
            .context("Failed to set column width")?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet
            .write_string(row, 0, &record.source)
            .and_then(|ws| ws.write_string(row, 1, &record.seat_number))
            .and_then(|ws| ws.write_number(row, 2, record.final_score as f64))
            .and_then(|ws| ws.write_string(row, 3, &record.raw_scores))
            .context(format!("Failed to write row for {}", record.source))?;
    }

    workbook
        .save(output_path)
        .context(format!("Failed to save workbook: {}", output_path.display()))?;

    Ok(())
}
