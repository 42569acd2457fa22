//! Sequential batch processing of score sheets.
//!
//! Each sheet is loaded, read by the model, parsed and scored before the
//! next one starts. A sheet that fails at any step is reported and skipped;
//! the rest of the batch continues.

use std::path::{Path, PathBuf};

use crate::extract::{load_sheet_image, parse_extraction, ExtractionError, SheetReader};
use crate::report::{build_result_set, render_raw_scores, ResultRecord};
use crate::scoring::compute_final_score;

/// Parameters that stay fixed for one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    /// Number of highest scores averaged per student
    pub top_n: usize,
    /// Longest image side sent to the model (pixels)
    pub max_image_dimension: u32,
}

/// A sheet that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub file_name: String,
    pub message: String,
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// Sheet `index` (0-based) of `total` is about to be processed
    Started {
        index: usize,
        total: usize,
        file_name: &'a str,
    },
    /// Sheet was scored
    Recorded {
        index: usize,
        record: &'a ResultRecord,
    },
    /// Sheet was skipped
    Failed {
        index: usize,
        failure: &'a BatchFailure,
    },
}

impl BatchEvent<'_> {
    /// Number of sheets finished once this event has been handled.
    pub fn completed(&self) -> usize {
        match self {
            Self::Started { index, .. } => *index,
            Self::Recorded { index, .. } | Self::Failed { index, .. } => index + 1,
        }
    }
}

/// Everything a batch produced.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Scored sheets, ordered by seat number
    pub records: Vec<ResultRecord>,
    /// Skipped sheets, in processing order
    pub failures: Vec<BatchFailure>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Runs one sheet through loading, extraction and scoring.
pub fn process_sheet<R: SheetReader + ?Sized>(
    path: &Path,
    reader: &R,
    settings: &BatchSettings,
) -> Result<ResultRecord, ExtractionError> {
    let image = load_sheet_image(path, settings.max_image_dimension)?;
    let reply = reader.read_sheet(&image)?;
    let extraction = parse_extraction(&reply)?;

    let final_score = compute_final_score(&extraction.raw_scores, settings.top_n);

    Ok(ResultRecord {
        source: image.file_name,
        seat_number: extraction.seat_number,
        final_score,
        raw_scores: render_raw_scores(&extraction.raw_scores),
    })
}

/// Processes every file in order and collects the results.
///
/// `on_event` is called before and after each sheet so callers can show
/// progress. Failures never stop the batch.
pub fn run_batch<R, F>(
    files: &[PathBuf],
    reader: &R,
    settings: &BatchSettings,
    mut on_event: F,
) -> BatchOutcome
where
    R: SheetReader + ?Sized,
    F: FnMut(BatchEvent<'_>),
{
    let total = files.len();
    let mut records = Vec::with_capacity(total);
    let mut failures = Vec::new();

    crate::log(&format!(
        "Batch started: {} sheets, top {} scores",
        total, settings.top_n
    ));

    for (index, path) in files.iter().enumerate() {
        let file_name = display_name(path);
        crate::log(&format!("Processing {}/{}: {}", index + 1, total, file_name));
        on_event(BatchEvent::Started {
            index,
            total,
            file_name: &file_name,
        });

        match process_sheet(path, reader, settings) {
            Ok(record) => {
                crate::log(&format!(
                    "{}: seat {} -> {} (raw {})",
                    record.source, record.seat_number, record.final_score, record.raw_scores
                ));
                on_event(BatchEvent::Recorded {
                    index,
                    record: &record,
                });
                records.push(record);
            }
            Err(e) => {
                let failure = BatchFailure {
                    file_name,
                    message: e.to_string(),
                };
                crate::log(&format!(
                    "Failed to process {}: {}",
                    failure.file_name, failure.message
                ));
                on_event(BatchEvent::Failed {
                    index,
                    failure: &failure,
                });
                failures.push(failure);
            }
        }
    }

    crate::log(&format!(
        "Batch finished: {} scored, {} failed",
        records.len(),
        failures.len()
    ));

    BatchOutcome {
        records: build_result_set(records),
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::SheetImage;
    use image::{ImageBuffer, Rgb};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tempfile::{tempdir, TempDir};

    /// Replies with canned text keyed by file name.
    struct ScriptedReader {
        replies: HashMap<String, Result<String, String>>,
        seen: RefCell<Vec<String>>,
    }

    impl ScriptedReader {
        fn new(replies: &[(&str, Result<&str, &str>)]) -> Self {
            Self {
                replies: replies
                    .iter()
                    .map(|(name, reply)| {
                        (
                            name.to_string(),
                            reply.map(str::to_string).map_err(str::to_string),
                        )
                    })
                    .collect(),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl SheetReader for ScriptedReader {
        fn read_sheet(&self, image: &SheetImage) -> Result<String, ExtractionError> {
            self.seen.borrow_mut().push(image.file_name.clone());
            match self.replies.get(&image.file_name) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(message)) => Err(ExtractionError::Api {
                    status: 500,
                    message: message.clone(),
                }),
                None => Err(ExtractionError::Malformed("no scripted reply".to_string())),
            }
        }
    }

    fn write_sheet(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(8, 8, Rgb([255, 255, 255]));
        img.save(&path).unwrap();
        path
    }

    fn settings() -> BatchSettings {
        BatchSettings {
            top_n: 12,
            max_image_dimension: 2048,
        }
    }

    #[test]
    fn test_batch_scores_and_sorts() {
        let dir = tempdir().unwrap();
        let files = vec![
            write_sheet(&dir, "a.png"),
            write_sheet(&dir, "b.png"),
            write_sheet(&dir, "c.png"),
        ];
        let reader = ScriptedReader::new(&[
            ("a.png", Ok(r#"{"seat_number": "10", "valid_scores": [90, 85]}"#)),
            ("b.png", Ok("```json\n{\"seat_number\": \"2\", \"valid_scores\": [88, 89]}\n```")),
            ("c.png", Ok(r#"{"seat_number": "1", "valid_scores": []}"#)),
        ]);

        let outcome = run_batch(&files, &reader, &settings(), |_| {});

        assert!(outcome.failures.is_empty());
        let rows: Vec<(&str, i64)> = outcome
            .records
            .iter()
            .map(|r| (r.seat_number.as_str(), r.final_score))
            .collect();
        assert_eq!(rows, vec![("1", 0), ("2", 89), ("10", 88)]);
        assert_eq!(outcome.records[2].source, "a.png");
        assert_eq!(outcome.records[2].raw_scores, "[90, 85]");
    }

    #[test]
    fn test_failures_skip_item_and_continue() {
        let dir = tempdir().unwrap();
        let files = vec![
            write_sheet(&dir, "bad_json.png"),
            write_sheet(&dir, "api_down.png"),
            write_sheet(&dir, "good.png"),
        ];
        let reader = ScriptedReader::new(&[
            ("bad_json.png", Ok("I could not read the sheet.")),
            ("api_down.png", Err("service unavailable")),
            ("good.png", Ok(r#"{"seat_number": "5", "valid_scores": [100]}"#)),
        ]);

        let outcome = run_batch(&files, &reader, &settings(), |_| {});

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].seat_number, "5");
        let failed: Vec<&str> = outcome
            .failures
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert_eq!(failed, vec!["bad_json.png", "api_down.png"]);
        assert!(outcome.failures[1].message.contains("service unavailable"));
        // Every sheet was sent, in order
        assert_eq!(
            *reader.seen.borrow(),
            vec!["bad_json.png", "api_down.png", "good.png"]
        );
    }

    #[test]
    fn test_unreadable_image_is_failure() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.jpg");
        std::fs::write(&broken, b"garbage").unwrap();
        let reader = ScriptedReader::new(&[]);

        let outcome = run_batch(&[broken], &reader, &settings(), |_| {});

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(reader.seen.borrow().is_empty());
    }

    #[test]
    fn test_events_report_progress() {
        let dir = tempdir().unwrap();
        let files = vec![write_sheet(&dir, "a.png"), write_sheet(&dir, "b.png")];
        let reader = ScriptedReader::new(&[(
            "a.png",
            Ok(r#"{"seat_number": "1", "valid_scores": [70]}"#),
        )]);

        let mut events = Vec::new();
        run_batch(&files, &reader, &settings(), |event| {
            let kind = match &event {
                BatchEvent::Started { .. } => "start",
                BatchEvent::Recorded { record, .. } => {
                    assert_eq!(record.seat_number, "1");
                    "ok"
                }
                BatchEvent::Failed { .. } => "fail",
            };
            events.push((kind, event.completed()));
        });

        assert_eq!(
            events,
            vec![("start", 0), ("ok", 1), ("start", 1), ("fail", 2)]
        );
    }

    #[test]
    fn test_top_n_applied() {
        let dir = tempdir().unwrap();
        let files = vec![write_sheet(&dir, "a.png")];
        let reader = ScriptedReader::new(&[(
            "a.png",
            Ok(r#"{"seat_number": "1", "valid_scores": [90, 85, "70", "abc", null]}"#),
        )]);
        let settings = BatchSettings {
            top_n: 2,
            max_image_dimension: 2048,
        };

        let outcome = run_batch(&files, &reader, &settings, |_| {});
        assert_eq!(outcome.records[0].final_score, 88);
        assert_eq!(
            outcome.records[0].raw_scores,
            r#"[90, 85, "70", "abc", null]"#
        );
    }

    #[test]
    fn test_empty_batch() {
        let reader = ScriptedReader::new(&[]);
        let outcome = run_batch(&[], &reader, &settings(), |_| {});
        assert!(outcome.records.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
