//! Background batch run for the window.
//!
//! The batch itself is sequential; it runs on one worker thread so the
//! window keeps repainting. Progress is published through globals that the
//! GUI polls each frame.

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use crate::batch::{run_batch, BatchEvent, BatchFailure, BatchOutcome, BatchSettings};
use crate::extract::GeminiClient;
use crate::report::ResultRecord;

/// Global flag indicating if a batch is currently running.
static RUN_IN_PROGRESS: AtomicBool = AtomicBool::new(false);

/// Sheets finished in the current run.
static COMPLETED: AtomicUsize = AtomicUsize::new(0);

/// Sheets in the current run.
static TOTAL: AtomicUsize = AtomicUsize::new(0);

/// Sheet being processed right now.
static CURRENT_FILE: Mutex<String> = Mutex::new(String::new());

/// Failures reported so far in the current run.
static LIVE_FAILURES: Mutex<Vec<BatchFailure>> = Mutex::new(Vec::new());

/// Sheets scored so far in the current run, in processing order.
static LIVE_RECORDS: Mutex<Vec<ResultRecord>> = Mutex::new(Vec::new());

/// Result of the last finished run, until the GUI takes it.
static FINISHED: Mutex<Option<BatchOutcome>> = Mutex::new(None);

/// Snapshot of a running batch for display.
#[derive(Debug, Clone, Default)]
pub struct RunProgress {
    pub completed: usize,
    pub total: usize,
    pub current_file: String,
    pub failures: Vec<BatchFailure>,
    pub records: Vec<ResultRecord>,
}

/// Checks if a batch is currently running.
pub fn is_run_in_progress() -> bool {
    RUN_IN_PROGRESS.load(Ordering::SeqCst)
}

/// Returns the current progress snapshot.
pub fn get_progress() -> RunProgress {
    RunProgress {
        completed: COMPLETED.load(Ordering::SeqCst),
        total: TOTAL.load(Ordering::SeqCst),
        current_file: CURRENT_FILE
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default(),
        failures: LIVE_FAILURES
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default(),
        records: LIVE_RECORDS
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default(),
    }
}

/// Takes the outcome of the last finished run, if any.
pub fn take_outcome() -> Option<BatchOutcome> {
    FINISHED.lock().ok().and_then(|mut o| o.take())
}

/// Clears the running flag when the worker thread ends, even by panic.
struct RunGuard;

impl Drop for RunGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            crate::log("Batch thread panicked; run aborted");
        }
        RUN_IN_PROGRESS.store(false, Ordering::SeqCst);
    }
}

fn set_current_file(name: &str) {
    if let Ok(mut s) = CURRENT_FILE.lock() {
        *s = name.to_string();
    }
}

fn handle_event(event: BatchEvent<'_>) {
    COMPLETED.store(event.completed(), Ordering::SeqCst);
    match event {
        BatchEvent::Started {
            file_name, total, ..
        } => {
            TOTAL.store(total, Ordering::SeqCst);
            set_current_file(file_name);
        }
        BatchEvent::Failed { failure, .. } => {
            if let Ok(mut f) = LIVE_FAILURES.lock() {
                f.push(failure.clone());
            }
        }
        BatchEvent::Recorded { record, .. } => {
            if let Ok(mut r) = LIVE_RECORDS.lock() {
                r.push(record.clone());
            }
        }
    }
}

/// Starts a batch on a background thread.
///
/// Fails without spawning if a batch is already running.
pub fn start_run(files: Vec<PathBuf>, client: GeminiClient, settings: BatchSettings) -> Result<()> {
    if RUN_IN_PROGRESS.swap(true, Ordering::SeqCst) {
        bail!("A batch is already running");
    }

    COMPLETED.store(0, Ordering::SeqCst);
    TOTAL.store(files.len(), Ordering::SeqCst);
    set_current_file("");
    if let Ok(mut f) = LIVE_FAILURES.lock() {
        f.clear();
    }
    if let Ok(mut r) = LIVE_RECORDS.lock() {
        r.clear();
    }
    if let Ok(mut o) = FINISHED.lock() {
        *o = None;
    }

    let spawned = thread::Builder::new()
        .name("sheet-batch".to_string())
        .spawn(move || {
            let _guard = RunGuard;
            let outcome = run_batch(&files, &client, &settings, handle_event);
            if let Ok(mut o) = FINISHED.lock() {
                *o = Some(outcome);
            }
        });

    if let Err(e) = spawned {
        RUN_IN_PROGRESS.store(false, Ordering::SeqCst);
        bail!("Failed to start batch thread: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Tests share the run flag.
    static SERIAL: Mutex<()> = Mutex::new(());

    #[test]
    fn test_empty_run_finishes_with_empty_outcome() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let client = GeminiClient::new(
            "key",
            "gemini-1.5-flash",
            "http://127.0.0.1:9",
            Duration::from_secs(1),
        )
        .unwrap();
        let settings = BatchSettings {
            top_n: 12,
            max_image_dimension: 2048,
        };

        start_run(Vec::new(), client, settings).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let outcome = loop {
            if let Some(outcome) = take_outcome() {
                break outcome;
            }
            assert!(Instant::now() < deadline, "batch did not finish");
            thread::sleep(Duration::from_millis(10));
        };

        assert!(outcome.records.is_empty());
        assert_eq!(get_progress().total, 0);
    }

    #[test]
    fn test_panicking_worker_clears_run_flag() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        RUN_IN_PROGRESS.store(true, Ordering::SeqCst);

        let joined = thread::spawn(|| {
            let _guard = RunGuard;
            panic!("reader blew up");
        })
        .join();

        assert!(joined.is_err());
        assert!(!is_run_in_progress());
        assert!(take_outcome().is_none());
    }
}
