//! GUI application state management.
//!
//! Tracks user input values and batch status for display.

use std::path::PathBuf;
use std::time::Instant;

use crate::batch::BatchFailure;
use crate::report::{ResultRecord, ScoreSummary};

/// Batch status for display in GUI.
#[derive(Clone, Debug, Default)]
pub enum RunStatus {
    /// Not running, ready to start
    #[default]
    Idle,
    /// Sheets are being processed
    Running {
        completed: usize,
        total: usize,
        current_file: String,
        start_time: Instant,
    },
    /// Batch finished
    Completed { scored: usize, failed: usize },
    /// Batch could not start
    Error(String),
}

impl RunStatus {
    /// Get display text for current status.
    pub fn status_text(&self) -> String {
        match self {
            Self::Idle => "待機中".to_string(),
            Self::Running {
                completed,
                total,
                current_file,
                ..
            } => {
                format!("正在處理：{} ({}/{})", current_file, (completed + 1).min(*total), total)
            }
            Self::Completed { scored, failed } => {
                format!("處理完成！成功 {} 份，失敗 {} 份", scored, failed)
            }
            Self::Error(msg) => format!("錯誤: {}", msg),
        }
    }

    /// Get progress as fraction (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        match self {
            Self::Running {
                completed, total, ..
            } if *total > 0 => *completed as f32 / *total as f32,
            Self::Completed { .. } => 1.0,
            _ => 0.0,
        }
    }

    /// Get elapsed time string if running.
    pub fn elapsed_text(&self) -> Option<String> {
        match self {
            Self::Running { start_time, .. } => {
                let secs = start_time.elapsed().as_secs();
                Some(format!("{:02}:{:02}", secs / 60, secs % 60))
            }
            _ => None,
        }
    }

    /// Check if a batch is currently running.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// GUI application state.
#[derive(Debug)]
pub struct GuiState {
    /// Gemini API key (user input).
    pub api_key: String,
    /// Number of highest scores averaged (user input).
    pub top_n: usize,
    /// Folder path typed by the user.
    pub folder_input: String,
    /// Sheet photos queued for the next run.
    pub files: Vec<PathBuf>,
    /// Current batch status.
    pub status: RunStatus,
    /// Per-file errors of the current or last run.
    pub failures: Vec<BatchFailure>,
    /// Results of the last run, ordered by seat number.
    pub records: Vec<ResultRecord>,
    /// Class statistics of the last run.
    pub summary: Option<ScoreSummary>,
    /// Where the last workbook was saved.
    pub saved_path: Option<PathBuf>,
    /// One-line notice shown under the actions (save result, input problems).
    pub notice: Option<String>,
}

impl GuiState {
    /// Creates the initial state from configured defaults.
    pub fn new(api_key: Option<&str>, top_n: usize) -> Self {
        Self {
            api_key: api_key.unwrap_or_default().to_string(),
            top_n: top_n.max(1),
            folder_input: String::new(),
            files: Vec::new(),
            status: RunStatus::Idle,
            failures: Vec::new(),
            records: Vec::new(),
            summary: None,
            saved_path: None,
            notice: None,
        }
    }

    /// Adds sheet photos, skipping ones already queued.
    pub fn add_files(&mut self, files: Vec<PathBuf>) -> usize {
        let before = self.files.len();
        for file in files {
            if !self.files.contains(&file) {
                self.files.push(file);
            }
        }
        self.files.len() - before
    }

    /// The start button is usable only with a key, at least one photo and no run in progress.
    pub fn can_start(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.files.is_empty() && !self.status.is_running()
    }
}
