//! GUI module for the application.
//!
//! Provides a graphical interface using egui/eframe: API key and selection
//! count inputs, drag-and-drop of sheet photos, progress, results table and
//! Excel export.

pub mod render;
pub mod state;
pub mod worker;

use std::path::{Path, PathBuf};
use std::time::Instant;

use eframe::egui::{self, Vec2};

use crate::batch::BatchSettings;
use crate::config::get_config;
use crate::extract::{collect_sheet_images, GeminiClient};
use crate::report::{build_result_set, write_report, ScoreSummary};

use state::{GuiState, RunStatus};
use worker::{get_progress, is_run_in_progress, start_run, take_outcome};

/// System fonts with CJK coverage, tried in order.
const CJK_FONT_PATHS: [&str; 7] = [
    "C:\\Windows\\Fonts\\msjh.ttc",  // Microsoft JhengHei
    "C:\\Windows\\Fonts\\mingliu.ttc", // MingLiU
    "C:\\Windows\\Fonts\\msyh.ttc",  // Microsoft YaHei
    "/System/Library/Fonts/PingFang.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
];

/// Main GUI application struct.
pub struct GuiApp {
    /// Application state.
    state: GuiState,
}

impl GuiApp {
    /// Create a new GUI application instance.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        Self::setup_fonts(&cc.egui_ctx);

        let config = get_config();
        Self {
            state: GuiState::new(config.api_key(), config.top_n),
        }
    }

    /// Setup fonts with Traditional Chinese support.
    fn setup_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        let mut font_loaded = false;
        for font_path in &CJK_FONT_PATHS {
            if let Ok(font_data) = std::fs::read(font_path) {
                fonts.font_data.insert(
                    "cjk_font".to_owned(),
                    egui::FontData::from_owned(font_data).into(),
                );

                // Add CJK font as first priority for proportional text
                fonts
                    .families
                    .entry(egui::FontFamily::Proportional)
                    .or_default()
                    .insert(0, "cjk_font".to_owned());

                // Also add for monospace
                fonts
                    .families
                    .entry(egui::FontFamily::Monospace)
                    .or_default()
                    .insert(0, "cjk_font".to_owned());

                crate::log(&format!("Loaded CJK font from: {}", font_path));
                font_loaded = true;
                break;
            }
        }

        if !font_loaded {
            crate::log("Warning: Could not load a CJK font. Text may not display correctly.");
        }

        ctx.set_fonts(fonts);
    }

    /// Queue photos from dropped or typed paths.
    fn add_inputs(&mut self, inputs: Vec<PathBuf>) {
        match collect_sheet_images(&inputs) {
            Ok(files) if files.is_empty() => {
                self.state.notice = Some("找不到 jpg / png 圖片".to_string());
            }
            Ok(files) => {
                let added = self.state.add_files(files);
                crate::log(&format!("GUI: Added {} sheet photos", added));
                self.state.notice = None;
            }
            Err(e) => {
                crate::log(&format!("GUI: Failed to add inputs: {}", e));
                self.state.notice = Some(format!("無法讀取: {}", e));
            }
        }
    }

    /// Update run status by polling the worker.
    fn update_run_status(&mut self) {
        let RunStatus::Running { start_time, .. } = &self.state.status else {
            return;
        };
        let start_time = *start_time;

        let progress = get_progress();
        self.state.failures = progress.failures;
        self.state.records = progress.records;

        if is_run_in_progress() {
            self.state.status = RunStatus::Running {
                completed: progress.completed,
                total: progress.total,
                current_file: progress.current_file,
                start_time,
            };
            return;
        }

        match take_outcome() {
            Some(outcome) => {
                self.state.status = RunStatus::Completed {
                    scored: outcome.records.len(),
                    failed: outcome.failures.len(),
                };
                self.state.summary = Some(ScoreSummary::from_records(&outcome.records));
                self.state.records = outcome.records;
                self.state.failures = outcome.failures;
            }
            None => {
                crate::log("GUI: Batch ended without a result");
                self.state.records = build_result_set(std::mem::take(&mut self.state.records));
                self.state.status = RunStatus::Error("批次處理中斷，請查看記錄檔".to_string());
            }
        }
    }

    /// Handle start button click.
    fn handle_start(&mut self) {
        let config = get_config();
        let settings = BatchSettings {
            top_n: self.state.top_n.max(1),
            max_image_dimension: config.max_image_dimension,
        };

        let started = GeminiClient::from_config(config, &self.state.api_key)
            .map_err(anyhow::Error::from)
            .and_then(|client| start_run(self.state.files.clone(), client, settings));

        match started {
            Ok(()) => {
                self.state.status = RunStatus::Running {
                    completed: 0,
                    total: self.state.files.len(),
                    current_file: String::new(),
                    start_time: Instant::now(),
                };
                self.state.records.clear();
                self.state.failures.clear();
                self.state.summary = None;
                self.state.saved_path = None;
                self.state.notice = None;
                crate::log(&format!(
                    "GUI: Started batch with {} sheets, top {}",
                    self.state.files.len(),
                    settings.top_n
                ));
            }
            Err(e) => {
                self.state.status = RunStatus::Error(e.to_string());
                crate::log(&format!("GUI: Failed to start batch: {}", e));
            }
        }
    }

    /// Handle save button click.
    fn handle_save(&mut self) {
        let config = get_config();
        let path = config.output_path();
        match write_report(&self.state.records, &path, &config.sheet_name) {
            Ok((workbook, _)) => {
                self.state.notice = Some(format!("已儲存: {}", workbook.display()));
                self.state.saved_path = Some(workbook);
            }
            Err(e) => {
                crate::log(&format!("GUI: Failed to save workbook: {:#}", e));
                self.state.notice = Some(format!("儲存失敗: {}", e));
            }
        }
    }

    /// Handle open folder button click.
    fn handle_open_folder(&self) {
        if let Some(folder) = self.state.saved_path.as_deref().and_then(Path::parent) {
            if let Err(e) = open_in_file_manager(folder) {
                crate::log(&format!("GUI: Failed to open folder: {}", e));
            }
        }
    }
}

/// Opens a folder in the platform file manager.
fn open_in_file_manager(path: &Path) -> std::io::Result<()> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    std::process::Command::new(program).arg(path).spawn()?;
    Ok(())
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pick up dropped files and folders
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() && !self.state.status.is_running() {
            self.add_inputs(dropped);
        }
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());

        // Poll batch status
        self.update_run_status();

        // Request repaint while a batch is running (for progress updates)
        if self.state.status.is_running() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("🎓 學生成績登記表自動結算系統");
            ui.add_space(16.0);

            egui::ScrollArea::vertical().show(ui, |ui| {
                render::render_settings(ui, &mut self.state);

                let (add_clicked, clear_clicked) =
                    render::render_inputs(ui, &mut self.state, hovering);
                if add_clicked && !self.state.folder_input.trim().is_empty() {
                    let folder = PathBuf::from(self.state.folder_input.trim());
                    self.add_inputs(vec![folder]);
                }
                if clear_clicked {
                    self.state.files.clear();
                }

                if render::render_controls(ui, &self.state) {
                    self.handle_start();
                }

                render::render_progress(ui, &self.state);
                render::render_results(ui, &self.state);

                let (save_clicked, open_folder_clicked) = render::render_actions(ui, &self.state);
                if save_clicked {
                    self.handle_save();
                }
                if open_folder_clicked {
                    self.handle_open_folder();
                }
            });
        });
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(Vec2::new(820.0, 680.0))
            .with_min_inner_size(Vec2::new(480.0, 400.0))
            .with_title("成績登記表自動計算器")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Score Sheet Tally",
        options,
        Box::new(|cc| Ok(Box::new(GuiApp::new(cc)))),
    )
}
