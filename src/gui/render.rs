//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic.

use eframe::egui::{self, Color32, RichText};

use super::state::{GuiState, RunStatus};

/// Render the API key and selection count inputs.
pub fn render_settings(ui: &mut egui::Ui, state: &mut GuiState) {
    ui.heading("設定");
    ui.add_space(8.0);

    egui::Grid::new("settings_grid")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Google Gemini API Key:");
            ui.add(
                egui::TextEdit::singleline(&mut state.api_key)
                    .password(true)
                    .desired_width(320.0),
            );
            ui.end_row();

            ui.label("採計最高分數量:");
            ui.add(
                egui::DragValue::new(&mut state.top_n)
                    .range(1..=999)
                    .speed(1.0),
            );
            ui.end_row();
        });

    ui.hyperlink_to(
        "按此獲取免費 Gemini API Key",
        "https://aistudio.google.com/app/apikey",
    );

    if state.api_key.trim().is_empty() {
        ui.add_space(4.0);
        ui.colored_label(
            Color32::from_rgb(200, 150, 0),
            "請先輸入 API Key 才能開始運作。",
        );
    }
}

/// Render the sheet photo inputs.
/// Returns (add_folder_clicked, clear_clicked).
pub fn render_inputs(ui: &mut egui::Ui, state: &mut GuiState, hovering: bool) -> (bool, bool) {
    let mut add_clicked = false;
    let mut clear_clicked = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.heading("成績單圖片");
    ui.add_space(4.0);

    let hint = if hovering {
        RichText::new("放開以加入圖片").color(Color32::from_rgb(0, 120, 200))
    } else {
        RichText::new("將成績單圖片 (jpg / png) 或資料夾拖曳到視窗中").color(Color32::GRAY)
    };
    ui.label(hint);

    ui.horizontal(|ui| {
        ui.label("資料夾:");
        ui.add(egui::TextEdit::singleline(&mut state.folder_input).desired_width(280.0));
        if ui.button("加入").clicked() {
            add_clicked = true;
        }
    });

    ui.add_space(4.0);
    ui.horizontal(|ui| {
        ui.label(format!("已選擇 {} 個檔案", state.files.len()));
        ui.add_enabled_ui(!state.files.is_empty() && !state.status.is_running(), |ui| {
            if ui.button("清除").clicked() {
                clear_clicked = true;
            }
        });
    });

    egui::CollapsingHeader::new("檔案清單")
        .default_open(false)
        .show(ui, |ui| {
            for file in &state.files {
                ui.label(file.display().to_string());
            }
        });

    (add_clicked, clear_clicked)
}

/// Render the start button.
/// Returns true if clicked.
pub fn render_controls(ui: &mut egui::Ui, state: &GuiState) -> bool {
    let mut start_clicked = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.add_enabled_ui(state.can_start(), |ui| {
        if ui
            .button(RichText::new("▶ 開始辨識與計算").size(16.0))
            .clicked()
        {
            start_clicked = true;
        }
    });

    start_clicked
}

/// Render the progress display section.
pub fn render_progress(ui: &mut egui::Ui, state: &GuiState) {
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label("狀態:");

        let status_color = match &state.status {
            RunStatus::Idle => Color32::GRAY,
            RunStatus::Running { .. } => Color32::from_rgb(0, 120, 200),
            RunStatus::Completed { .. } => Color32::from_rgb(0, 150, 0),
            RunStatus::Error(_) => Color32::from_rgb(200, 0, 0),
        };

        ui.label(RichText::new(state.status.status_text()).color(status_color));
    });

    ui.add_space(8.0);
    let progress_bar = egui::ProgressBar::new(state.status.progress())
        .show_percentage()
        .animate(state.status.is_running());
    ui.add(progress_bar);

    if let Some(elapsed) = state.status.elapsed_text() {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("經過時間:");
            ui.label(elapsed);
        });
    }

    for failure in &state.failures {
        ui.colored_label(
            Color32::from_rgb(200, 0, 0),
            format!("處理 {} 時發生錯誤: {}", failure.file_name, failure.message),
        );
    }
}

/// Render the result table and class summary.
pub fn render_results(ui: &mut egui::Ui, state: &GuiState) {
    if state.records.is_empty() {
        return;
    }

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.heading("結算結果");
    ui.add_space(4.0);

    egui::Grid::new("results_grid")
        .num_columns(4)
        .striped(true)
        .spacing([16.0, 4.0])
        .show(ui, |ui| {
            for header in crate::report::xlsx::XLSX_HEADERS {
                ui.label(RichText::new(header).strong());
            }
            ui.end_row();

            for record in &state.records {
                ui.label(record.source.as_str());
                ui.label(record.seat_number.as_str());
                ui.label(record.final_score.to_string());
                ui.label(record.raw_scores.as_str());
                ui.end_row();
            }
        });

    if let Some(summary) = &state.summary {
        ui.add_space(8.0);
        ui.label(format!(
            "人數 {}　平均 {:.2}　中位數 {:.1}　最低 {}　最高 {}　標準差 {:.2}",
            summary.count, summary.mean, summary.median, summary.min, summary.max, summary.std_dev
        ));
    }
}

/// Render the action buttons (Save Excel, Open Folder).
/// Returns (save_clicked, open_folder_clicked).
pub fn render_actions(ui: &mut egui::Ui, state: &GuiState) -> (bool, bool) {
    let mut save_clicked = false;
    let mut open_folder_clicked = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.add_enabled_ui(!state.records.is_empty() && !state.status.is_running(), |ui| {
            if ui.button("📥 下載 Excel 檔案").clicked() {
                save_clicked = true;
            }
        });

        ui.add_space(20.0);

        ui.add_enabled_ui(state.saved_path.is_some(), |ui| {
            if ui.button("📁 開啟資料夾").clicked() {
                open_folder_clicked = true;
            }
        });
    });

    if let Some(notice) = &state.notice {
        ui.add_space(4.0);
        ui.label(notice.as_str());
    }

    (save_clicked, open_folder_clicked)
}
