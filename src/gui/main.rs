#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;

use eframe::egui;

use exif_tagger::config::{Config, ReportLayout};
use exif_tagger::exif::{ExifToolBackend, TagValues};
use exif_tagger::pipeline::{BatchSummary, Worklist, run_batch};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([760.0, 640.0])
        .with_min_inner_size([520.0, 420.0])
        .with_drag_and_drop(true);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Image Metadata Processor",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}

// ── Blocking notices ────────────────────────────────────────────────

enum Notice {
    /// Save pressed with nothing queued.
    NoFiles,
    /// A batch finished.
    Done {
        processed: usize,
        skipped: usize,
        failed: usize,
        reports: Vec<PathBuf>,
    },
    /// The batch could not start.
    Error(String),
}

impl Notice {
    fn from_summary(summary: &BatchSummary) -> Self {
        Self::Done {
            processed: summary.processed(),
            skipped: summary.skipped.len(),
            failed: summary.failed.len(),
            reports: summary.report_paths.clone(),
        }
    }
}

// ── Main application state ──────────────────────────────────────────

struct App {
    config: Config,
    config_path: Option<PathBuf>,
    worklist: Worklist,
    values: TagValues,
    notice: Option<Notice>,
    status: String,
}

impl App {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = Config::load(None).unwrap_or_default();

        Self {
            config,
            config_path: None,
            worklist: Worklist::new(),
            values: TagValues::default(),
            notice: None,
            status: "Ready. Drop images or folders".into(),
        }
    }

    fn add_paths(&mut self, paths: Vec<PathBuf>) {
        let added = self.worklist.add_paths(&paths, &self.config.collector);
        self.status = format!(
            "{added} added, {} image(s) queued",
            self.worklist.len()
        );
    }

    fn open_files(&mut self) {
        let extensions: Vec<&str> = self
            .config
            .collector
            .extensions
            .iter()
            .map(String::as_str)
            .collect();
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", &extensions)
            .pick_files()
        {
            self.add_paths(paths);
        }
    }

    fn open_folder(&mut self) {
        if let Some(dir) = rfd::FileDialog::new()
            .set_title("Select Directory")
            .pick_folder()
        {
            self.add_paths(vec![dir]);
        }
    }

    /// Runs the whole batch on the UI thread; the window is unresponsive until it returns.
    fn save_metadata(&mut self) {
        if self.worklist.is_empty() {
            self.notice = Some(Notice::NoFiles);
            return;
        }

        let backend = ExifToolBackend::from_config(&self.config.exiftool);
        match run_batch(&self.worklist, &self.values, &backend, &self.config) {
            Ok(summary) => {
                for (old, new) in &summary.renamed {
                    self.worklist.replace(old, new.clone());
                }
                self.status = format!("Processed {} images", summary.processed());
                self.notice = Some(Notice::from_summary(&summary));
            }
            Err(e) => {
                self.status = format!("Error: {e}");
                self.notice = Some(Notice::Error(format!("{e:#}")));
            }
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = &self.notice else {
            return;
        };

        let title = match notice {
            Notice::NoFiles => "No Files Selected",
            Notice::Done { .. } => "Processing Complete",
            Notice::Error(_) => "Error",
        };

        let mut close = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                match notice {
                    Notice::NoFiles => {
                        ui.label("Please select one or more files to process.");
                    }
                    Notice::Done {
                        processed,
                        skipped,
                        failed,
                        reports,
                    } => {
                        ui.label(format!("Processed {processed} images"));
                        if *skipped > 0 {
                            ui.label(format!("{skipped} skipped (keyword already present)"));
                        }
                        if *failed > 0 {
                            ui.colored_label(
                                egui::Color32::from_rgb(220, 50, 50),
                                format!("{failed} failed, see the log for details"),
                            );
                        }
                        for report in reports {
                            ui.label(format!("Report: {}", report.display()));
                        }
                    }
                    Notice::Error(msg) => {
                        ui.colored_label(egui::Color32::from_rgb(220, 50, 50), msg);
                    }
                }
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });

        if close {
            self.notice = None;
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let blocked = self.notice.is_some();

        // Handle dropped files and folders
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() && !blocked {
            self.add_paths(dropped);
        }

        // ── Top bar ─────────────────────────────────────────────────
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("exif-tagger");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(&self.status);
                });
            });
        });

        // ── Bottom toolbar ──────────────────────────────────────────
        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!blocked, egui::Button::new("📂 Add Files..."))
                    .clicked()
                {
                    self.open_files();
                }
                if ui
                    .add_enabled(!blocked, egui::Button::new("📁 Add Folder..."))
                    .clicked()
                {
                    self.open_folder();
                }
                if ui
                    .add_enabled(!blocked && !self.worklist.is_empty(), egui::Button::new("🗑 Clear"))
                    .clicked()
                {
                    self.worklist.clear();
                    self.status = "Ready. Drop images or folders".into();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(!blocked, egui::Button::new("💾 Save Metadata"))
                        .clicked()
                    {
                        self.save_metadata();
                    }
                });
            });
            ui.add_space(4.0);
        });

        // ── Central panel: fields, queue, settings ──────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| {
                egui::Grid::new("tag_fields")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Hierarchical Subject:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.values.hierarchical_subject)
                                .desired_width(f32::INFINITY),
                        );
                        ui.end_row();

                        ui.label("Keywords:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.values.keyword)
                                .desired_width(f32::INFINITY),
                        );
                        ui.end_row();

                        ui.label("Description:");
                        ui.add(
                            egui::TextEdit::multiline(&mut self.values.description)
                                .desired_rows(3)
                                .desired_width(f32::INFINITY),
                        );
                        ui.end_row();

                        ui.label("Date Time Original:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.values.date_time_original)
                                .hint_text("2023:05:01 12:30:45")
                                .desired_width(f32::INFINITY),
                        );
                        ui.end_row();
                    });

                ui.add_space(8.0);
                ui.separator();
                ui.heading(format!("Queued images ({})", self.worklist.len()));

                egui::ScrollArea::vertical()
                    .max_height(260.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        if self.worklist.is_empty() {
                            ui.label(
                                egui::RichText::new("Drop images or folders here")
                                    .size(16.0)
                                    .color(egui::Color32::GRAY),
                            );
                        }
                        for path in self.worklist.paths() {
                            ui.label(path.display().to_string());
                        }
                    });

                ui.add_space(8.0);
                self.show_settings(ui);
            });
        });

        self.show_notice(ctx);
    }
}

// ── Settings ────────────────────────────────────────────────────────

impl App {
    fn show_settings(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new(egui::RichText::new("Settings").strong())
            .default_open(false)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Config file:");
                    if let Some(ref path) = self.config_path {
                        ui.label(path.display().to_string());
                    } else {
                        ui.label("(default)");
                    }
                    if ui.button("Load...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                        {
                            match Config::load(Some(&path)) {
                                Ok(c) => {
                                    self.config = c;
                                    self.config_path = Some(path);
                                    self.status = "Config loaded".into();
                                }
                                Err(e) => {
                                    self.status = format!("Failed to load config: {e}");
                                }
                            }
                        }
                    }
                    if ui.button("Save").clicked() {
                        let path = self.config_path.as_deref();
                        match self.config.save(path) {
                            Ok(()) => self.status = "Config saved".into(),
                            Err(e) => self.status = format!("Failed to save config: {e}"),
                        }
                    }
                });

                ui.horizontal(|ui| {
                    ui.label("exiftool:");
                    ui.text_edit_singleline(&mut self.config.exiftool.program);
                });

                ui.checkbox(
                    &mut self.config.rename.enabled,
                    "Rename files after capture time",
                );
                ui.checkbox(
                    &mut self.config.output.backup_originals,
                    "Backup originals (.bak)",
                );
                ui.checkbox(&mut self.config.report.enabled, "Write JSON report");
                ui.horizontal(|ui| {
                    ui.label("Report:");
                    ui.radio_value(
                        &mut self.config.report.layout,
                        ReportLayout::Batch,
                        "One file per batch",
                    );
                    ui.radio_value(
                        &mut self.config.report.layout,
                        ReportLayout::PerFile,
                        "One file per image",
                    );
                });
            });
    }
}
