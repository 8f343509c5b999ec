use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::{App, NativeOptions};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tracing::{error, info, warn};

use crate::args::{Args, Engines};
use crate::error::{BuildError, Severity};
use crate::lesson::{self, RunConfig, RunReport};
use crate::progress::Progress;

const TITLE: &str = "EXCEL → LESSON";

/// A message box shown over the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Dialog {
    pub fn from_error(err: &BuildError) -> Self {
        Self {
            severity: err.severity(),
            title: err.title().to_string(),
            message: err.detail(),
        }
    }

    pub fn from_result(result: &Result<RunReport, BuildError>) -> Self {
        match result {
            Ok(report) => Self {
                severity: Severity::Info,
                title: "SUCCESS".to_string(),
                message: report.summary(),
            },
            Err(err) => Self::from_error(err),
        }
    }

    fn heading(&self) -> String {
        let icon = match self.severity {
            Severity::Info => "ℹ",
            Severity::Warning => "⚠",
            Severity::Error => "❌",
        };
        format!("{} {}", icon, self.title)
    }
}

/// A build running on its worker thread.
struct ActiveRun {
    progress_rx: UnboundedReceiver<Progress>,
    result_rx: Receiver<Result<RunReport, BuildError>>,
}

pub struct LessonApp {
    input: String,
    output: String,
    engines: Engines,
    progress: f32,
    active: Option<ActiveRun>,
    dialog: Option<Dialog>,
}

impl LessonApp {
    pub fn new(args: &Args, engines: Engines) -> Self {
        Self {
            input: args.input.clone().unwrap_or_default(),
            output: args.output.clone().unwrap_or_default(),
            engines,
            progress: 0.0,
            active: None,
            dialog: None,
        }
    }

    fn pick_excel(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Excel", &["xlsx", "xls"])
            .pick_file()
        {
            self.input = path.display().to_string();
        }
    }

    fn pick_out(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.output = dir.display().to_string();
        }
    }

    fn start_run(&mut self, ctx: &egui::Context) {
        let config = match RunConfig::new(&self.input, &self.output) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}", e);
                self.dialog = Some(Dialog::from_error(&e));
                return;
            }
        };

        let (progress_tx, progress_rx) = unbounded_channel();
        let (result_tx, result_rx) = mpsc::channel();
        let engines = self.engines.clone();
        let ctx = ctx.clone();
        info!("Starting build worker for {}", config.input.display());
        thread::spawn(move || {
            let result = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt.block_on(lesson::build(&config, &engines.hosted, &engines.local, progress_tx)),
                Err(e) => Err(BuildError::Worker(e)),
            };
            let _ = result_tx.send(result);
            ctx.request_repaint();
        });
        self.active = Some(ActiveRun {
            progress_rx,
            result_rx,
        });
    }

    fn poll_worker(&mut self) {
        let Some(run) = self.active.as_mut() else {
            return;
        };
        while let Ok(event) = run.progress_rx.try_recv() {
            self.progress = event.percent();
        }
        let finished = match run.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => None,
        };
        self.active = None;
        self.progress = 0.0;
        self.dialog = Some(match finished {
            Some(result) => {
                if let Err(e) = &result {
                    match e.severity() {
                        Severity::Error => error!("Build failed: {}", e.detail()),
                        _ => info!("{}", e),
                    }
                }
                Dialog::from_result(&result)
            }
            None => {
                error!("Build worker stopped without a result");
                Dialog {
                    severity: Severity::Error,
                    title: "Build failed".to_string(),
                    message: "The build stopped unexpectedly.".to_string(),
                }
            }
        });
    }

    fn path_row(ui: &mut egui::Ui, label: &str, value: &mut String) -> bool {
        let mut browse = false;
        ui.horizontal(|ui| {
            ui.add_sized([110.0, 20.0], egui::Label::new(label));
            ui.add(egui::TextEdit::singleline(value).desired_width(480.0));
            browse = ui.button("Browse").clicked();
        });
        browse
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };
        let mut close = false;
        egui::Window::new(dialog.heading())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(&dialog.message);
                ui.add_space(8.0);
                close = ui.button("OK").clicked();
            });
        if close {
            self.dialog = None;
        }
    }
}

impl App for LessonApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_worker();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(10.0);
            if Self::path_row(ui, "Excel file:", &mut self.input) {
                self.pick_excel();
            }
            if Self::path_row(ui, "Output folder:", &mut self.output) {
                self.pick_out();
            }

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.label(egui::RichText::new("Audio Options").strong());
                ui.horizontal(|ui| {
                    ui.label("Generate audio (English):");
                    ui.label("Will generate both: gTTS (Female US) and Edge TTS (Male US)");
                });
            });

            ui.add_space(15.0);
            ui.add(
                egui::ProgressBar::new(self.progress / 100.0)
                    .desired_width(650.0)
                    .show_percentage(),
            );

            ui.add_space(10.0);
            let button = egui::Button::new(
                egui::RichText::new("🚀 CREATE LESSON")
                    .color(egui::Color32::WHITE)
                    .strong(),
            )
            .fill(egui::Color32::from_rgb(0x00, 0x66, 0xCC));
            if ui.add_enabled(self.active.is_none() && self.dialog.is_none(), button).clicked() {
                self.start_run(ctx);
            }
        });

        self.show_dialog(ctx);

        if self.active.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

pub fn run(args: Args, engines: Engines) -> anyhow::Result<()> {
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([760.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        TITLE,
        options,
        Box::new(move |_cc| Box::new(LessonApp::new(&args, engines))),
    )
    .map_err(|e| anyhow::anyhow!("failed to open window: {}", e))
}
