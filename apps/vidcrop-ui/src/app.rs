use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use eframe::egui;
use vidcrop_common::config::AppConfig;
use vidcrop_common::error::CropperError;
use vidcrop_model::export::Codec;
use vidcrop_render_engine::{export_video, PercentCallback, Session};

use crate::frame_view::FrameView;

const CORNER_HINT: &str = "Select corner points: 1. top left, 2. bottom right";

#[derive(Debug)]
enum RenderMessage {
    Progress { percent: f64 },
    Complete { output: PathBuf },
    Failed { error: CropperError },
}

pub struct VidCropApp {
    session: Session,
    frame_view: FrameView,
    /// Name shown next to "Save As:", the last pick even if it was rejected.
    save_label: String,
    status: String,
    render_receiver: Option<Receiver<RenderMessage>>,
}

impl VidCropApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig, video: Option<PathBuf>) -> Self {
        let mut app = Self {
            session: Session::new(config),
            frame_view: FrameView::default(),
            save_label: String::new(),
            status: "Open a video to begin".to_string(),
            render_receiver: None,
        };

        if let Err(err) = app.session.tools().ensure_available() {
            show_error(&err);
        }
        if let Some(path) = video {
            app.load_video(&cc.egui_ctx, &path);
        }
        app
    }

    fn pick_video(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new().set_title("Open video").pick_file() {
            self.load_video(ctx, &path);
        }
    }

    fn load_video(&mut self, ctx: &egui::Context, path: &Path) {
        match self.session.open_video(path) {
            Ok(frame) => {
                self.frame_view.set_frame(ctx, frame);
                self.status = format!("Loaded {}", path.display());
            }
            Err(err) => show_error(&err),
        }
    }

    fn pick_save_path(&mut self) {
        let extensions: Vec<&str> = self
            .session
            .export_settings()
            .allowed_extensions()
            .iter()
            .map(String::as_str)
            .collect();
        let Some(path) = rfd::FileDialog::new()
            .set_title("Save cropped video")
            .add_filter("Video", &extensions)
            .save_file()
        else {
            return;
        };

        self.save_label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if let Err(err) = self.session.choose_save_path(path) {
            show_error(&err);
        }
    }

    fn start_render(&mut self) {
        let (video, job) = match self.session.export_job() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                show_error(&err);
                return;
            }
        };

        let (tx, rx) = mpsc::channel::<RenderMessage>();
        self.render_receiver = Some(rx);
        self.session.set_progress(0.0);
        self.status = "Rendering...".to_string();

        std::thread::spawn(move || {
            let tx_progress = tx.clone();
            let progress: PercentCallback = Box::new(move |percent| {
                let _ = tx_progress.send(RenderMessage::Progress { percent });
            });

            let message = match export_video(&video, &job, Some(progress)) {
                Ok(output) => RenderMessage::Complete { output },
                Err(error) => RenderMessage::Failed { error },
            };
            let _ = tx.send(message);
        });
    }

    fn poll_render_messages(&mut self) {
        let Some(receiver) = self.render_receiver.as_ref() else {
            return;
        };

        loop {
            match receiver.try_recv() {
                Ok(RenderMessage::Progress { percent }) => {
                    self.session.set_progress(percent);
                }
                Ok(RenderMessage::Complete { output }) => {
                    self.session.set_progress(100.0);
                    self.status = format!("Saved {}", output.display());
                    self.render_receiver = None;
                    break;
                }
                Ok(RenderMessage::Failed { error }) => {
                    self.status = "Render failed".to_string();
                    self.render_receiver = None;
                    show_error(&error);
                    break;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.status = "Render worker disconnected".to_string();
                    self.render_receiver = None;
                    break;
                }
            }
        }
    }

    fn is_rendering(&self) -> bool {
        self.render_receiver.is_some()
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        let rendering = self.is_rendering();
        ui.horizontal(|ui| {
            ui.label(format!("Selected Video: {}", self.session.selected_video_label()));
            if ui.add_enabled(!rendering, egui::Button::new("Open...")).clicked() {
                self.pick_video(ui.ctx());
            }
        });

        ui.horizontal(|ui| {
            ui.label(CORNER_HINT);
            if let Some(roi) = self.session.shown_roi() {
                ui.monospace(roi.to_string());
            }
        });
    }

    fn export_controls(&mut self, ui: &mut egui::Ui) {
        let rendering = self.is_rendering();

        ui.horizontal(|ui| {
            ui.label(format!("Save As: {}", self.save_label));
            if ui.add_enabled(!rendering, egui::Button::new("Save...")).clicked() {
                self.pick_save_path();
            }
        });

        ui.horizontal(|ui| {
            ui.label("Codec:");
            let settings = self.session.export_settings_mut();
            for codec in Codec::ALL {
                ui.radio_value(&mut settings.codec, codec, codec.as_str());
            }
        });

        ui.horizontal(|ui| {
            ui.label(self.session.fps_label());
            ui.add(
                egui::TextEdit::singleline(&mut self.session.export_settings_mut().fps_text)
                    .desired_width(60.0),
            );
        });

        ui.horizontal(|ui| {
            let can_render = !rendering && self.session.video().is_some();
            if ui.add_enabled(can_render, egui::Button::new("Render")).clicked() {
                self.start_render();
            }
            if let Some(percent) = self.session.progress() {
                ui.add(
                    egui::ProgressBar::new((percent / 100.0) as f32)
                        .desired_width(240.0)
                        .text(format!("{percent:.2}%")),
                );
            }
        });

        ui.label(format!("Status: {}", self.status));
    }
}

impl eframe::App for VidCropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_render_messages();
        if self.is_rendering() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::TopBottomPanel::top("video").show(ctx, |ui| self.header(ui));
        egui::TopBottomPanel::bottom("export").show(ctx, |ui| self.export_controls(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                self.frame_view.show(ui, &mut self.session);
            });
        });
    }
}

fn show_error(err: &CropperError) {
    tracing::warn!(error = %err, "Reporting error to user");
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(err.title())
        .set_description(err.to_string())
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
