//! Editing session: the loaded video, its selection and export settings.
//!
//! The window owns exactly one [`Session`] and routes every user action
//! through it. Nothing here touches a GUI toolkit.

use std::path::{Path, PathBuf};

use vidcrop_common::config::AppConfig;
use vidcrop_common::error::{CropperError, CropperResult};
use vidcrop_model::display::{DisplayState, Overlay};
use vidcrop_model::export::ExportSettings;
use vidcrop_model::geometry::{FrameSize, Roi};
use vidcrop_model::selector::RegionSelector;

use crate::export::{export_video, ExportJob};
use crate::frame::Frame;
use crate::progress::PercentCallback;
use crate::tools::FfmpegTools;
use crate::video::VideoHandle;

/// A video opened in the session together with the frame on display.
#[derive(Debug)]
struct LoadedVideo {
    handle: VideoHandle,
    frame: Frame,
}

/// State shared by every control of the window.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    tools: FfmpegTools,
    video: Option<LoadedVideo>,
    selector: RegionSelector,
    display: DisplayState,
    export: ExportSettings,
    /// Corners shown to the user: the full frame after loading, then the
    /// last finalized selection.
    shown_roi: Option<Roi>,
    /// `None` while the progress indicator is hidden.
    progress: Option<f64>,
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        let tools = FfmpegTools::from_config(&config.tools);
        let selector = RegionSelector::new(FrameSize::new(0, 0), config.selection.snap_margin);
        let export = ExportSettings::new(&config.export);
        Self {
            config,
            tools,
            video: None,
            selector,
            display: DisplayState::new(),
            export,
            shown_roi: None,
            progress: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn tools(&self) -> &FfmpegTools {
        &self.tools
    }

    /// Open `path` and show its first frame.
    ///
    /// On failure the session is left exactly as it was. On success the
    /// previous video is released and the selection and progress reset.
    pub fn open_video(&mut self, path: impl AsRef<Path>) -> CropperResult<&Frame> {
        let handle = VideoHandle::open(path, &self.tools)?;
        let frame = handle.first_frame()?;
        Ok(self.adopt(handle, frame))
    }

    fn adopt(&mut self, handle: VideoHandle, frame: Frame) -> &Frame {
        let size = frame.size();
        self.selector.reset(size);
        self.display.set_frame(size);
        self.shown_roi = Some(Roi::full_frame(size));
        self.progress = None;

        if let Some(previous) = self.video.take() {
            tracing::debug!(path = %previous.handle.path().display(), "Releasing previous video");
        }
        let loaded = self.video.insert(LoadedVideo { handle, frame });
        &loaded.frame
    }

    pub fn video(&self) -> Option<&VideoHandle> {
        self.video.as_ref().map(|loaded| &loaded.handle)
    }

    /// Text after "Selected Video:", `None` until a video is loaded.
    pub fn selected_video_label(&self) -> String {
        self.video()
            .map(|video| video.path().display().to_string())
            .unwrap_or_else(|| "None".to_string())
    }

    /// Frame currently on display.
    pub fn frame(&self) -> Option<&Frame> {
        self.video.as_ref().map(|loaded| &loaded.frame)
    }

    pub fn selector(&self) -> &RegionSelector {
        &self.selector
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Track the pointer over the frame, in display-local coordinates.
    pub fn on_pointer_move(&mut self, local_x: f32, local_y: f32) {
        self.display.on_pointer_move(local_x, local_y);
    }

    /// Register a click on the frame. Returns the ROI when this click
    /// completes a selection.
    pub fn on_pointer_down(&mut self, local_x: f32, local_y: f32) -> Option<Roi> {
        self.video.as_ref()?;
        let point = self.display.to_pixel(local_x, local_y)?;
        self.display.on_pointer_move(local_x, local_y);

        let roi = self.selector.on_pointer_down(point)?;
        self.shown_roi = Some(roi);
        Some(roi)
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.display.overlay(&self.selector)
    }

    /// Corners shown next to the selection hint.
    pub fn shown_roi(&self) -> Option<Roi> {
        self.shown_roi
    }

    pub fn export_settings(&self) -> &ExportSettings {
        &self.export
    }

    /// Mutable access for the fps field and codec choice.
    pub fn export_settings_mut(&mut self) -> &mut ExportSettings {
        &mut self.export
    }

    /// Store `path` as the output if its extension is accepted.
    pub fn choose_save_path(&mut self, path: impl Into<PathBuf>) -> CropperResult<()> {
        self.export.set_save_path(path)
    }

    /// Label for the fps field, naming the source rate.
    pub fn fps_label(&self) -> String {
        match self.video() {
            Some(video) => format!("fps: (max {:.2}, type -1 for max fps)", video.fps()),
            None => "fps: (type -1 for max fps)".to_string(),
        }
    }

    /// Snapshot of everything an export needs, detached from the session
    /// so it can run on another thread.
    pub fn export_job(&self) -> CropperResult<(VideoHandle, ExportJob)> {
        let video = self
            .video()
            .ok_or_else(|| CropperError::export("Open a video before rendering"))?;
        let job = ExportJob {
            output_path: self.export.save_path().map(Path::to_path_buf),
            roi: self.selector.selected(),
            fps_text: self.export.fps_text.clone(),
            codec: self.export.codec,
        };
        Ok((video.clone(), job))
    }

    /// Run an export on the calling thread.
    pub fn render(&mut self, progress: Option<PercentCallback>) -> CropperResult<PathBuf> {
        let (video, job) = self.export_job()?;
        self.progress = Some(0.0);
        let output = export_video(&video, &job, progress)?;
        self.progress = Some(100.0);
        Ok(output)
    }

    /// Progress percentage, `None` while the indicator is hidden.
    pub fn progress(&self) -> Option<f64> {
        self.progress
    }

    /// Show the progress indicator at `percent`.
    pub fn set_progress(&mut self, percent: f64) {
        self.progress = Some(percent.clamp(0.0, 100.0));
    }
}
