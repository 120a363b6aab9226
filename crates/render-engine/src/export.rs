//! Export orchestration: validate the request, crop every frame and encode.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};
use std::thread::JoinHandle;

use vidcrop_common::error::{CropperError, CropperResult};
use vidcrop_model::export::{Codec, FrameRate};
use vidcrop_model::geometry::{FrameSize, Roi};

use crate::frame::Frame;
use crate::progress::{PercentCallback, ProgressReporter, ProgressSink, FRAME_BAR};
use crate::tools::FfmpegTools;
use crate::transform::{transform_frames, CropTransform, FrameTransform};
use crate::video::{drain_stderr, join_stderr, VideoHandle, VideoInfo};

/// An export as requested from the window.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Output file path; `None` when no save path was chosen.
    pub output_path: Option<PathBuf>,

    /// Completed selection; `None` exports the full frame.
    pub roi: Option<Roi>,

    /// Raw fps field: a positive integer or `-1` for the source rate.
    pub fps_text: String,

    /// Output codec.
    pub codec: Codec,
}

/// A validated export, ready for a backend.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub output_path: PathBuf,
    pub roi: Roi,
    pub crop: CropTransform,
    pub frame_rate: FrameRate,
    /// Effective output rate.
    pub fps: f64,
    pub output_size: FrameSize,
    /// Progress units expected over the whole export (`fps * duration`).
    pub total_units: f64,
    pub codec: Codec,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Stream every frame of `video` through the plan. Returns the number
    /// of frames written.
    fn render(
        &mut self,
        video: &VideoHandle,
        plan: &ExportPlan,
        progress: &mut dyn ProgressSink,
    ) -> CropperResult<u64>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Sink for encoded output frames.
pub trait FrameEncoder {
    fn write_frame(&mut self, frame: &Frame) -> CropperResult<()>;

    /// Flush and close the output.
    fn finish(self) -> CropperResult<()>;
}

/// Export `video` according to `job`.
///
/// This is the main entry point for rendering. Parameter problems are
/// reported before any output is created; a failure while encoding removes
/// the partially written file.
pub fn export_video(
    video: &VideoHandle,
    job: &ExportJob,
    progress: Option<PercentCallback>,
) -> CropperResult<PathBuf> {
    let plan = plan_export(video.info(), video.path(), job)?;

    tracing::info!(
        source = %video.path().display(),
        output = %plan.output_path.display(),
        roi = %plan.roi,
        fps = plan.fps,
        codec = %plan.codec,
        "Starting export"
    );

    if let Some(parent) = plan.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut backend: Box<dyn RenderBackend> = Box::new(FfmpegBackend::new(video.tools().clone()));
    if !backend.is_available() {
        return Err(CropperError::unsupported(
            "No supported render backend found (expected ffmpeg in PATH)",
        ));
    }
    tracing::info!(backend = backend.name(), "Using render backend");

    let started = std::time::Instant::now();
    let mut reporter = ProgressReporter::new(plan.total_units, progress);
    let frames = backend.render(video, &plan, &mut reporter)?;
    reporter.complete();

    tracing::info!(
        frames,
        elapsed_secs = started.elapsed().as_secs_f64(),
        output = %plan.output_path.display(),
        "Export finished"
    );
    Ok(plan.output_path)
}

/// Validate `job` against the source and resolve every default.
pub fn plan_export(source: &VideoInfo, source_path: &Path, job: &ExportJob) -> CropperResult<ExportPlan> {
    let roi = job
        .roi
        .map(|roi| Roi::from_corners(roi.top_left, roi.bottom_right))
        .unwrap_or_else(|| Roi::full_frame(source.size()));

    let invalid = |reason: String| CropperError::InvalidExportParams {
        fps: job.fps_text.clone(),
        roi: roi.to_string(),
        codec: job.codec.to_string(),
        reason,
    };

    let frame_rate = FrameRate::parse(&job.fps_text).map_err(|e| invalid(e.to_string()))?;

    let output_path = job
        .output_path
        .clone()
        .ok_or(CropperError::MissingSavePath)?;
    if same_file(&output_path, source_path) {
        return Err(invalid("output path would overwrite the source video".to_string()));
    }

    let rect = roi.rect();
    if rect.is_empty() {
        return Err(invalid("selected region has zero width or height".to_string()));
    }
    if !rect.fits_within(source.size()) {
        return Err(invalid(format!(
            "selected region exceeds the {} frame",
            source.size()
        )));
    }

    let crop = CropTransform::new(rect);
    let fps = frame_rate.effective(source.fps);

    Ok(ExportPlan {
        output_path,
        roi,
        crop,
        frame_rate,
        fps,
        output_size: crop.output_size(source.size()),
        total_units: fps * source.duration_secs,
        codec: job.codec,
    })
}

/// Pull every frame from `frames` into `encoder`, reporting one progress
/// unit per frame.
pub fn encode_frames<I, E>(
    frames: I,
    encoder: &mut E,
    progress: &mut dyn ProgressSink,
) -> CropperResult<u64>
where
    I: Iterator<Item = CropperResult<Frame>>,
    E: FrameEncoder,
{
    let mut written = 0u64;
    for frame in frames {
        let frame = frame?;
        encoder.write_frame(&frame)?;
        written += 1;
        progress.on_progress(FRAME_BAR, written as f64);
    }
    Ok(written)
}

/// Streams frames from an ffmpeg decoder into an ffmpeg encoder.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    tools: FfmpegTools,
}

impl FfmpegBackend {
    pub fn new(tools: FfmpegTools) -> Self {
        Self { tools }
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        video: &VideoHandle,
        plan: &ExportPlan,
        progress: &mut dyn ProgressSink,
    ) -> CropperResult<u64> {
        let mut encoder = FfmpegEncoder::start(
            &self.tools,
            &plan.output_path,
            plan.output_size,
            plan.fps,
            plan.codec,
        )?;

        let streamed = video.frames(plan.frame_rate.as_option()).and_then(|frames| {
            let cropped = transform_frames(frames, &plan.crop);
            encode_frames(cropped, &mut encoder, progress)
        });

        let outcome = match streamed {
            Ok(0) => {
                drop(encoder);
                Err(CropperError::export("The source produced no frames"))
            }
            Ok(frames) => encoder.finish().map(|()| frames),
            Err(err) => {
                drop(encoder);
                Err(err)
            }
        };

        if let Err(err) = &outcome {
            tracing::warn!(
                error = %err,
                fps = plan.fps,
                roi = %plan.roi,
                codec = %plan.codec,
                "Export failed"
            );
            remove_partial_output(&plan.output_path);
        }
        outcome
    }

    fn is_available(&self) -> bool {
        self.tools.is_available()
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// An ffmpeg process reading raw RGB24 frames on stdin.
pub struct FfmpegEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    size: FrameSize,
    finished: bool,
}

impl FfmpegEncoder {
    pub fn start(
        tools: &FfmpegTools,
        output_path: &Path,
        size: FrameSize,
        fps: f64,
        codec: Codec,
    ) -> CropperResult<Self> {
        let args = encoder_args(output_path, size, fps, codec);
        tracing::debug!(args = ?args, "Running ffmpeg encoder");

        let mut child = tools
            .ffmpeg()
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CropperError::export(format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(pid = child.id(), size = %size, "ffmpeg encoder started");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CropperError::export("Failed to capture ffmpeg stdin"))?;
        let stderr_task = child.stderr.take().map(drain_stderr);

        Ok(Self {
            child,
            stdin: Some(stdin),
            stderr_task,
            size,
            finished: false,
        })
    }

    /// Close stdin, wait for exit and turn a failure into an error carrying
    /// ffmpeg's diagnostics.
    fn close(&mut self) -> CropperResult<()> {
        self.finished = true;
        self.stdin = None;
        let status = self
            .child
            .wait()
            .map_err(|e| CropperError::export(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr = join_stderr(self.stderr_task.take());

        if !status.success() {
            return Err(CropperError::export(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl FrameEncoder for FfmpegEncoder {
    fn write_frame(&mut self, frame: &Frame) -> CropperResult<()> {
        if frame.size() != self.size {
            return Err(CropperError::export(format!(
                "Encoder expects {} frames, got {}",
                self.size,
                frame.size()
            )));
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CropperError::export("Encoder input already closed"));
        };

        if let Err(write_err) = stdin.write_all(frame.data()) {
            return Err(match self.close() {
                Err(exit_err) => exit_err,
                Ok(()) => CropperError::export(format!("Failed to send frame to ffmpeg: {write_err}")),
            });
        }
        Ok(())
    }

    fn finish(mut self) -> CropperResult<()> {
        self.close()
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if !self.finished {
            self.stdin = None;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// ffmpeg arguments for encoding raw RGB24 input to `output_path`.
///
/// The output path is passed through as an `OsString` so paths that are not
/// valid UTF-8 reach ffmpeg byte for byte.
pub fn encoder_args(output_path: &Path, size: FrameSize, fps: f64, codec: Codec) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-vcodec",
        "rawvideo",
        "-pix_fmt",
        "rgb24",
        "-s",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(format!("{}x{}", size.width, size.height).into());
    args.push("-r".into());
    args.push(format_rate(fps).into());
    for arg in ["-i", "pipe:0", "-an", "-c:v", codec.as_str()] {
        args.push(arg.into());
    }

    // yuv420p needs even dimensions; otherwise ffmpeg picks a full-chroma format.
    if codec == Codec::Libx264 && size.width % 2 == 0 && size.height % 2 == 0 {
        args.push("-pix_fmt".into());
        args.push("yuv420p".into());
    }

    args.push(output_path.as_os_str().to_os_string());
    args
}

/// Format a frame rate for ffmpeg, integral rates without decimals.
fn format_rate(fps: f64) -> String {
    if (fps - fps.round()).abs() < 1e-9 {
        format!("{}", fps.round() as u64)
    } else {
        format!("{fps:.6}")
    }
}

/// Delete a partially written output after a failed export.
fn remove_partial_output(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Removed partial output"),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to remove partial output")
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
