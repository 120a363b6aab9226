//! Video handles: probing, single-frame access and lazy frame streams.
//!
//! Decoding is delegated to ffmpeg, which writes RGB24 frames to a pipe.
//! Frames are pulled one at a time so a stream never holds more than a
//! single frame in memory, whatever the length of the video.

use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Stdio};
use std::thread::JoinHandle;

use serde::Deserialize;
use vidcrop_common::error::{CropperError, CropperResult};
use vidcrop_model::geometry::FrameSize;

use crate::frame::{frame_len, Frame, RGB_CHANNELS};
use crate::tools::FfmpegTools;

/// Stream properties of an opened video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Average frame rate of the first video stream.
    pub fps: f64,
    pub duration_secs: f64,
    pub has_audio: bool,
}

impl VideoInfo {
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

/// An opened source video.
///
/// The handle itself holds no process; decoders are spawned per request
/// and released when the returned [`FrameStream`] is dropped.
#[derive(Debug, Clone)]
pub struct VideoHandle {
    path: PathBuf,
    info: VideoInfo,
    tools: FfmpegTools,
}

impl VideoHandle {
    /// Probe `path` and open it as a video.
    pub fn open(path: impl AsRef<Path>, tools: &FfmpegTools) -> CropperResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CropperError::invalid_source(path, "file does not exist"));
        }

        let output = tools
            .ffprobe()
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                CropperError::unsupported(format!(
                    "Failed to run {}: {e}",
                    tools.ffprobe_path().display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CropperError::invalid_source(
                path,
                format!("ffprobe could not read the file: {}", stderr.trim()),
            ));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let info = parse_probe_output(path, &json)?;

        tracing::info!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            duration_secs = info.duration_secs,
            has_audio = info.has_audio,
            "Video opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            info,
            tools: tools.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(path: impl Into<PathBuf>, info: VideoInfo, tools: FfmpegTools) -> Self {
        Self {
            path: path.into(),
            info,
            tools,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    pub fn size(&self) -> FrameSize {
        self.info.size()
    }

    pub fn fps(&self) -> f64 {
        self.info.fps
    }

    pub fn tools(&self) -> &FfmpegTools {
        &self.tools
    }

    pub fn first_frame(&self) -> CropperResult<Frame> {
        self.frame(0)
    }

    /// Frame number `index` at the source frame rate.
    pub fn frame(&self, index: u64) -> CropperResult<Frame> {
        self.frame_at(index as f64 / self.info.fps)
    }

    /// Decode the frame shown at `time_secs`.
    pub fn frame_at(&self, time_secs: f64) -> CropperResult<Frame> {
        let output = self
            .tools
            .ffmpeg()
            .args(["-v", "error", "-nostdin", "-noautorotate"])
            .args(["-ss", &format!("{:.6}", time_secs.max(0.0))])
            .arg("-i")
            .arg(&self.path)
            .args(["-map", "0:v:0", "-frames:v", "1"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| CropperError::export(format!("Failed to start ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(CropperError::invalid_source(
                &self.path,
                format!(
                    "could not decode frame at {time_secs:.3}s: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Frame::from_raw(self.info.width, self.info.height, RGB_CHANNELS, output.stdout).map_err(
            |e| CropperError::invalid_source(&self.path, format!("frame at {time_secs:.3}s: {e}")),
        )
    }

    /// Start decoding every frame, resampled to `fps` when given.
    pub fn frames(&self, fps: Option<u32>) -> CropperResult<FrameStream> {
        let mut cmd = self.tools.ffmpeg();
        cmd.args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
            .arg(&self.path)
            .args(["-map", "0:v:0", "-an", "-sn"]);
        if let Some(fps) = fps {
            cmd.args(["-r", &fps.to_string()]);
        }
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(cmd = ?cmd, "Starting decoder");
        let mut child = cmd
            .spawn()
            .map_err(|e| CropperError::export(format!("Failed to start ffmpeg decoder: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CropperError::export("Failed to capture decoder stdout"))?;
        let stderr_task = child.stderr.take().map(drain_stderr);

        Ok(FrameStream {
            child,
            stdout: Some(BufReader::new(stdout)),
            stderr_task,
            size: self.size(),
            frames_read: 0,
            finished: false,
        })
    }
}

/// Lazy iterator over decoded frames backed by an ffmpeg process.
///
/// Dropping the stream before it is exhausted kills the decoder.
pub struct FrameStream {
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<String>>,
    size: FrameSize,
    frames_read: u64,
    finished: bool,
}

impl FrameStream {
    fn finish_decoder(&mut self) -> CropperResult<()> {
        self.finished = true;
        self.stdout = None;
        let status = self
            .child
            .wait()
            .map_err(|e| CropperError::export(format!("Failed to wait on ffmpeg decoder: {e}")))?;
        let stderr = join_stderr(self.stderr_task.take());

        if !status.success() {
            return Err(CropperError::export(format!(
                "ffmpeg decode failed (status {}): {}",
                status,
                stderr.trim()
            )));
        }
        tracing::debug!(frames = self.frames_read, "Decoder finished");
        Ok(())
    }
}

impl Iterator for FrameStream {
    type Item = CropperResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let stdout = self.stdout.as_mut()?;

        let len = frame_len(self.size.width, self.size.height, RGB_CHANNELS);
        let mut buf = vec![0u8; len];
        match read_full(stdout, &mut buf) {
            Ok(0) => self.finish_decoder().err().map(Err),
            Ok(n) if n == len => {
                self.frames_read += 1;
                Some(Frame::from_raw(
                    self.size.width,
                    self.size.height,
                    RGB_CHANNELS,
                    buf,
                ))
            }
            Ok(n) => {
                let _ = self.finish_decoder();
                Some(Err(CropperError::export(format!(
                    "Decoder produced a truncated frame ({n} of {len} bytes) after {} frames",
                    self.frames_read
                ))))
            }
            Err(e) => {
                let _ = self.child.kill();
                let _ = self.finish_decoder();
                Some(Err(CropperError::export(format!(
                    "Failed reading decoded frames: {e}"
                ))))
            }
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.child.kill() {
                tracing::debug!(error = %err, "Decoder already exited");
            }
        }
        let _ = self.child.wait();
    }
}

/// Fill `buf` unless the reader ends first; returns the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read a child's stderr on a separate thread so a full pipe never blocks it.
pub(crate) fn drain_stderr(stderr: std::process::ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || -> String {
        let mut reader = BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    })
}

pub(crate) fn join_stderr(task: Option<JoinHandle<String>>) -> String {
    task.map(|task| {
        task.join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
    })
    .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Extract [`VideoInfo`] from `ffprobe -print_format json` output.
fn parse_probe_output(path: &Path, json: &str) -> CropperResult<VideoInfo> {
    let probe: ProbeOutput = serde_json::from_str(json).map_err(|e| {
        CropperError::invalid_source(path, format!("unreadable ffprobe output: {e}"))
    })?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| CropperError::invalid_source(path, "no video stream found"))?;

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(CropperError::invalid_source(
                path,
                "video stream has no frame dimensions",
            ))
        }
    };

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_rational))
        .ok_or_else(|| CropperError::invalid_source(path, "unknown frame rate"))?;

    let duration_secs = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .or(video.duration.as_deref())
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| CropperError::invalid_source(path, "unknown duration"))?;

    Ok(VideoInfo {
        width,
        height,
        fps,
        duration_secs,
        has_audio,
    })
}

/// Parse `num/den` (or a plain number) into a positive rate.
fn parse_rational(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}
