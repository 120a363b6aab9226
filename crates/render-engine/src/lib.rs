//! VidCrop Render Engine
//!
//! Opens source videos, crops every frame to the selected region and
//! re-encodes the result without audio. Decoding and encoding are handled
//! by ffmpeg child processes; frames travel between them as raw RGB24.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source.mp4 ── ffmpeg decode (-r fps) ──► FrameStream (one frame at a time)
//!                                               │
//!                                               ├── CropTransform (ROI)
//!                                               │
//!                                               ▼
//!                               FfmpegEncoder (-an -c:v codec) ──► output.mp4
//!                                               │
//!                                               └── ProgressReporter ──► UI
//! ```

pub mod export;
pub mod frame;
pub mod progress;
pub mod session;
pub mod tools;
pub mod transform;
pub mod video;

pub use export::{export_video, plan_export, ExportJob, ExportPlan};
pub use frame::Frame;
pub use progress::{channel_callback, PercentCallback, ProgressReporter, ProgressSink};
pub use session::Session;
pub use tools::FfmpegTools;
pub use video::{FrameStream, VideoHandle, VideoInfo};
