//! VidCrop: pick a region of a video by clicking two corners and export
//! that region as a new, audio-free video.
//!
//! Usage:
//!   vidcrop [VIDEO] [--verbose] [--json-logs] [--ffmpeg PATH] [--ffprobe PATH]

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use vidcrop_common::config::AppConfig;

mod app;
mod frame_view;

use app::VidCropApp;

#[derive(Parser, Debug)]
#[command(
    name = "vidcrop",
    about = "Crop a video to a selected region of interest",
    version,
    author
)]
struct Cli {
    /// Video to open at start-up
    video: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// ffmpeg executable used for decoding and encoding
    #[arg(long, value_name = "PATH")]
    ffmpeg: Option<PathBuf>,

    /// ffprobe executable used to read video properties
    #[arg(long, value_name = "PATH")]
    ffprobe: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of the defaults.
    fn into_config(self) -> (AppConfig, Option<PathBuf>) {
        let mut config = AppConfig::default();
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        config.logging.json = self.json_logs;
        if let Some(ffmpeg) = self.ffmpeg {
            config.tools.ffmpeg = ffmpeg;
        }
        if let Some(ffprobe) = self.ffprobe {
            config.tools.ffprobe = ffprobe;
        }
        (config, self.video)
    }
}

fn main() -> anyhow::Result<()> {
    let (config, video) = Cli::parse().into_config();
    vidcrop_common::logging::init_logging(&config.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting VidCrop");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("VidCrop")
            .with_inner_size([960.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        "VidCrop",
        options,
        Box::new(move |cc| Box::new(VidCropApp::new(cc, config, video))),
    )
    .map_err(|e| anyhow::anyhow!("window launch failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_arguments() {
        let (config, video) = Cli::try_parse_from(["vidcrop"]).unwrap().into_config();
        assert!(video.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "vidcrop",
            "clip.mp4",
            "--verbose",
            "--json-logs",
            "--ffmpeg",
            "/opt/ffmpeg/bin/ffmpeg",
            "--ffprobe",
            "/opt/ffmpeg/bin/ffprobe",
        ])
        .unwrap();
        let (config, video) = cli.into_config();
        assert_eq!(video, Some(PathBuf::from("clip.mp4")));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.tools.ffprobe, PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
    }
}
