//! Application configuration.
//!
//! Settings are assembled from defaults and command-line overrides at
//! start-up. Nothing here is written back to disk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// External tool locations.
    pub tools: ToolPaths,

    /// Region selection behaviour.
    pub selection: SelectionConfig,

    /// Export defaults and validation rules.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Paths of the ffmpeg binaries used for decoding, encoding and probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPaths {
    /// ffmpeg executable (looked up in `PATH` when bare).
    pub ffmpeg: PathBuf,

    /// ffprobe executable (looked up in `PATH` when bare).
    pub ffprobe: PathBuf,
}

/// Region selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Distance in pixels within which a corner snaps to the frame edge.
    pub snap_margin: u32,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    /// Accepted output file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,

    /// Codec selected when the window opens.
    pub default_codec: String,

    /// Initial contents of the fps field.
    pub default_fps_text: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "vidcrop=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { snap_margin: 6 }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["mp4".to_string(), "avi".to_string()],
            default_codec: "libx264".to_string(),
            default_fps_text: "-1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ExportDefaults {
    /// Human readable list of accepted extensions, e.g. `.mp4 or .avi`.
    pub fn allowed_extensions_label(&self) -> String {
        let dotted: Vec<String> = self
            .allowed_extensions
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect();
        match dotted.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        }
    }
}
