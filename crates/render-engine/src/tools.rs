//! Locating and invoking the ffmpeg binaries.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use vidcrop_common::config::ToolPaths;
use vidcrop_common::error::{CropperError, CropperResult};

/// The ffmpeg and ffprobe executables used by the engine.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self::from_config(&ToolPaths::default())
    }
}

impl FfmpegTools {
    pub fn from_config(paths: &ToolPaths) -> Self {
        Self {
            ffmpeg: paths.ffmpeg.clone(),
            ffprobe: paths.ffprobe.clone(),
        }
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe
    }

    /// A bare `ffmpeg` command.
    pub fn ffmpeg(&self) -> Command {
        Command::new(&self.ffmpeg)
    }

    /// A bare `ffprobe` command.
    pub fn ffprobe(&self) -> Command {
        Command::new(&self.ffprobe)
    }

    /// Whether both binaries can be executed.
    pub fn is_available(&self) -> bool {
        binary_runs(&self.ffmpeg) && binary_runs(&self.ffprobe)
    }

    /// Fail with an actionable message when a binary is missing.
    pub fn ensure_available(&self) -> CropperResult<()> {
        for binary in [&self.ffmpeg, &self.ffprobe] {
            if !binary_runs(binary) {
                return Err(CropperError::unsupported(format!(
                    "{} could not be executed; install ffmpeg or pass its location",
                    binary.display()
                )));
            }
        }
        Ok(())
    }
}

fn binary_runs(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_reported() {
        let tools = FfmpegTools::from_config(&ToolPaths {
            ffmpeg: PathBuf::from("/nonexistent/vidcrop-ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/vidcrop-ffprobe"),
        });
        assert!(!tools.is_available());
        let err = tools.ensure_available().unwrap_err();
        assert!(matches!(err, CropperError::Unsupported { .. }));
        assert!(err.to_string().contains("vidcrop-ffmpeg"));
    }
}
