//! Export settings: codec, frame rate and output path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vidcrop_common::config::ExportDefaults;
use vidcrop_common::error::{CropperError, CropperResult};

/// Value typed into the fps field to keep the source frame rate.
pub const SOURCE_RATE_SENTINEL: i64 = -1;

/// Output video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Libx264,
    Mpeg4,
    Png,
    Rawvideo,
}

impl Codec {
    /// Every selectable codec, in display order.
    pub const ALL: [Codec; 4] = [Codec::Libx264, Codec::Mpeg4, Codec::Png, Codec::Rawvideo];

    /// Encoder name as understood by ffmpeg's `-c:v`.
    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Libx264 => "libx264",
            Codec::Mpeg4 => "mpeg4",
            Codec::Png => "png",
            Codec::Rawvideo => "rawvideo",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Codec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Codec::ALL
            .into_iter()
            .find(|codec| codec.as_str() == s)
            .ok_or_else(|| format!("Unknown codec: {s}. Use: libx264, mpeg4, png, rawvideo"))
    }
}

/// Requested output frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameRate {
    /// Keep the rate of the source video.
    Source,
    /// Resample to a fixed number of frames per second.
    Fixed(u32),
}

/// Why the fps field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FpsParseError {
    #[error("fps must be an integer, got {0:?}")]
    NotAnInteger(String),

    #[error("fps must be positive or -1 for the source rate, got {0}")]
    OutOfRange(i64),
}

impl FrameRate {
    /// Parse the fps field. `-1` selects the source rate.
    pub fn parse(text: &str) -> Result<Self, FpsParseError> {
        let value: i64 = text
            .trim()
            .parse()
            .map_err(|_| FpsParseError::NotAnInteger(text.to_string()))?;

        if value == SOURCE_RATE_SENTINEL {
            return Ok(FrameRate::Source);
        }
        match u32::try_from(value) {
            Ok(fps) if fps > 0 => Ok(FrameRate::Fixed(fps)),
            _ => Err(FpsParseError::OutOfRange(value)),
        }
    }

    /// Rate to pass downstream; `None` means "use the source rate".
    pub fn as_option(self) -> Option<u32> {
        match self {
            FrameRate::Source => None,
            FrameRate::Fixed(fps) => Some(fps),
        }
    }

    /// Rate the output will actually have for a source at `source_fps`.
    pub fn effective(self, source_fps: f64) -> f64 {
        match self {
            FrameRate::Source => source_fps,
            FrameRate::Fixed(fps) => f64::from(fps),
        }
    }
}

/// Check that `path` carries one of the allowed extensions
/// (case-insensitive).
pub fn validate_save_path(path: &Path, allowed: &[String]) -> CropperResult<()> {
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            allowed
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);

    if accepted {
        Ok(())
    } else {
        let defaults = ExportDefaults {
            allowed_extensions: allowed.to_vec(),
            ..ExportDefaults::default()
        };
        Err(CropperError::InvalidSavePath {
            path: path.to_path_buf(),
            allowed: defaults.allowed_extensions_label(),
        })
    }
}

/// Export choices made in the window.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    save_path: Option<PathBuf>,
    allowed_extensions: Vec<String>,
    /// Raw contents of the fps field, parsed at render time.
    pub fps_text: String,
    pub codec: Codec,
}

impl ExportSettings {
    pub fn new(defaults: &ExportDefaults) -> Self {
        Self {
            save_path: None,
            allowed_extensions: defaults.allowed_extensions.clone(),
            fps_text: defaults.default_fps_text.clone(),
            codec: defaults.default_codec.parse().unwrap_or_default(),
        }
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Store `path` verbatim if its extension is accepted. On rejection the
    /// previously stored path is left untouched.
    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) -> CropperResult<()> {
        let path = path.into();
        validate_save_path(&path, &self.allowed_extensions)?;
        tracing::info!(path = %path.display(), "Save path set");
        self.save_path = Some(path);
        Ok(())
    }

    pub fn frame_rate(&self) -> Result<FrameRate, FpsParseError> {
        FrameRate::parse(&self.fps_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ExportSettings {
        ExportSettings::new(&ExportDefaults::default())
    }

    #[test]
    fn test_fps_sentinel_means_source_rate() {
        assert_eq!(FrameRate::parse("-1"), Ok(FrameRate::Source));
        assert_eq!(FrameRate::parse("-1").unwrap().as_option(), None);
    }

    #[test]
    fn test_fps_integer() {
        assert_eq!(FrameRate::parse("24"), Ok(FrameRate::Fixed(24)));
        assert_eq!(FrameRate::parse(" 30 "), Ok(FrameRate::Fixed(30)));
        assert_eq!(FrameRate::parse("24").unwrap().as_option(), Some(24));
    }

    #[test]
    fn test_fps_rejects_non_integers() {
        for text in ["", "abc", "29.97", "30fps", "1e3"] {
            assert!(
                matches!(FrameRate::parse(text), Err(FpsParseError::NotAnInteger(_))),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_fps_rejects_zero_and_other_negatives() {
        assert_eq!(FrameRate::parse("0"), Err(FpsParseError::OutOfRange(0)));
        assert_eq!(FrameRate::parse("-5"), Err(FpsParseError::OutOfRange(-5)));
    }

    #[test]
    fn test_effective_rate() {
        assert!((FrameRate::Source.effective(29.97) - 29.97).abs() < 1e-9);
        assert!((FrameRate::Fixed(12).effective(29.97) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_codec_names() {
        let names: Vec<&str> = Codec::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["libx264", "mpeg4", "png", "rawvideo"]);
        assert_eq!(Codec::default(), Codec::Libx264);
        assert_eq!("png".parse::<Codec>(), Ok(Codec::Png));
        assert!("h265".parse::<Codec>().is_err());
    }

    #[test]
    fn test_codec_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Codec::Rawvideo).unwrap(), "\"rawvideo\"");
    }

    #[test]
    fn test_save_path_accepted_verbatim() {
        let mut s = settings();
        s.set_save_path("/tmp/Out.MP4").unwrap();
        assert_eq!(s.save_path(), Some(Path::new("/tmp/Out.MP4")));

        s.set_save_path("clip.avi").unwrap();
        assert_eq!(s.save_path(), Some(Path::new("clip.avi")));
    }

    #[test]
    fn test_bad_save_path_leaves_previous_value() {
        let mut s = settings();
        let err = s.set_save_path("out.mov").unwrap_err();
        assert!(matches!(err, CropperError::InvalidSavePath { .. }));
        assert_eq!(s.save_path(), None);

        s.set_save_path("good.mp4").unwrap();
        assert!(s.set_save_path("noextension").is_err());
        assert_eq!(s.save_path(), Some(Path::new("good.mp4")));
    }

    #[test]
    fn test_allow_list_is_configurable() {
        let allowed = vec!["mkv".to_string()];
        assert!(validate_save_path(Path::new("a.mkv"), &allowed).is_ok());
        let err = validate_save_path(Path::new("a.mp4"), &allowed).unwrap_err();
        assert!(err.to_string().contains(".mkv"));
    }

    #[test]
    fn test_settings_defaults() {
        let s = settings();
        assert_eq!(s.codec, Codec::Libx264);
        assert_eq!(s.frame_rate(), Ok(FrameRate::Source));
        assert_eq!(s.save_path(), None);
    }
}
