//! Error types shared across VidCrop crates.

use std::path::PathBuf;

/// Top-level error type for VidCrop operations.
///
/// The first four variants mirror what the user can get wrong in the
/// window; `Export` covers failures of the decode/encode processes after
/// the parameters were accepted.
#[derive(Debug, thiserror::Error)]
pub enum CropperError {
    #[error("Invalid source video {path}: {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    #[error("Invalid save path {path}: file should end with {allowed}")]
    InvalidSavePath { path: PathBuf, allowed: String },

    #[error("No save path chosen: pick an output file before rendering")]
    MissingSavePath,

    #[error("Invalid export parameters (fps: {fps}, roi: {roi}, codec: {codec}): {reason}")]
    InvalidExportParams {
        fps: String,
        roi: String,
        codec: String,
        reason: String,
    },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CropperError.
pub type CropperResult<T> = Result<T, CropperError>;

impl CropperError {
    pub fn invalid_source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidSource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Short title for the dialog that presents this error.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidSource { .. } => "Invalid Path",
            Self::InvalidSavePath { .. } | Self::MissingSavePath => "Invalid Save Path",
            Self::InvalidExportParams { .. } => "Invalid FPS or corners",
            Self::Export { .. } => "Export Failed",
            Self::Unsupported { .. } => "Missing Tool",
            Self::Io(_) | Self::Json(_) | Self::Other(_) => "Error",
        }
    }
}
