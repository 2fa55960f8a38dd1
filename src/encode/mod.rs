//! Capture backends.
//!
//! Recorders consume rendered frames in timeline order and produce one encoded blob.

use crate::foundation::error::ClipResult;

/// `ffmpeg`-based recorder (fragmented MP4 via system `ffmpeg`).
pub mod ffmpeg;
/// Pure-Rust animated GIF recorder.
pub mod gif;
/// Recorder trait and built-in in-memory recorder.
pub mod sink;

use sink::{Recorder, RecorderFactory};

/// Which recorder a capture session uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderKind {
    /// MP4 through the system `ffmpeg`; unsupported when `ffmpeg` is missing.
    #[default]
    Ffmpeg,
    /// Animated GIF, always available.
    Gif,
}

impl std::str::FromStr for RecorderKind {
    type Err = crate::foundation::error::ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ffmpeg" | "mp4" => Ok(Self::Ffmpeg),
            "gif" => Ok(Self::Gif),
            other => Err(crate::foundation::error::ClipError::validation(format!(
                "unknown capture backend '{other}' (expected ffmpeg or gif)"
            ))),
        }
    }
}

impl RecorderFactory for RecorderKind {
    fn open(&self) -> ClipResult<Box<dyn Recorder>> {
        Ok(match self {
            Self::Ffmpeg => Box::new(ffmpeg::FfmpegRecorder::new()),
            Self::Gif => Box::new(gif::GifRecorder::new()),
        })
    }
}
