use std::path::Path;

use crate::foundation::core::{Fps, FrameIndex, Rgba8};
use crate::foundation::error::{ClipError, ClipResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`Recorder`] when a capture session opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Playback frames-per-second.
    pub fps: Fps,
    /// Background used to flatten any remaining alpha.
    pub background: Rgba8,
}

/// Encoded output of one finished session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedClip {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    /// File extension without the dot.
    pub extension: &'static str,
}

/// A recording session that consumes frames in timeline order and yields one encoded blob.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
/// Exactly one of `finish` or `abort` ends a session that `begin` opened; both must release
/// every process, thread and buffer the session holds.
pub trait Recorder: Send {
    /// Open a session.
    fn begin(&mut self, cfg: RecorderConfig) -> ClipResult<()>;
    /// Append one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ClipResult<()>;
    /// Close the session and return everything it encoded.
    fn finish(&mut self) -> ClipResult<EncodedClip>;
    /// Tear the session down, discarding output. Must be safe to call at any time.
    fn abort(&mut self);
}

/// Opens a fresh [`Recorder`] per capture.
pub trait RecorderFactory: Send + Sync {
    fn open(&self) -> ClipResult<Box<dyn Recorder>>;
}

impl<F> RecorderFactory for F
where
    F: Fn() -> ClipResult<Box<dyn Recorder>> + Send + Sync,
{
    fn open(&self) -> ClipResult<Box<dyn Recorder>> {
        self()
    }
}

/// In-memory recorder for tests and debugging: output is the raw RGBA frames back to back.
#[derive(Debug, Default)]
pub struct InMemoryRecorder {
    cfg: Option<RecorderConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    aborted: bool,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, cleared when the session ends.
    pub fn config(&self) -> Option<RecorderConfig> {
        self.cfg
    }

    /// Frames captured by the current or last session.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn was_aborted(&self) -> bool {
        self.aborted
    }
}

impl Recorder for InMemoryRecorder {
    fn begin(&mut self, cfg: RecorderConfig) -> ClipResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ClipResult<()> {
        if self.cfg.is_none() {
            return Err(ClipError::capture("in-memory recorder not started"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> ClipResult<EncodedClip> {
        self.cfg
            .take()
            .ok_or_else(|| ClipError::capture("in-memory recorder not started"))?;
        let bytes = self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect();
        Ok(EncodedClip {
            bytes,
            mime: "application/octet-stream",
            extension: "rgba",
        })
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.aborted = true;
    }
}

/// Composite premultiplied RGBA8 over an opaque background.
pub(crate) fn flatten_premul_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ClipResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ClipError::validation(
            "flatten_premul_over_bg_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (u16::from(s[0]) + mul_div255_u16(bg_r, inv)).min(255) as u8;
        d[1] = (u16::from(s[1]) + mul_div255_u16(bg_g, inv)).min(255) as u8;
        d[2] = (u16::from(s[2]) + mul_div255_u16(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

/// Check a frame against the session geometry.
pub(crate) fn check_frame(cfg: &RecorderConfig, frame: &FrameRGBA) -> ClipResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(ClipError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    let expected = (cfg.width as usize)
        .saturating_mul(cfg.height as usize)
        .saturating_mul(4);
    if frame.data.len() != expected {
        return Err(ClipError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ClipResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
