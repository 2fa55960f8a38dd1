//! Capture pipeline: drives a frame source into a [`Recorder`] session and yields one asset.

use std::time::{Duration, Instant};

use crate::asset::{RenderedAsset, asset_filename};
use crate::encode::sink::{Recorder, RecorderConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8};
use crate::foundation::error::{ClipError, ClipResult};
use crate::render::backend::FrameRGBA;

/// Default wall-clock ceiling for one capture, regardless of the requested duration.
pub const DEFAULT_SAFETY_CAP: Duration = Duration::from_secs(30);

/// Records frames from a caller-supplied source with a hard wall-clock cap.
#[derive(Clone, Copy, Debug)]
pub struct CapturePipeline {
    pub canvas: Canvas,
    pub fps: Fps,
    /// Hard wall-clock limit; reaching it truncates the clip instead of failing.
    pub safety_cap: Duration,
    /// Color used to flatten translucent pixels.
    pub background: Rgba8,
}

impl CapturePipeline {
    pub fn new(canvas: Canvas, fps: Fps) -> Self {
        Self {
            canvas,
            fps,
            safety_cap: DEFAULT_SAFETY_CAP,
            background: Rgba8::BLACK,
        }
    }

    pub fn with_safety_cap(mut self, cap: Duration) -> Self {
        self.safety_cap = cap;
        self
    }

    pub fn with_background(mut self, bg: Rgba8) -> Self {
        self.background = bg;
        self
    }

    /// Frames needed for `duration_secs` at this pipeline's fps (at least one).
    pub fn frame_budget(&self, duration_secs: f64) -> u64 {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return 1;
        }
        self.fps.secs_to_frames_floor(duration_secs).max(1)
    }

    /// Record `frame_budget(duration_secs)` frames produced by `frame_fn`.
    ///
    /// Stops early (and flags the asset as truncated) once `safety_cap` has elapsed. The
    /// recorder session is released on every exit path, including errors from `frame_fn`.
    /// Fails with `EnvironmentUnsupported` when the recorder cannot run on this host.
    #[tracing::instrument(level = "debug", skip(self, recorder, frame_fn))]
    pub fn capture(
        &self,
        recorder: &mut dyn Recorder,
        frame_fn: &mut dyn FnMut(FrameIndex) -> ClipResult<FrameRGBA>,
        duration_secs: f64,
        title: &str,
    ) -> ClipResult<RenderedAsset> {
        self.canvas.validate()?;
        let budget = self.frame_budget(duration_secs);

        let mut session = CaptureSession::open(
            recorder,
            RecorderConfig {
                width: self.canvas.width,
                height: self.canvas.height,
                fps: self.fps,
                background: self.background,
            },
        )?;

        let started = Instant::now();
        let mut captured = 0u64;
        let mut truncated = false;
        for i in 0..budget {
            if started.elapsed() >= self.safety_cap {
                truncated = true;
                break;
            }
            let idx = FrameIndex(i);
            let frame = frame_fn(idx)?;
            session.push(idx, &frame)?;
            captured += 1;
        }

        if captured == 0 {
            return Err(ClipError::capture("safety cap elapsed before the first frame"));
        }
        if truncated {
            tracing::info!(
                captured,
                budget,
                cap_secs = self.safety_cap.as_secs_f64(),
                "capture reached the safety cap; clip truncated"
            );
        }

        let clip = session.finish()?;
        tracing::debug!(
            bytes = clip.bytes.len(),
            mime = clip.mime,
            captured,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "capture finished"
        );
        Ok(RenderedAsset {
            filename: asset_filename(title, chrono::Utc::now().timestamp_millis(), clip.extension),
            mime: clip.mime.to_string(),
            bytes: clip.bytes,
            frames_captured: captured,
            truncated,
        })
    }
}

/// Scoped recorder session: aborted on drop unless finished.
struct CaptureSession<'a> {
    recorder: &'a mut dyn Recorder,
    open: bool,
}

impl<'a> CaptureSession<'a> {
    fn open(recorder: &'a mut dyn Recorder, cfg: RecorderConfig) -> ClipResult<Self> {
        if let Err(e) = recorder.begin(cfg) {
            recorder.abort();
            return Err(e);
        }
        Ok(Self {
            recorder,
            open: true,
        })
    }

    fn push(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ClipResult<()> {
        self.recorder.push_frame(idx, frame)
    }

    fn finish(mut self) -> ClipResult<crate::encode::sink::EncodedClip> {
        self.open = false;
        let out = self.recorder.finish();
        if out.is_err() {
            self.recorder.abort();
        }
        out
    }
}

impl Drop for CaptureSession<'_> {
    fn drop(&mut self) {
        if self.open {
            tracing::debug!("capture session dropped before finish; aborting recorder");
            self.recorder.abort();
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/capture.rs"]
mod tests;
