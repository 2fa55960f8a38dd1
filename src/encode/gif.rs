use std::io::Write;
use std::sync::{Arc, Mutex};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::encode::sink::{
    EncodedClip, Recorder, RecorderConfig, check_frame, flatten_premul_over_bg_to_opaque_rgba8,
};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ClipError, ClipResult};
use crate::render::backend::FrameRGBA;

pub const GIF_MIME: &str = "image/gif";

/// NeuQuant sampling factor: 1 is best quality, 30 is fastest.
const GIF_SPEED: i32 = 30;

/// Shared sink the encoder writes chunks into; the recorder keeps the other handle.
#[derive(Clone, Default)]
struct ChunkWriter(Arc<Mutex<Vec<u8>>>);

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut chunks = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("gif chunk buffer poisoned"))?;
        chunks.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Pure-Rust animated GIF recorder.
///
/// Needs no external tools, so it is always available; files are larger than MP4.
#[derive(Default)]
pub struct GifRecorder {
    encoder: Option<GifEncoder<ChunkWriter>>,
    chunks: ChunkWriter,
    cfg: Option<RecorderConfig>,
    last_idx: Option<FrameIndex>,
}

impl GifRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn release(&mut self) {
        drop(self.encoder.take());
        self.chunks = ChunkWriter::default();
        self.cfg = None;
        self.last_idx = None;
    }
}

impl Recorder for GifRecorder {
    fn begin(&mut self, cfg: RecorderConfig) -> ClipResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ClipError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 || cfg.width > 0xffff || cfg.height > 0xffff {
            return Err(ClipError::validation(
                "gif recorder width/height must be in 1..=65535",
            ));
        }
        if self.encoder.is_some() {
            return Err(ClipError::capture("gif recorder already started"));
        }

        self.chunks = ChunkWriter::default();
        let mut encoder = GifEncoder::new_with_speed(self.chunks.clone(), GIF_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| ClipError::capture(format!("gif setup failed: {e}")))?;

        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ClipResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| ClipError::capture("gif recorder not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ClipError::capture(
                "gif recorder received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);
        check_frame(&cfg, frame)?;

        let mut rgba = vec![0u8; frame.data.len()];
        if frame.premultiplied {
            let bg = cfg.background;
            flatten_premul_over_bg_to_opaque_rgba8(&mut rgba, &frame.data, [bg.r, bg.g, bg.b, 255])?;
        } else {
            rgba.copy_from_slice(&frame.data);
        }
        let buffer = RgbaImage::from_raw(frame.width, frame.height, rgba)
            .ok_or_else(|| ClipError::capture("gif frame buffer has the wrong length"))?;
        let delay = Delay::from_numer_denom_ms(1000 * cfg.fps.den, cfg.fps.num);

        let Some(encoder) = self.encoder.as_mut() else {
            return Err(ClipError::capture("gif recorder is already finalized"));
        };
        encoder
            .encode_frame(Frame::from_parts(buffer, 0, 0, delay))
            .map_err(|e| ClipError::capture(format!("gif frame encode failed: {e}")))
    }

    fn finish(&mut self) -> ClipResult<EncodedClip> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| ClipError::capture("gif recorder not started"))?;
        // Dropping the encoder writes the GIF trailer.
        drop(encoder);

        let bytes = {
            let mut chunks = self
                .chunks
                .0
                .lock()
                .map_err(|_| ClipError::capture("gif chunk buffer poisoned"))?;
            std::mem::take(&mut *chunks)
        };
        self.release();

        if bytes.is_empty() {
            return Err(ClipError::capture("gif recorder produced no output"));
        }
        Ok(EncodedClip {
            bytes,
            mime: GIF_MIME,
            extension: "gif",
        })
    }

    fn abort(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
