//! Still-image fallback used when a clip cannot be recorded.

use std::io::Cursor;

use crate::encode::sink::flatten_premul_over_bg_to_opaque_rgba8;
use crate::foundation::core::{Canvas, FrameIndex, Rgba8};
use crate::foundation::error::{ClipError, ClipResult};
use crate::render::backend::FrameRGBA;
use crate::render::cpu::FrameRenderer;
use crate::style::StyleConfig;

pub const PLACEHOLDER_MIME: &str = "image/png";
pub const PLACEHOLDER_EXT: &str = "png";

/// Encode a premultiplied frame as an opaque PNG, flattening over `bg`.
pub fn encode_png(frame: &FrameRGBA, bg: Rgba8) -> ClipResult<Vec<u8>> {
    let mut rgba = vec![0u8; frame.data.len()];
    if frame.premultiplied {
        flatten_premul_over_bg_to_opaque_rgba8(&mut rgba, &frame.data, [bg.r, bg.g, bg.b, 255])?;
    } else {
        rgba.copy_from_slice(&frame.data);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| ClipError::validation("frame byte length does not match its size"))?;

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| ClipError::capture(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

/// A PNG filled with one color.
pub fn solid_png(canvas: Canvas, color: Rgba8) -> ClipResult<Vec<u8>> {
    canvas.validate()?;
    let img = image::RgbaImage::from_pixel(
        canvas.width,
        canvas.height,
        image::Rgba([color.r, color.g, color.b, 255]),
    );
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| ClipError::capture(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

/// PNG of the fully animated final frame, or of the plain style background if rendering fails.
pub fn placeholder_png(
    renderer: &mut FrameRenderer,
    total_frames: u64,
    style: &StyleConfig,
    lines: &[String],
) -> ClipResult<Vec<u8>> {
    let last = FrameIndex(total_frames);
    match renderer
        .render_frame(last, total_frames, style, lines)
        .and_then(|frame| encode_png(&frame, style.background))
    {
        Ok(png) => Ok(png),
        Err(e) => {
            tracing::warn!(error = %e, "final frame unavailable; using solid placeholder");
            solid_png(renderer.canvas(), style.background)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/placeholder.rs"]
mod tests;
