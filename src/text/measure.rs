use crate::foundation::error::{ClipError, ClipResult};
use crate::text::layout::{TextBrushRgba8, TextLayoutEngine};

/// Pixel-width measurement of a single line of text.
pub trait TextMeasure {
    /// Advance width of `text` in pixels when drawn on one line.
    fn measure(&mut self, text: &str) -> ClipResult<f32>;
}

/// Measurement with a constant advance per character.
///
/// Used when no font face could be resolved, and in tests where metrics must be exact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance {
    /// Advance per `char` in pixels.
    pub advance_px: f32,
}

impl FixedAdvance {
    /// Average glyph advance of a proportional sans face at `size_px`.
    pub fn approximate(size_px: f32) -> Self {
        Self {
            advance_px: size_px * 0.55,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&mut self, text: &str) -> ClipResult<f32> {
        if !self.advance_px.is_finite() || self.advance_px < 0.0 {
            return Err(ClipError::layout("fixed advance must be finite and >= 0"));
        }
        Ok(text.chars().count() as f32 * self.advance_px)
    }
}

/// Measurement through real font shaping.
pub(crate) struct ShapedMeasure<'a> {
    pub(crate) engine: &'a mut TextLayoutEngine,
    pub(crate) size_px: f32,
    pub(crate) weight: parley::style::FontWeight,
}

impl TextMeasure for ShapedMeasure<'_> {
    fn measure(&mut self, text: &str) -> ClipResult<f32> {
        Ok(self
            .engine
            .shape_line(text, self.size_px, self.weight, TextBrushRgba8::default())?
            .width)
    }
}

impl<F> TextMeasure for F
where
    F: FnMut(&str) -> ClipResult<f32>,
{
    fn measure(&mut self, text: &str) -> ClipResult<f32> {
        self(text)
    }
}
