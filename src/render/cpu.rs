use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Shape as _;

use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rgba8};
use crate::foundation::error::{ClipError, ClipResult};
use crate::foundation::math::{lerp_u8, saturate_scaled};
use crate::render::backend::FrameRGBA;
use crate::style::{AnimationKind, StyleConfig};
use crate::text::font::FontBytes;
use crate::text::layout::{ShapedLine, TextBrushRgba8, TextLayoutEngine};
use crate::text::measure::{FixedAdvance, ShapedMeasure};
use crate::text::wrap::wrap_lines;

/// Body text size in pixels.
pub const TEXT_SIZE_PX: f32 = 36.0;
pub(crate) const TEXT_WEIGHT: parley::style::FontWeight = parley::style::FontWeight::BOLD;
/// Distance between consecutive body baselines.
pub const LINE_HEIGHT_PX: f64 = 50.0;
/// Horizontal space reserved around the wrapped text block.
pub const WRAP_MARGIN_PX: f32 = 100.0;
/// Fraction of the clip during which intro animations play.
pub const INTRO_FRACTION: f64 = 0.2;

pub const WATERMARK_TEXT: &str = "ClipNova";
pub const WATERMARK_SIZE_PX: f32 = 16.0;
pub(crate) const WATERMARK_WEIGHT: parley::style::FontWeight = parley::style::FontWeight::NORMAL;
const WATERMARK_INSET_PX: f64 = 20.0;

pub const DECOR_CIRCLES: usize = 5;
pub const DECOR_OPACITY: f32 = 0.05;

pub const PROGRESS_BAR_HEIGHT_PX: f64 = 5.0;
const PROGRESS_TRACK_ALPHA: f32 = 0.3;
const PROGRESS_FILL_ALPHA: f32 = 0.8;

const SHAPE_CACHE_LIMIT: usize = 1024;
/// Outline width of synthesized bold, relative to the font size.
const FAUX_BOLD_STROKE: f32 = 0.035;

/// Placement of one body line for a given frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LinePlacement {
    /// Visible text (a prefix of the line for typewriter).
    pub text: String,
    /// Horizontal center of the line.
    pub anchor_x: f64,
    /// Baseline y.
    pub baseline_y: f64,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Uniform scale about `(anchor_x, baseline_y)`.
    pub scale: f64,
}

/// A decorative circle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecorCircle {
    pub center: Point,
    pub radius: f64,
}

/// Everything the rasterizer needs for one frame, computed without touching pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    /// `frame / total`.
    pub progress: f64,
    /// Intro animation progress, saturating at 1 after [`INTRO_FRACTION`] of the clip.
    pub intro: f64,
    pub lines: Vec<LinePlacement>,
    pub circles: [DecorCircle; DECOR_CIRCLES],
    /// Width of the filled part of the progress bar.
    pub bar_fill_width: f64,
}

/// Compute the layout and animation state of frame `frame` out of `total_frames`.
///
/// Pure in its inputs: decoration motion is driven by `frame / fps`, never by a clock.
pub fn plan_frame(
    canvas: Canvas,
    fps: Fps,
    frame: FrameIndex,
    total_frames: u64,
    style: &StyleConfig,
    lines: &[String],
) -> FramePlan {
    let w = canvas.width_f64();
    let h = canvas.height_f64();
    let total = total_frames.max(1) as f64;
    let f = frame.0 as f64;

    let progress = (f / total).clamp(0.0, 1.0);
    let intro = saturate_scaled(f / (total * INTRO_FRACTION), 1.0);

    let start_y = h / 2.0 - (lines.len() as f64 * LINE_HEIGHT_PX) / 2.0;
    let placements = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut p = LinePlacement {
                text: line.clone(),
                anchor_x: w / 2.0,
                baseline_y: start_y + i as f64 * LINE_HEIGHT_PX,
                alpha: 1.0,
                scale: 1.0,
            };
            match style.animation {
                AnimationKind::Fade => {
                    p.alpha = saturate_scaled(intro, 3.0) as f32;
                }
                AnimationKind::Slide => {
                    let offset = (1.0 - saturate_scaled(intro, 2.0)) * w;
                    p.anchor_x += if i % 2 == 0 { -offset } else { offset };
                }
                AnimationKind::Zoom => {
                    p.scale = 0.5 + saturate_scaled(intro, 2.0) * 0.5;
                }
                AnimationKind::Typewriter => {
                    let len = line.chars().count();
                    let visible = (len as f64 * saturate_scaled(intro, 3.0)).floor() as usize;
                    p.text = line.chars().take(visible).collect();
                }
            }
            p
        })
        .collect();

    let t = fps.frames_to_secs(frame.0);
    let circles = std::array::from_fn(|i| {
        let i = i as f64;
        DecorCircle {
            center: Point::new(
                (t * 0.5 + i).sin() * w * 0.4 + w * 0.5,
                (t * 0.3 + i * 2.0).cos() * h * 0.4 + h * 0.5,
            ),
            radius: 50.0 + (t + i).sin() * 20.0,
        }
    });

    FramePlan {
        progress,
        intro,
        lines: placements,
        circles,
        bar_fill_width: w * progress,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    start: [u8; 4],
    end: [u8; 4],
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    text: String,
    size_bits: u32,
    weight_bits: u32,
}

impl ShapeKey {
    fn new(text: &str, size_px: f32, weight: parley::style::FontWeight) -> Self {
        Self {
            text: text.to_string(),
            size_bits: size_px.to_bits(),
            weight_bits: weight.value().to_bits(),
        }
    }
}

/// CPU frame renderer powered by `vello_cpu`, with Parley for text shaping.
///
/// One renderer owns one canvas-sized render target; it is not shared between threads.
pub struct FrameRenderer {
    canvas: Canvas,
    fps: Fps,
    width_u16: u16,
    height_u16: u16,

    ctx: Option<vello_cpu::RenderContext>,
    pixmap: vello_cpu::Pixmap,

    text: Option<TextLayoutEngine>,
    shape_cache: HashMap<ShapeKey, ShapedLine>,
    gradient_cache: HashMap<GradientKey, vello_cpu::Image>,
}

impl FrameRenderer {
    /// Create a renderer for `canvas`. Without a font, text is wrapped approximately and not
    /// drawn; everything else renders normally.
    pub fn new(canvas: Canvas, fps: Fps, font: Option<FontBytes>) -> ClipResult<Self> {
        canvas.validate()?;
        Fps::new(fps.num, fps.den)?;
        let width_u16: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ClipError::validation("canvas width exceeds u16"))?;
        let height_u16: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ClipError::validation("canvas height exceeds u16"))?;

        let text = match font {
            Some(bytes) => match TextLayoutEngine::new(bytes) {
                Ok(engine) => {
                    tracing::debug!(family = engine.family_name(), "text engine ready");
                    Some(engine)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "font could not be registered; text disabled");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            canvas,
            fps,
            width_u16,
            height_u16,
            ctx: None,
            pixmap: vello_cpu::Pixmap::new(width_u16, height_u16),
            text,
            shape_cache: HashMap::new(),
            gradient_cache: HashMap::new(),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// `true` when a font face is available and text will be drawn.
    pub fn draws_text(&self) -> bool {
        self.text.is_some()
    }

    /// Wrap `text` into body lines for this canvas.
    ///
    /// Shaping failures fall back to approximate metrics instead of failing the render.
    pub fn wrap(&mut self, text: &str) -> ClipResult<Vec<String>> {
        let budget = (self.canvas.width as f32 - WRAP_MARGIN_PX).max(TEXT_SIZE_PX);
        if let Some(engine) = self.text.as_mut() {
            let mut measure = ShapedMeasure {
                engine,
                size_px: TEXT_SIZE_PX,
                weight: TEXT_WEIGHT,
            };
            match wrap_lines(text, budget, &mut measure) {
                Ok(lines) => return Ok(lines),
                Err(e) => {
                    tracing::warn!(error = %e, "shaped wrap failed; using approximate metrics");
                }
            }
        }
        wrap_lines(text, budget, &mut FixedAdvance::approximate(TEXT_SIZE_PX))
    }

    /// Render one frame.
    #[tracing::instrument(level = "trace", skip(self, style, lines))]
    pub fn render_frame(
        &mut self,
        frame: FrameIndex,
        total_frames: u64,
        style: &StyleConfig,
        lines: &[String],
    ) -> ClipResult<FrameRGBA> {
        let plan = plan_frame(self.canvas, self.fps, frame, total_frames, style, lines);
        self.ensure_shaped(&plan);
        let gradient = self.gradient_paint(style.gradient[0], style.gradient[1])?;

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == self.width_u16 && ctx.height() == self.height_u16 => ctx,
            _ => vello_cpu::RenderContext::new(self.width_u16, self.height_u16),
        };
        ctx.reset();
        self.draw(&mut ctx, &plan, style, gradient);
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn ensure_shaped(&mut self, plan: &FramePlan) {
        let Some(engine) = self.text.as_mut() else {
            return;
        };
        if self.shape_cache.len() > SHAPE_CACHE_LIMIT {
            self.shape_cache.clear();
        }

        let wanted = plan
            .lines
            .iter()
            .map(|p| (p.text.as_str(), TEXT_SIZE_PX, TEXT_WEIGHT))
            .chain(std::iter::once((
                WATERMARK_TEXT,
                WATERMARK_SIZE_PX,
                WATERMARK_WEIGHT,
            )));
        for (text, size_px, weight) in wanted {
            if text.is_empty() {
                continue;
            }
            let key = ShapeKey::new(text, size_px, weight);
            if self.shape_cache.contains_key(&key) {
                continue;
            }
            match engine.shape_line(text, size_px, weight, TextBrushRgba8::default()) {
                Ok(shaped) => {
                    self.shape_cache.insert(key, shaped);
                }
                Err(e) => {
                    tracing::warn!(error = %e, text, "line could not be shaped; skipping");
                }
            }
        }
    }

    fn shaped(
        &self,
        text: &str,
        size_px: f32,
        weight: parley::style::FontWeight,
    ) -> Option<&ShapedLine> {
        self.shape_cache.get(&ShapeKey::new(text, size_px, weight))
    }

    fn draw(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        plan: &FramePlan,
        style: &StyleConfig,
        gradient: vello_cpu::Image,
    ) {
        let w = self.canvas.width_f64();
        let h = self.canvas.height_f64();
        let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h);

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // background, gradient overlay
        ctx.set_paint(cpu_color(style.background));
        ctx.fill_rect(&full);
        ctx.set_paint(gradient);
        ctx.fill_rect(&full);

        // body text
        for line in &plan.lines {
            if line.alpha <= 0.0 || line.text.is_empty() {
                continue;
            }
            let Some(shaped) = self.shaped(&line.text, TEXT_SIZE_PX, TEXT_WEIGHT) else {
                continue;
            };
            let tr = Affine::translate((line.anchor_x, line.baseline_y))
                * Affine::scale(line.scale)
                * Affine::translate((
                    -f64::from(shaped.width) / 2.0,
                    -f64::from(shaped.baseline),
                ));
            self.draw_shaped(ctx, shaped, tr, style.text_color, line.alpha);
        }

        // decoration
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(cpu_color(style.text_color.with_alpha(DECOR_OPACITY)));
        for c in &plan.circles {
            let path = kurbo::Circle::new(c.center, c.radius.max(0.0)).to_path(0.1);
            ctx.fill_path(&bezpath_to_cpu(&path));
        }

        // watermark, right-aligned
        if let Some(shaped) = self.shaped(WATERMARK_TEXT, WATERMARK_SIZE_PX, WATERMARK_WEIGHT) {
            let tr = Affine::translate((
                w - WATERMARK_INSET_PX - f64::from(shaped.width),
                h - WATERMARK_INSET_PX - f64::from(shaped.baseline),
            ));
            self.draw_shaped(ctx, shaped, tr, Rgba8::rgba(255, 255, 255, 0.5), 1.0);
        }

        // progress bar
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(cpu_color(Rgba8::WHITE.with_alpha(PROGRESS_TRACK_ALPHA)));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            w,
            PROGRESS_BAR_HEIGHT_PX,
        ));
        if plan.bar_fill_width > 0.0 {
            ctx.set_paint(cpu_color(Rgba8::WHITE.with_alpha(PROGRESS_FILL_ALPHA)));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                plan.bar_fill_width,
                PROGRESS_BAR_HEIGHT_PX,
            ));
        }
    }

    fn draw_shaped(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        shaped: &ShapedLine,
        tr: Affine,
        color: Rgba8,
        opacity: f32,
    ) {
        let Some(engine) = self.text.as_ref() else {
            return;
        };
        ctx.set_transform(affine_to_cpu(tr));
        ctx.set_paint(cpu_color(color));
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = || {
                    run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    })
                };
                let font_size = run.run().font_size();
                ctx.glyph_run(engine.font())
                    .font_size(font_size)
                    .fill_glyphs(glyphs());
                // The face has no heavier weight: thicken the outlines instead.
                if run.run().synthesis().embolden() {
                    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(
                        font_size * FAUX_BOLD_STROKE,
                    )));
                    ctx.glyph_run(engine.font())
                        .font_size(font_size)
                        .stroke_glyphs(glyphs());
                }
            }
        }
        if opacity < 1.0 {
            ctx.pop_layer();
        }
    }

    fn gradient_paint(&mut self, start: Rgba8, end: Rgba8) -> ClipResult<vello_cpu::Image> {
        let key = GradientKey {
            start: start.premul(),
            end: end.premul(),
        };
        if let Some(img) = self.gradient_cache.get(&key).cloned() {
            return Ok(img);
        }
        let (w, h) = (self.canvas.width, self.canvas.height);
        let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
        let h1 = (h.max(1) - 1) as f32;
        for y in 0..h {
            let t = if h1 <= 0.0 { 0.0 } else { (y as f32) / h1 };
            let c = [
                lerp_u8(key.start[0], key.end[0], t),
                lerp_u8(key.start[1], key.end[1], t),
                lerp_u8(key.start[2], key.end[2], t),
                lerp_u8(key.start[3], key.end[3], t),
            ];
            let row = (y as usize) * (w as usize) * 4;
            for px in bytes[row..row + (w as usize) * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&c);
            }
        }
        let img = rgba_premul_to_image(&bytes, w, h)?;
        self.gradient_cache.insert(key, img.clone());
        Ok(img)
    }
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("canvas", &self.canvas)
            .field("fps", &self.fps)
            .field("draws_text", &self.text.is_some())
            .finish()
    }
}

fn cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ClipResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ClipError::validation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ClipError::validation("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(ClipError::validation("pixmap byte len mismatch"));
    }
    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(bytes.len() / 4);
    for px in bytes.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> ClipResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
