//! Named visual styles for generated clips.
//!
//! A style token (as typed by a user or stored on a job) maps to a fixed [`StyleConfig`]. The
//! lookup is total: unknown or empty tokens resolve to [`StyleConfig::default_style`].

use crate::foundation::core::Rgba8;

/// How text lines enter the frame during the intro window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    /// Lines fade in.
    Fade,
    /// Lines slide in horizontally, alternating sides.
    Slide,
    /// Lines grow from half size.
    Zoom,
    /// Lines are revealed character by character.
    Typewriter,
}

/// Immutable visual configuration for one clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleConfig {
    /// Canonical style name.
    pub name: &'static str,
    /// Solid background fill.
    pub background: Rgba8,
    /// Top and bottom stops of the vertical gradient overlay.
    pub gradient: [Rgba8; 2],
    /// Text (and decoration) color.
    pub text_color: Rgba8,
    /// CSS-like font family list, most preferred first.
    pub font_family: &'static str,
    /// Intro animation.
    pub animation: AnimationKind,
}

impl StyleConfig {
    /// The fallback style used for unknown tokens.
    pub fn default_style() -> Self {
        StyleConfig {
            name: "default",
            background: Rgba8::opaque(0x00, 0x00, 0x00),
            gradient: [Rgba8::rgba(0, 0, 0, 0.8), Rgba8::rgba(20, 20, 20, 0.9)],
            text_color: Rgba8::WHITE,
            font_family: "Arial, sans-serif",
            animation: AnimationKind::Fade,
        }
    }

    /// Font families in preference order, with generic names last.
    pub fn font_families(&self) -> impl Iterator<Item = &'static str> {
        self.font_family
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self::default_style()
    }
}

/// Every named style in display order (excluding the fallback).
pub const STYLE_NAMES: [&str; 5] = ["trendy", "funny", "educational", "storytelling", "product"];

/// Resolve a style token into its configuration.
///
/// Tokens are trimmed and matched case-insensitively.
pub fn resolve_style(token: &str) -> StyleConfig {
    let key = token.trim().to_ascii_lowercase();
    match key.as_str() {
        "trendy" => StyleConfig {
            name: "trendy",
            background: Rgba8::opaque(0x34, 0x98, 0xdb),
            gradient: [Rgba8::rgba(52, 152, 219, 0.8), Rgba8::rgba(46, 204, 113, 0.9)],
            text_color: Rgba8::WHITE,
            font_family: "Arial, sans-serif",
            animation: AnimationKind::Fade,
        },
        "funny" => StyleConfig {
            name: "funny",
            background: Rgba8::opaque(0xf1, 0xc4, 0x0f),
            gradient: [Rgba8::rgba(241, 196, 15, 0.8), Rgba8::rgba(231, 76, 60, 0.9)],
            text_color: Rgba8::WHITE,
            font_family: "Impact, sans-serif",
            animation: AnimationKind::Slide,
        },
        "educational" => StyleConfig {
            name: "educational",
            background: Rgba8::opaque(0x9b, 0x59, 0xb6),
            gradient: [Rgba8::rgba(155, 89, 182, 0.8), Rgba8::rgba(52, 152, 219, 0.9)],
            text_color: Rgba8::WHITE,
            font_family: "Georgia, serif",
            animation: AnimationKind::Zoom,
        },
        "storytelling" => StyleConfig {
            name: "storytelling",
            background: Rgba8::opaque(0x2c, 0x3e, 0x50),
            gradient: [Rgba8::rgba(44, 62, 80, 0.8), Rgba8::rgba(142, 68, 173, 0.9)],
            text_color: Rgba8::WHITE,
            font_family: "Times New Roman, serif",
            animation: AnimationKind::Typewriter,
        },
        "product" => StyleConfig {
            name: "product",
            background: Rgba8::opaque(0x29, 0x80, 0xb9),
            gradient: [Rgba8::rgba(41, 128, 185, 0.8), Rgba8::rgba(39, 174, 96, 0.9)],
            text_color: Rgba8::WHITE,
            font_family: "Helvetica, sans-serif",
            animation: AnimationKind::Fade,
        },
        _ => StyleConfig::default_style(),
    }
}

#[cfg(test)]
#[path = "../tests/unit/style.rs"]
mod tests;
