//! The caller-owned output of a render.

/// An encoded clip (or still placeholder) ready to be saved or uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedAsset {
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `video/mp4`.
    pub mime: String,
    /// Synthetic file name: sanitized title, timestamp suffix, container extension.
    pub filename: String,
    /// Number of frames that made it into the recording (1 for a still).
    pub frames_captured: u64,
    /// `true` when recording stopped at the wall-clock safety cap before the frame budget.
    pub truncated: bool,
}

impl RenderedAsset {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` for real recordings, `false` for still-image fallbacks.
    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }
}

/// Lowercase `title` and replace every character outside `[a-z0-9]` with `-`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// `<sanitized-title>-<unix-millis>.<ext>`.
pub fn asset_filename(title: &str, unix_millis: i64, ext: &str) -> String {
    format!("{}-{unix_millis}.{ext}", sanitize_title(title))
}

#[cfg(test)]
#[path = "../tests/unit/asset.rs"]
mod tests;
