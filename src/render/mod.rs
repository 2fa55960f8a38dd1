//! Frame rendering.

/// Frame output types.
pub mod backend;
/// CPU renderer and pure per-frame planning.
pub mod cpu;
/// Still-image fallback.
pub mod placeholder;
