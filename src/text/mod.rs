//! Text measurement, wrapping and shaping.

pub(crate) mod font;
pub(crate) mod layout;
pub(crate) mod measure;
pub(crate) mod wrap;
