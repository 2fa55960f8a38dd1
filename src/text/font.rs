use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::foundation::error::ClipResult;

/// Raw font file bytes shared between renderers.
pub type FontBytes = Arc<Vec<u8>>;

/// Font face lookup for clip text.
///
/// Resolution order: an explicit font file (from configuration) always wins; otherwise the
/// style's family list is matched against the system font database, falling back to the generic
/// sans-serif family. Results are cached per family list.
pub struct FontBook {
    explicit: Option<FontBytes>,
    db: Option<usvg::fontdb::Database>,
    cache: Mutex<HashMap<String, Option<FontBytes>>>,
}

impl FontBook {
    /// A book that resolves nothing. Text is then measured approximately and not drawn.
    pub fn empty() -> Self {
        Self {
            explicit: None,
            db: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load a single font file used for every style.
    pub fn from_file(path: &Path) -> ClipResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file '{}'", path.display()))?;
        Ok(Self {
            explicit: Some(Arc::new(bytes)),
            db: None,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Scan installed system fonts.
    pub fn system() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system font database");
        Self {
            explicit: None,
            db: Some(db),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Explicit file when configured, system fonts otherwise.
    pub fn discover(font_path: Option<&Path>) -> ClipResult<Self> {
        match font_path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::system()),
        }
    }

    /// Resolve a CSS-like family list (`"Georgia, serif"`) to font bytes.
    pub fn resolve(&self, family_list: &str) -> Option<FontBytes> {
        if let Some(bytes) = &self.explicit {
            return Some(bytes.clone());
        }
        let db = self.db.as_ref()?;

        if let Ok(cache) = self.cache.lock()
            && let Some(hit) = cache.get(family_list)
        {
            return hit.clone();
        }

        let mut families: Vec<usvg::fontdb::Family<'_>> = family_list
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| match f.to_ascii_lowercase().as_str() {
                "serif" => usvg::fontdb::Family::Serif,
                "sans-serif" => usvg::fontdb::Family::SansSerif,
                "monospace" => usvg::fontdb::Family::Monospace,
                "cursive" => usvg::fontdb::Family::Cursive,
                "fantasy" => usvg::fontdb::Family::Fantasy,
                _ => usvg::fontdb::Family::Name(f),
            })
            .collect();
        families.push(usvg::fontdb::Family::SansSerif);

        let query = usvg::fontdb::Query {
            families: &families,
            ..Default::default()
        };
        let found = db
            .query(&query)
            .and_then(|id| db.with_face_data(id, |data, _index| Arc::new(data.to_vec())));

        if found.is_none() {
            tracing::warn!(family_list, "no font face matched; text will not be drawn");
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(family_list.to_string(), found.clone());
        }
        found
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("explicit", &self.explicit.as_ref().map(|b| b.len()))
            .field("system_faces", &self.db.as_ref().map(|db| db.len()))
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/font.rs"]
mod tests;
