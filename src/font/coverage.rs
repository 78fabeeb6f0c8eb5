use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context as _;

use crate::foundation::error::{CardError, CardResult};

/// Per-character result of a coverage lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphCoverage {
    /// The character can be drawn (or is whitespace).
    Renderable,
    /// The character has no entry in the font's character map.
    Unmapped,
    /// The character maps to a glyph with no outline.
    Blank,
}

impl GlyphCoverage {
    /// Returns `true` for [`GlyphCoverage::Renderable`].
    pub fn is_renderable(self) -> bool {
        self == Self::Renderable
    }
}

/// An opened font file used for coverage queries.
///
/// The raw bytes are validated once on open and re-borrowed by every query, so a single
/// resource can be shared across threads.
#[derive(Debug)]
pub struct FontResource {
    path: PathBuf,
    data: Vec<u8>,
}

impl FontResource {
    /// Read and validate a font file.
    pub fn open(path: impl AsRef<Path>) -> CardResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CardError::not_found(format!(
                "font file '{}'",
                path.display()
            )));
        }
        let data =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_bytes(path, data)
    }

    /// Validate in-memory font bytes. `path` is only used for reporting.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> CardResult<Self> {
        let path = path.into();
        if let Err(e) = ttf_parser::Face::parse(&data, 0) {
            return Err(CardError::config(format!(
                "'{}' is not a usable font: {e}",
                path.display()
            )));
        }
        Ok(Self { path, data })
    }

    /// Path the font was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Classify a single character.
    ///
    /// A character whose glyph id lies past the end of the glyph table is reported as
    /// renderable: only a glyph that exists and has no outline counts as blank.
    pub fn coverage(&self, ch: char) -> GlyphCoverage {
        if ch.is_whitespace() {
            return GlyphCoverage::Renderable;
        }
        match ttf_parser::Face::parse(&self.data, 0) {
            Ok(face) => coverage_in(&face, ch),
            Err(_) => GlyphCoverage::Unmapped,
        }
    }

    /// Returns `true` when every character of `text` can be drawn.
    pub fn is_renderable(&self, text: &str) -> bool {
        self.missing_characters(text).is_empty()
    }

    /// Characters of `text` this font cannot draw, deduplicated.
    pub fn missing_characters(&self, text: &str) -> BTreeSet<char> {
        let mut missing = BTreeSet::new();
        let Ok(face) = ttf_parser::Face::parse(&self.data, 0) else {
            missing.extend(text.chars().filter(|c| !c.is_whitespace()));
            return missing;
        };
        for ch in text.chars() {
            if ch.is_whitespace() || missing.contains(&ch) {
                continue;
            }
            if !coverage_in(&face, ch).is_renderable() {
                missing.insert(ch);
            }
        }
        missing
    }

    /// Fail with [`CardError::MissingGlyphs`] if any of `texts` cannot be drawn.
    pub fn ensure_renderable<'t>(&self, texts: impl IntoIterator<Item = &'t str>) -> CardResult<()> {
        let mut missing = BTreeSet::new();
        for text in texts {
            missing.extend(self.missing_characters(text));
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CardError::MissingGlyphs {
                font: self.path.clone(),
                missing,
            })
        }
    }
}

fn coverage_in(face: &ttf_parser::Face<'_>, ch: char) -> GlyphCoverage {
    let Some(glyph) = face.glyph_index(ch) else {
        return GlyphCoverage::Unmapped;
    };
    // Mapped but absent from the glyph table: lenient, treated as drawable.
    if glyph.0 >= face.number_of_glyphs() {
        return GlyphCoverage::Renderable;
    }
    match face.glyph_bounding_box(glyph) {
        Some(_) => GlyphCoverage::Renderable,
        None => GlyphCoverage::Blank,
    }
}

/// Returns `true` when `font` can draw every character of `text`.
pub fn is_renderable(font: &FontResource, text: &str) -> bool {
    font.is_renderable(text)
}

/// Characters of `text` that `font` cannot draw.
pub fn missing_characters(font: &FontResource, text: &str) -> BTreeSet<char> {
    font.missing_characters(text)
}

/// Opened fonts keyed by path, shared between shows and worker threads.
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: Mutex<HashMap<PathBuf, Arc<FontResource>>>,
}

impl FontCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached font for `path`, opening it on first use.
    pub fn get(&self, path: &Path) -> CardResult<Arc<FontResource>> {
        let mut fonts = self
            .fonts
            .lock()
            .map_err(|_| anyhow::anyhow!("font cache lock poisoned"))?;
        if let Some(font) = fonts.get(path) {
            return Ok(Arc::clone(font));
        }
        let font = Arc::new(FontResource::open(path)?);
        fonts.insert(path.to_path_buf(), Arc::clone(&font));
        Ok(font)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/font/coverage.rs"]
mod tests;
