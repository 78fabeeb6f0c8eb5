//! Glyph-level font coverage checks.

/// Character coverage of a font against card text.
pub mod coverage;
