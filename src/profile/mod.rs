//! Profile variants: which season-title and font behavior a card tree is produced with.

/// Variant enumeration and directory labels.
pub mod variant;
