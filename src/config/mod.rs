//! JSON configuration: library preferences, fonts, and per-show entries.

/// Font settings and text formatting.
pub mod font;
/// Preferences, show entries, and the configuration file.
pub mod settings;
