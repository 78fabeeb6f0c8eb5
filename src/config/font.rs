use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{CardError, CardResult};

/// Default title text color.
pub const DEFAULT_COLOR: &str = "#EBEBEB";

/// Letter case applied to card text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextCase {
    /// ALL CAPS.
    #[default]
    Upper,
    /// all lowercase.
    Lower,
    /// Text as stored.
    Source,
    /// Capitalize The First Letter Of Each Word.
    Title,
}

impl TextCase {
    /// Apply this case to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Upper => text.to_uppercase(),
            Self::Lower => text.to_lowercase(),
            Self::Source => text.to_string(),
            Self::Title => title_case(text),
        }
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if at_word_start && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
            if ch.is_whitespace() {
                at_word_start = true;
            } else if ch.is_alphabetic() {
                at_word_start = false;
            }
        }
    }
    out
}

/// Font fields as written in the configuration file. Unset fields inherit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontOverride {
    /// Font file.
    pub file: Option<PathBuf>,
    /// Size scale factor.
    pub size: Option<f32>,
    /// ImageMagick color.
    pub color: Option<String>,
    /// Letter case.
    pub case: Option<TextCase>,
    /// Substring replacements applied before casing.
    pub replacements: BTreeMap<String, String>,
}

/// Fully resolved font settings for one card.
#[derive(Clone, Debug, PartialEq)]
pub struct CardFont {
    /// Font file; `None` lets the renderer pick its default.
    pub file: Option<PathBuf>,
    /// Size scale factor, 1.0 is the style's base size.
    pub size: f32,
    /// ImageMagick color.
    pub color: String,
    /// Letter case.
    pub case: TextCase,
    /// Substring replacements applied before casing.
    pub replacements: BTreeMap<String, String>,
}

impl Default for CardFont {
    fn default() -> Self {
        Self {
            file: None,
            size: 1.0,
            color: DEFAULT_COLOR.to_string(),
            case: TextCase::Upper,
            replacements: BTreeMap::new(),
        }
    }
}

impl CardFont {
    /// `self` with every field set in `o` taken from `o`.
    ///
    /// Replacement maps are merged, with `o` winning on conflicting keys.
    pub fn merged(&self, o: &FontOverride) -> Self {
        let mut replacements = self.replacements.clone();
        replacements.extend(o.replacements.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            file: o.file.clone().or_else(|| self.file.clone()),
            size: o.size.unwrap_or(self.size),
            color: o.color.clone().unwrap_or_else(|| self.color.clone()),
            case: o.case.unwrap_or(self.case),
            replacements,
        }
    }

    /// Reject sizes and colors no renderer can use.
    pub fn validate(&self) -> CardResult<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(CardError::config(format!(
                "font size must be finite and > 0, got {}",
                self.size
            )));
        }
        if self.color.trim().is_empty() {
            return Err(CardError::config("font color must be non-empty"));
        }
        if self.replacements.keys().any(String::is_empty) {
            return Err(CardError::config("font replacement keys must be non-empty"));
        }
        Ok(())
    }

    /// Apply replacements, then casing.
    pub fn format_text(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (from, to) in &self.replacements {
            out = out.replace(from.as_str(), to);
        }
        self.case.apply(&out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/font.rs"]
mod tests;
