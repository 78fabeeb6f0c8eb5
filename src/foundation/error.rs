use std::collections::BTreeSet;
use std::path::PathBuf;

/// Convenience result type used across cardwright.
pub type CardResult<T> = Result<T, CardError>;

/// Top-level error taxonomy used by maintenance APIs.
///
/// None of these abort a batch on their own: the maintainer logs them against the show or
/// card they came from and moves on.
#[derive(thiserror::Error, Debug)]
pub enum CardError {
    /// A backing resource, show, or source image does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The font cannot render some characters of the card text.
    #[error("font '{}' cannot render {}", font.display(), render_chars(missing))]
    MissingGlyphs {
        /// Font file that was checked.
        font: PathBuf,
        /// Characters with no usable glyph.
        missing: BTreeSet<char>,
    },

    /// The external rendering command failed, timed out, or could not be spawned.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid show or preference configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed episode data.
    #[error("data error: {0}")]
    Data(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CardError {
    /// Build a [`CardError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`CardError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CardError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CardError::Data`] value.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Returns `true` for [`CardError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error should stop a whole batch. Always `false`: failures are
    /// recorded against the show or card they came from.
    pub fn is_batch_fatal(&self) -> bool {
        match self {
            Self::NotFound(_)
            | Self::MissingGlyphs { .. }
            | Self::Render(_)
            | Self::Config(_)
            | Self::Data(_)
            | Self::Other(_) => false,
        }
    }
}

fn render_chars(chars: &BTreeSet<char>) -> String {
    let list: Vec<String> = chars.iter().map(|c| format!("{c:?}")).collect();
    list.join(", ")
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
