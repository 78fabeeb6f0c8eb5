use std::path::Path;

use crate::config::font::CardFont;
use crate::exec::runner::CommandLine;

/// Fully resolved text of one card.
#[derive(Clone, Debug, PartialEq)]
pub struct CardText {
    /// Title lines, top first, already formatted.
    pub lines: Vec<String>,
    /// Season label, `None` when hidden.
    pub season_label: Option<String>,
    /// Font the card is drawn with.
    pub font: CardFont,
}

impl CardText {
    /// Every piece of text that ends up on the card.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(String::as_str)
            .chain(self.season_label.as_deref())
    }
}

/// A visual card style: turns card text into one external render command.
pub trait CardStyle: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Command that renders `text` over `source` into `destination`.
    fn command(&self, text: &CardText, source: &Path, destination: &Path) -> CommandLine;
}

/// Output canvas width in pixels.
pub const CARD_WIDTH: u32 = 3200;
/// Output canvas height in pixels.
pub const CARD_HEIGHT: u32 = 1800;

const TITLE_POINT_SIZE: f32 = 157.41;
const SEASON_POINT_SIZE: f32 = 67.75;
const TITLE_BOTTOM_OFFSET: f32 = 100.0;
const SEASON_GAP: f32 = 40.0;
const INTERLINE_SPACING: i32 = -22;

/// Bottom-centered title with an optional season label above it, drawn with ImageMagick.
#[derive(Clone, Debug)]
pub struct StandardStyle {
    program: String,
}

impl StandardStyle {
    /// Style that invokes `program` (`convert` or `magick`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for StandardStyle {
    fn default() -> Self {
        Self::new("convert")
    }
}

impl CardStyle for StandardStyle {
    fn name(&self) -> &str {
        "standard"
    }

    fn command(&self, text: &CardText, source: &Path, destination: &Path) -> CommandLine {
        let title_pt = TITLE_POINT_SIZE * text.font.size;
        let season_pt = SEASON_POINT_SIZE * text.font.size;
        let line_count = text.lines.len().max(1) as f32;

        let mut cmd = CommandLine::new(&self.program)
            .arg(source)
            .args([
                "-resize".to_string(),
                format!("{CARD_WIDTH}x{CARD_HEIGHT}^"),
                "-gravity".to_string(),
                "center".to_string(),
                "-extent".to_string(),
                format!("{CARD_WIDTH}x{CARD_HEIGHT}"),
                "-gravity".to_string(),
                "south".to_string(),
            ]);
        if let Some(file) = &text.font.file {
            cmd = cmd.arg("-font").arg(file);
        }
        cmd = cmd.args([
            "-fill".to_string(),
            text.font.color.clone(),
            "-pointsize".to_string(),
            format!("{title_pt:.2}"),
            "-interline-spacing".to_string(),
            INTERLINE_SPACING.to_string(),
            "-annotate".to_string(),
            format!("+0+{TITLE_BOTTOM_OFFSET:.0}"),
            text.lines.join("\n"),
        ]);

        if let Some(label) = &text.season_label {
            let season_y = TITLE_BOTTOM_OFFSET + line_count * title_pt + SEASON_GAP;
            cmd = cmd.args([
                "-pointsize".to_string(),
                format!("{season_pt:.2}"),
                "-annotate".to_string(),
                format!("+0+{season_y:.0}"),
                label.clone(),
            ]);
        }

        cmd.arg(destination)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/card/style.rs"]
mod tests;
