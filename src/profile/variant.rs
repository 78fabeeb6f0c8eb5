use std::fmt;

/// How the season label is produced for a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeasonTitleMode {
    /// Show-configured season titles.
    Custom,
    /// `"Season {N}"` / `"Specials"`.
    Generic,
    /// No season label at all.
    Hidden,
}

/// Which font a card is rendered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FontMode {
    /// The show's own font override.
    Custom,
    /// The library-wide default font.
    Generic,
}

/// Capability flags of a show, fixed once its configuration is loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProfileFlags {
    /// The show declares its own season titles.
    pub has_custom_season_titles: bool,
    /// The show declares its own font.
    pub has_custom_font: bool,
    /// The show hides season titles.
    pub hides_season_titles: bool,
}

/// One (season-title mode, font mode) combination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileVariant {
    /// Season label behavior.
    pub season: SeasonTitleMode,
    /// Font behavior.
    pub font: FontMode,
}

impl ProfileVariant {
    /// Build a variant from its two axes.
    pub const fn new(season: SeasonTitleMode, font: FontMode) -> Self {
        Self { season, font }
    }

    /// Canonical archive directory label.
    pub fn label(self) -> &'static str {
        use FontMode as F;
        use SeasonTitleMode as S;
        match (self.season, self.font) {
            (S::Custom, F::Custom) => "Custom Season Titles, Custom Font",
            (S::Custom, F::Generic) => "Custom Season Titles, Generic Font",
            (S::Generic, F::Custom) => "Generic Season Titles, Custom Font",
            (S::Generic, F::Generic) => "Generic Season Titles, Generic Font",
            (S::Hidden, F::Custom) => "No Season Titles, Custom Font",
            (S::Hidden, F::Generic) => "No Season Titles, Generic Font",
        }
    }

    /// The variant used when a show is materialized outside archive mode.
    pub fn primary(flags: ProfileFlags) -> Self {
        let season = if flags.hides_season_titles {
            SeasonTitleMode::Hidden
        } else if flags.has_custom_season_titles {
            SeasonTitleMode::Custom
        } else {
            SeasonTitleMode::Generic
        };
        let font = if flags.has_custom_font {
            FontMode::Custom
        } else {
            FontMode::Generic
        };
        Self { season, font }
    }
}

impl fmt::Display for ProfileVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every variant a show with `flags` can be archived under.
///
/// The result is the cross product of the offered season axes (generic, plus custom and
/// hidden when enabled) and font axes (generic, plus custom when enabled), in a stable
/// order with the primary-most combinations first. It always holds between 1 and 6
/// distinct variants.
pub fn enumerate(flags: ProfileFlags) -> Vec<ProfileVariant> {
    let mut seasons = Vec::with_capacity(3);
    if flags.has_custom_season_titles {
        seasons.push(SeasonTitleMode::Custom);
    }
    seasons.push(SeasonTitleMode::Generic);
    if flags.hides_season_titles {
        seasons.push(SeasonTitleMode::Hidden);
    }

    let mut fonts = Vec::with_capacity(2);
    if flags.has_custom_font {
        fonts.push(FontMode::Custom);
    }
    fonts.push(FontMode::Generic);

    let mut out = Vec::with_capacity(seasons.len() * fonts.len());
    for &season in &seasons {
        for &font in &fonts {
            out.push(ProfileVariant { season, font });
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/profile/variant.rs"]
mod tests;
