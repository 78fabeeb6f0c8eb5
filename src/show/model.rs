use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::card::style::CardText;
use crate::config::font::CardFont;
use crate::config::settings::{Preferences, ShowConfig};
use crate::data::store::{EpisodeDataStore, EpisodeRecord};
use crate::foundation::error::{CardError, CardResult};
use crate::profile::variant::{FontMode, ProfileFlags, ProfileVariant, SeasonTitleMode};

/// Data file name used when a show does not name one.
pub const DEFAULT_DATA_FILE: &str = "data.tsv";

/// A configured show bound to one profile variant and one output tree.
///
/// Starts unloaded; [`Show::load`] reads its episode data.
#[derive(Clone, Debug)]
pub struct Show {
    config: Arc<ShowConfig>,
    full_name: String,
    source_dir: PathBuf,
    store: EpisodeDataStore,
    flags: ProfileFlags,
    variant: ProfileVariant,
    media_root: PathBuf,
    generic_font: CardFont,
    custom_font: CardFont,
    episodes: Option<Arc<Vec<EpisodeRecord>>>,
}

impl Show {
    /// Bind a show entry to the library preferences, using its primary variant.
    pub fn new(config: ShowConfig, prefs: &Preferences) -> CardResult<Self> {
        config.validate()?;
        let full_name = config.full_name();

        let generic_font = prefs.generic_font();
        let custom_font = match &config.font {
            Some(o) => generic_font.merged(o),
            None => generic_font.clone(),
        };
        custom_font
            .validate()
            .map_err(|e| CardError::config(format!("'{full_name}' font: {e}")))?;

        let source_dir = config
            .source_dir
            .clone()
            .unwrap_or_else(|| prefs.source_root.join(&full_name));
        let data_file = config
            .data_file
            .clone()
            .unwrap_or_else(|| source_dir.join(DEFAULT_DATA_FILE));

        let flags = ProfileFlags {
            has_custom_season_titles: !config.season_titles.is_empty(),
            has_custom_font: custom_font != generic_font,
            hides_season_titles: config.hide_season_titles,
        };

        Ok(Self {
            media_root: config.media_root.clone(),
            config: Arc::new(config),
            full_name,
            source_dir,
            store: EpisodeDataStore::new(data_file),
            flags,
            variant: ProfileVariant::primary(flags),
            generic_font,
            custom_font,
            episodes: None,
        })
    }

    /// Series title as configured.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// `"{name} ({year})"`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The configuration entry this show was built from.
    pub fn config(&self) -> &ShowConfig {
        &self.config
    }

    /// Capability flags.
    pub fn flags(&self) -> ProfileFlags {
        self.flags
    }

    /// Bound profile variant.
    pub fn variant(&self) -> ProfileVariant {
        self.variant
    }

    /// Directory cards are written into.
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Directory holding source stills.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Episode data store.
    pub fn store(&self) -> &EpisodeDataStore {
        &self.store
    }

    /// Returns `true` once [`Show::load`] succeeded.
    pub fn is_loaded(&self) -> bool {
        self.episodes.is_some()
    }

    /// Loaded episodes, empty before [`Show::load`].
    pub fn episodes(&self) -> &[EpisodeRecord] {
        self.episodes.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Read the episode data file, replacing anything loaded earlier.
    pub fn load(&mut self) -> CardResult<usize> {
        let episodes = self.store.read_all().map_err(|e| match e {
            CardError::NotFound(msg) => {
                CardError::not_found(format!("'{}' has no episode data: {msg}", self.full_name))
            }
            other => other,
        })?;
        let count = episodes.len();
        self.episodes = Some(Arc::new(episodes));
        Ok(count)
    }

    /// A copy bound to `variant` and writing under `media_root`. Loaded data is kept.
    pub fn with_variant(&self, variant: ProfileVariant, media_root: impl Into<PathBuf>) -> Self {
        let mut show = self.clone();
        show.variant = variant;
        show.media_root = media_root.into();
        show
    }

    /// Font for the bound variant.
    pub fn font(&self) -> &CardFont {
        match self.variant.font {
            FontMode::Custom => &self.custom_font,
            FontMode::Generic => &self.generic_font,
        }
    }

    /// Unformatted season label for the bound variant.
    pub fn season_label(&self, season: u32) -> Option<String> {
        match self.variant.season {
            SeasonTitleMode::Hidden => None,
            SeasonTitleMode::Generic => Some(generic_season_label(season)),
            SeasonTitleMode::Custom => Some(
                self.config
                    .season_titles
                    .get(&season)
                    .cloned()
                    .unwrap_or_else(|| generic_season_label(season)),
            ),
        }
    }

    /// Formatted text for one card of this show.
    pub fn card_text(&self, record: &EpisodeRecord) -> CardText {
        let font = self.font().clone();
        CardText {
            lines: record
                .title_lines()
                .into_iter()
                .map(|line| font.format_text(line))
                .collect(),
            season_label: self
                .season_label(record.season)
                .map(|label| font.case.apply(&label)),
            font,
        }
    }

    /// `"{full name} - S{season:02}E{episode:02}.{extension}"`, filesystem-safe.
    pub fn card_file_name(&self, record: &EpisodeRecord, extension: &str) -> String {
        sanitize_file_name(&format!(
            "{} - S{:02}E{:02}.{extension}",
            self.full_name, record.season, record.episode
        ))
    }
}

/// `"Specials"` for season 0, `"Season {N}"` otherwise.
pub fn generic_season_label(season: u32) -> String {
    if season == 0 {
        "Specials".to_string()
    } else {
        format!("Season {season}")
    }
}

/// Drop characters that are illegal in file names on common filesystems.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/show/model.rs"]
mod tests;
