use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::config::font::{CardFont, FontOverride};
use crate::foundation::error::{CardError, CardResult};

fn default_extension() -> String {
    "jpg".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_imagemagick() -> String {
    "convert".to_string()
}

/// Library-wide settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preferences {
    /// Root holding one source directory per show.
    pub source_root: PathBuf,
    /// Root of archive trees. Archive mode is unavailable without it.
    #[serde(default)]
    pub archive_root: Option<PathBuf>,
    /// Extension of produced cards.
    #[serde(default = "default_extension")]
    pub card_extension: String,
    /// Extension of source stills.
    #[serde(default = "default_extension")]
    pub source_extension: String,
    /// Run renders inside this container instead of on the host.
    #[serde(default)]
    pub container: Option<String>,
    /// Per-command timeout in seconds, `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Cap on concurrent renders per show.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Check glyph coverage before rendering.
    #[serde(default = "default_true")]
    pub validate_fonts: bool,
    /// ImageMagick executable.
    #[serde(default = "default_imagemagick")]
    pub imagemagick: String,
    /// Generic font.
    #[serde(default)]
    pub default_font: FontOverride,
}

impl Preferences {
    /// Preferences with every optional field at its default.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            archive_root: None,
            card_extension: default_extension(),
            source_extension: default_extension(),
            container: None,
            command_timeout_secs: default_timeout_secs(),
            threads: None,
            validate_fonts: true,
            imagemagick: default_imagemagick(),
            default_font: FontOverride::default(),
        }
    }

    /// The generic font shared by every show.
    pub fn generic_font(&self) -> CardFont {
        CardFont::default().merged(&self.default_font)
    }

    /// Command timeout, `None` when disabled.
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> CardResult<()> {
        for (field, ext) in [
            ("card_extension", &self.card_extension),
            ("source_extension", &self.source_extension),
        ] {
            if ext.is_empty() || ext.contains(['.', '/', '\\']) {
                return Err(CardError::config(format!(
                    "{field} must be a bare extension, got '{ext}'"
                )));
            }
        }
        if self.threads == Some(0) {
            return Err(CardError::config("threads must be >= 1 when set"));
        }
        if self.imagemagick.trim().is_empty() {
            return Err(CardError::config("imagemagick executable must be non-empty"));
        }
        self.generic_font()
            .validate()
            .map_err(|e| CardError::config(format!("default_font: {e}")))
    }
}

/// One show entry of the configuration file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShowConfig {
    /// Series title.
    pub name: String,
    /// First-air year.
    pub year: u32,
    /// Media-server directory cards are written into.
    pub media_root: PathBuf,
    /// Source stills; defaults to `{source_root}/{full name}`.
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    /// Episode data; defaults to `{source_dir}/data.tsv`.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    /// Font override.
    #[serde(default)]
    pub font: Option<FontOverride>,
    /// Season number to season title.
    #[serde(default)]
    pub season_titles: BTreeMap<u32, String>,
    /// Render cards without a season label.
    #[serde(default)]
    pub hide_season_titles: bool,
    /// Include this show in archive runs.
    #[serde(default = "default_true")]
    pub archive: bool,
}

impl ShowConfig {
    /// Minimal entry with every optional field at its default.
    pub fn new(name: impl Into<String>, year: u32, media_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            year,
            media_root: media_root.into(),
            source_dir: None,
            data_file: None,
            font: None,
            season_titles: BTreeMap::new(),
            hide_season_titles: false,
            archive: true,
        }
    }

    /// `"{name} ({year})"`.
    pub fn full_name(&self) -> String {
        format!("{} ({})", self.name, self.year)
    }

    /// Reject entries no run could use.
    pub fn validate(&self) -> CardResult<()> {
        if self.name.trim().is_empty() {
            return Err(CardError::config("show name must be non-empty"));
        }
        if self.media_root.as_os_str().is_empty() {
            return Err(CardError::config(format!(
                "'{}': media_root must be non-empty",
                self.full_name()
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    preferences: Preferences,
    #[serde(default)]
    shows: Vec<serde_json::Value>,
}

/// A show entry that failed to parse or validate.
#[derive(Debug)]
pub struct RejectedShow {
    /// Name if one could be read, otherwise the entry index.
    pub label: String,
    /// Why it was rejected.
    pub error: CardError,
}

/// Parsed configuration file.
#[derive(Debug)]
pub struct Config {
    /// Library-wide settings.
    pub preferences: Preferences,
    /// Shows that parsed and validated.
    pub shows: Vec<ShowConfig>,
    /// Shows that did not.
    pub rejected: Vec<RejectedShow>,
}

impl Config {
    /// Build a configuration from already-parsed parts.
    pub fn new(preferences: Preferences, shows: Vec<ShowConfig>) -> Self {
        Self {
            preferences,
            shows,
            rejected: Vec::new(),
        }
    }

    /// Parse a configuration from a JSON reader.
    ///
    /// Only a document that is not JSON or has invalid preferences fails; bad show entries
    /// land in [`Config::rejected`].
    pub fn from_reader<R: std::io::Read>(r: R) -> CardResult<Self> {
        let raw: RawConfig = serde_json::from_reader(r)
            .map_err(|e| CardError::config(format!("parse configuration JSON: {e}")))?;
        raw.preferences.validate()?;

        let mut shows = Vec::with_capacity(raw.shows.len());
        let mut rejected = Vec::new();
        for (idx, value) in raw.shows.into_iter().enumerate() {
            let label = value
                .get("name")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("show #{idx}"));
            let parsed = serde_json::from_value::<ShowConfig>(value)
                .map_err(|e| CardError::config(format!("'{label}': {e}")))
                .and_then(|show| show.validate().map(|()| show));
            match parsed {
                Ok(show) => shows.push(show),
                Err(error) => {
                    tracing::warn!(show = %label, "skipping show: {error}");
                    rejected.push(RejectedShow { label, error });
                }
            }
        }

        Ok(Self {
            preferences: raw.preferences,
            shows,
            rejected,
        })
    }

    /// Parse a configuration file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> CardResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CardError::config(format!("open configuration '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/settings.rs"]
mod tests;
