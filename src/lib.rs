//! Cardwright keeps a television library's episode title cards up to date.
//!
//! Each configured show carries a tab-delimited episode data file and a directory of source
//! stills. The maintainer:
//!
//! - Loads a [`Config`] and binds every show to its primary [`ProfileVariant`]
//! - Creates only the cards that are missing, rendering them through a [`CardStyle`]
//! - Optionally archives every profile variant of a show under a separate root
//!
//! Fonts are checked glyph by glyph before a render is attempted, so a card is never drawn
//! with tofu boxes in place of characters the font lacks.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Card styles and per-episode materialization.
pub mod card;
/// JSON configuration: preferences, shows, and font settings.
pub mod config;
/// Episode data files.
pub mod data;
/// External command execution on the host or inside a container.
pub mod exec;
/// Font glyph coverage.
pub mod font;
/// Batch orchestration across shows.
pub mod maintainer;
/// Profile variants derived from show capabilities.
pub mod profile;
/// Shows bound to preferences, and variant archiving.
pub mod show;

pub use crate::foundation::error::{CardError, CardResult};

pub use crate::card::materialize::{
    CardFailure, CardMaterializer, CardOutcome, CardTask, MaterializeStats, MaterializerOpts,
};
pub use crate::card::style::{CardStyle, CardText, StandardStyle};
pub use crate::config::font::{CardFont, FontOverride, TextCase};
pub use crate::config::settings::{Config, Preferences, RejectedShow, ShowConfig};
pub use crate::data::store::{EpisodeDataStore, EpisodeRecord};
pub use crate::exec::runner::{CommandExecutor, CommandLine, CommandOutput, CommandRunner};
pub use crate::font::coverage::{
    FontCache, FontResource, GlyphCoverage, is_renderable, missing_characters,
};
pub use crate::maintainer::orchestrator::{FontIssue, Maintainer};
pub use crate::maintainer::report::{BatchReport, ShowReport};
pub use crate::profile::variant::{
    FontMode, ProfileFlags, ProfileVariant, SeasonTitleMode, enumerate,
};
pub use crate::show::archive::ShowArchiver;
pub use crate::show::model::Show;

#[cfg(test)]
#[path = "../tests/support/synthetic_font.rs"]
pub(crate) mod synthetic_font;

#[cfg(test)]
#[path = "../tests/unit/stub_executor.rs"]
pub(crate) mod stub_executor;
