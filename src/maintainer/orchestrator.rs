use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::card::materialize::{CardMaterializer, MaterializerOpts};
use crate::card::style::{CardStyle, StandardStyle};
use crate::config::settings::{Config, Preferences, RejectedShow};
use crate::data::store::EpisodeRecord;
use crate::exec::runner::{CommandExecutor, CommandRunner};
use crate::font::coverage::FontCache;
use crate::foundation::error::{CardError, CardResult};
use crate::maintainer::report::{BatchReport, ShowReport};
use crate::profile::variant::{ProfileVariant, enumerate};
use crate::show::archive::ShowArchiver;
use crate::show::model::Show;

/// Characters one episode's card cannot be drawn with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontIssue {
    /// Season number.
    pub season: u32,
    /// Episode number.
    pub episode: u32,
    /// Characters without a usable glyph.
    pub missing: BTreeSet<char>,
}

/// Owns every configured show and drives card creation across them.
#[derive(Debug)]
pub struct Maintainer {
    preferences: Preferences,
    shows: Vec<Show>,
    rejected: Vec<RejectedShow>,
    fonts: Arc<FontCache>,
    materializer: CardMaterializer,
    archiver: Option<ShowArchiver>,
    append_lock: Mutex<()>,
}

impl Maintainer {
    /// Maintainer rendering with ImageMagick on the host or in the configured container.
    pub fn new(config: Config) -> CardResult<Self> {
        let runner = CommandRunner::new(config.preferences.container.clone())
            .with_timeout(config.preferences.command_timeout());
        let style = StandardStyle::new(config.preferences.imagemagick.clone());
        Self::with_components(config, Arc::new(style), Arc::new(runner))
    }

    /// Maintainer with a caller-supplied style and executor.
    pub fn with_components(
        config: Config,
        style: Arc<dyn CardStyle>,
        executor: Arc<dyn CommandExecutor>,
    ) -> CardResult<Self> {
        let Config {
            preferences,
            shows: show_configs,
            mut rejected,
        } = config;
        preferences.validate()?;

        let mut shows = Vec::with_capacity(show_configs.len());
        for cfg in show_configs {
            let label = cfg.full_name();
            match Show::new(cfg, &preferences) {
                Ok(show) => shows.push(show),
                Err(error) => {
                    tracing::warn!(show = %label, "skipping show: {error}");
                    rejected.push(RejectedShow { label, error });
                }
            }
        }

        let fonts = Arc::new(FontCache::new());
        let materializer = CardMaterializer::new(
            style,
            executor,
            Arc::clone(&fonts),
            MaterializerOpts {
                threads: preferences.threads,
                validate_fonts: preferences.validate_fonts,
                source_extension: preferences.source_extension.clone(),
                card_extension: preferences.card_extension.clone(),
            },
        )?;
        let archiver = preferences.archive_root.clone().map(ShowArchiver::new);

        tracing::info!(
            shows = shows.len(),
            rejected = rejected.len(),
            "maintainer ready"
        );
        Ok(Self {
            preferences,
            shows,
            rejected,
            fonts,
            materializer,
            archiver,
            append_lock: Mutex::new(()),
        })
    }

    /// Library preferences.
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Configured shows, unloaded.
    pub fn shows(&self) -> &[Show] {
        &self.shows
    }

    /// Show entries that were rejected during configuration.
    pub fn rejected(&self) -> &[RejectedShow] {
        &self.rejected
    }

    /// Look a show up by name or full name.
    pub fn show(&self, name: &str) -> Option<&Show> {
        self.shows
            .iter()
            .find(|s| s.full_name() == name)
            .or_else(|| self.shows.iter().find(|s| s.name() == name))
    }

    fn require_show(&self, name: &str) -> CardResult<&Show> {
        self.show(name)
            .ok_or_else(|| CardError::not_found(format!("no configured show named '{name}'")))
    }

    /// Shows targeted by `name`, or every show. Unknown names go into the report.
    fn targets(&self, name: Option<&str>, report: &mut BatchReport) -> Vec<&Show> {
        match name {
            None => self.shows.iter().collect(),
            Some(name) => match self.show(name) {
                Some(show) => vec![show],
                None => {
                    tracing::warn!("no configured show named '{name}'");
                    report.not_found.push(name.to_string());
                    Vec::new()
                }
            },
        }
    }

    /// Create missing cards under each show's primary variant.
    pub fn create_missing(&self, name: Option<&str>) -> BatchReport {
        let mut report = BatchReport::default();
        for template in self.targets(name, &mut report) {
            let entry = self.create_missing_for(template);
            let fatal = entry.result.as_ref().is_err_and(CardError::is_batch_fatal);
            report.shows.push(entry);
            if fatal {
                break;
            }
        }
        report
    }

    #[tracing::instrument(skip_all, fields(show = %template.full_name()))]
    fn create_missing_for(&self, template: &Show) -> ShowReport {
        let mut show = template.clone();
        match show.load() {
            Ok(count) => tracing::debug!(episodes = count, "episode data loaded"),
            Err(e) => {
                if e.is_not_found() {
                    tracing::warn!("skipping show: {e}");
                } else {
                    tracing::error!("skipping show: {e}");
                }
                return ShowReport::failed(&show, e);
            }
        }
        let result = self.materializer.create_missing(&show);
        if let Err(e) = &result {
            tracing::error!("materialization failed: {e}");
        }
        ShowReport::new(&show, result)
    }

    /// Create missing cards for every profile variant of archive-enabled shows.
    pub fn archive(&self, name: Option<&str>) -> CardResult<BatchReport> {
        let archiver = self.archiver.as_ref().ok_or_else(|| {
            CardError::config("archive mode requires 'archive_root' in preferences")
        })?;
        tracing::info!(root = %archiver.archive_root().display(), "archiving profile variants");
        let mut report = BatchReport::default();
        let targets: Vec<Show> = self
            .targets(name, &mut report)
            .into_iter()
            .filter(|s| name.is_some() || s.config().archive)
            .cloned()
            .collect();
        report.shows = archiver.archive_all(&targets, &self.materializer);
        Ok(report)
    }

    /// Every profile variant of a show.
    pub fn profiles(&self, name: &str) -> CardResult<Vec<ProfileVariant>> {
        Ok(enumerate(self.require_show(name)?.flags()))
    }

    /// Episodes of a show whose primary-variant text its font cannot draw.
    pub fn check_fonts(&self, name: &str) -> CardResult<Vec<FontIssue>> {
        let mut show = self.require_show(name)?.clone();
        let Some(file) = show.font().file.clone() else {
            return Ok(Vec::new());
        };
        let font = self.fonts.get(&file)?;
        show.load()?;

        let mut issues = Vec::new();
        for record in show.episodes() {
            let text = show.card_text(record);
            let mut missing = BTreeSet::new();
            for piece in text.texts() {
                missing.extend(font.missing_characters(piece));
            }
            if !missing.is_empty() {
                issues.push(FontIssue {
                    season: record.season,
                    episode: record.episode,
                    missing,
                });
            }
        }
        Ok(issues)
    }

    /// Append an episode to a show's data file.
    pub fn add_episode(&self, name: &str, record: &EpisodeRecord) -> CardResult<()> {
        let show = self.require_show(name)?;
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("append lock poisoned"))?;
        show.store().append(record)
    }

    /// Create a show's data file with only the header row.
    pub fn init_data(&self, name: &str) -> CardResult<()> {
        let show = self.require_show(name)?;
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("append lock poisoned"))?;
        show.store().create()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/maintainer/orchestrator.rs"]
mod tests;
