use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use rayon::prelude::*;

use crate::card::style::{CardStyle, CardText};
use crate::data::store::EpisodeRecord;
use crate::exec::runner::CommandExecutor;
use crate::font::coverage::FontCache;
use crate::foundation::error::{CardError, CardResult};
use crate::show::model::Show;

/// One card to produce: an episode record bound to a show and its profile variant.
#[derive(Clone, Debug, PartialEq)]
pub struct CardTask {
    /// Season number.
    pub season: u32,
    /// Episode number.
    pub episode: u32,
    /// Source still.
    pub input: PathBuf,
    /// Final card location.
    pub output: PathBuf,
    /// Whether `output` existed when the task was planned.
    pub already_exists: bool,
    /// Text and font to draw.
    pub text: CardText,
}

/// What [`CardMaterializer::create`] did for one task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardOutcome {
    /// A new card was rendered.
    Created,
    /// The card already existed; nothing was run.
    AlreadyExists,
    /// The source still is missing; nothing was run.
    MissingSource,
}

/// A card that could not be produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardFailure {
    /// Intended card location.
    pub output: PathBuf,
    /// Rendered error message.
    pub error: String,
}

/// Tally of one materialization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    /// Cards rendered.
    pub created: usize,
    /// Cards skipped because they existed.
    pub skipped_existing: usize,
    /// Cards skipped because their source still was missing.
    pub skipped_missing_source: usize,
    /// Cards that failed validation or rendering.
    pub failures: Vec<CardFailure>,
}

impl MaterializeStats {
    /// Number of failed cards.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of cards considered.
    pub fn total(&self) -> usize {
        self.created + self.skipped_existing + self.skipped_missing_source + self.failed()
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: &MaterializeStats) {
        self.created += other.created;
        self.skipped_existing += other.skipped_existing;
        self.skipped_missing_source += other.skipped_missing_source;
        self.failures.extend(other.failures.iter().cloned());
    }

    fn record(&mut self, outcome: CardOutcome) {
        match outcome {
            CardOutcome::Created => self.created += 1,
            CardOutcome::AlreadyExists => self.skipped_existing += 1,
            CardOutcome::MissingSource => self.skipped_missing_source += 1,
        }
    }
}

/// Maps episode records to card paths and renders the ones that are missing.
///
/// Re-running over a complete library issues no render commands.
pub struct CardMaterializer {
    style: Arc<dyn CardStyle>,
    executor: Arc<dyn CommandExecutor>,
    fonts: Arc<FontCache>,
    pool: rayon::ThreadPool,
    validate_fonts: bool,
    source_extension: String,
    card_extension: String,
}

impl std::fmt::Debug for CardMaterializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardMaterializer")
            .field("style", &self.style.name())
            .field("threads", &self.pool.current_num_threads())
            .field("validate_fonts", &self.validate_fonts)
            .field("source_extension", &self.source_extension)
            .field("card_extension", &self.card_extension)
            .finish_non_exhaustive()
    }
}

/// Construction options for [`CardMaterializer`].
#[derive(Clone, Debug)]
pub struct MaterializerOpts {
    /// Worker threads for per-episode renders. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Check glyph coverage before rendering.
    pub validate_fonts: bool,
    /// Extension of source stills.
    pub source_extension: String,
    /// Extension of produced cards.
    pub card_extension: String,
}

impl Default for MaterializerOpts {
    fn default() -> Self {
        Self {
            threads: None,
            validate_fonts: true,
            source_extension: "jpg".to_string(),
            card_extension: "jpg".to_string(),
        }
    }
}

impl CardMaterializer {
    /// Build a materializer around a style and a command executor.
    pub fn new(
        style: Arc<dyn CardStyle>,
        executor: Arc<dyn CommandExecutor>,
        fonts: Arc<FontCache>,
        opts: MaterializerOpts,
    ) -> CardResult<Self> {
        Ok(Self {
            style,
            executor,
            fonts,
            pool: build_thread_pool(opts.threads)?,
            validate_fonts: opts.validate_fonts,
            source_extension: opts.source_extension,
            card_extension: opts.card_extension,
        })
    }

    /// Resolve paths and text for one record of `show`.
    pub fn plan(&self, record: &EpisodeRecord, show: &Show) -> CardTask {
        let input = show.source_dir().join(source_file_name(
            record.season,
            record.episode,
            &self.source_extension,
        ));
        let output = show
            .media_root()
            .join(season_folder(record.season))
            .join(show.card_file_name(record, &self.card_extension));
        CardTask {
            season: record.season,
            episode: record.episode,
            already_exists: output.exists(),
            input,
            output,
            text: show.card_text(record),
        }
    }

    /// Produce one card unless it exists or its source is missing.
    ///
    /// The card only becomes visible at `task.output` once the render succeeded.
    pub fn create(&self, task: &CardTask) -> CardResult<CardOutcome> {
        if task.already_exists || task.output.exists() {
            return Ok(CardOutcome::AlreadyExists);
        }
        if !task.input.is_file() {
            tracing::warn!(
                source = %task.input.display(),
                "source image missing for S{:02}E{:02}",
                task.season,
                task.episode
            );
            return Ok(CardOutcome::MissingSource);
        }

        if self.validate_fonts
            && let Some(file) = &task.text.font.file
        {
            self.fonts.get(file)?.ensure_renderable(task.text.texts())?;
        }

        ensure_parent_dir(&task.output)?;
        let scratch = scratch_path(&task.output);
        let scratch_paths = [scratch.clone()];
        let command = self.style.command(&task.text, &task.input, &scratch);

        let output = match self.executor.execute(&command) {
            Ok(output) => output,
            Err(e) => {
                self.executor.cleanup(&scratch_paths);
                return Err(e);
            }
        };
        if !output.success() {
            self.executor.cleanup(&scratch_paths);
            return Err(CardError::render(format!(
                "{} exited with {}: {}",
                command.program.to_string_lossy(),
                output
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                output.stderr.trim()
            )));
        }
        if !scratch.is_file() {
            self.executor.cleanup(&scratch_paths);
            return Err(CardError::render(format!(
                "renderer reported success but wrote no '{}'",
                scratch.display()
            )));
        }
        if let Err(e) = std::fs::rename(&scratch, &task.output) {
            self.executor.cleanup(&scratch_paths);
            return Err(anyhow::Error::new(e)
                .context(format!("move card into '{}'", task.output.display()))
                .into());
        }

        tracing::info!(card = %task.output.display(), "created card");
        Ok(CardOutcome::Created)
    }

    /// Create every missing card of a loaded show, in parallel.
    #[tracing::instrument(skip_all, fields(show = %show.full_name(), profile = %show.variant()))]
    pub fn create_missing(&self, show: &Show) -> CardResult<MaterializeStats> {
        if !show.is_loaded() {
            return Err(CardError::data(format!(
                "'{}' episode data is not loaded",
                show.full_name()
            )));
        }

        // Duplicate rows would race on one output path; the first row wins.
        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(show.episodes().len());
        for record in show.episodes() {
            let task = self.plan(record, show);
            if seen.insert(task.output.clone()) {
                tasks.push(task);
            } else {
                tracing::debug!(card = %task.output.display(), "duplicate episode row ignored");
            }
        }
        let results: Vec<CardResult<CardOutcome>> = self
            .pool
            .install(|| tasks.par_iter().map(|task| self.create(task)).collect());

        let mut stats = MaterializeStats::default();
        for (task, result) in tasks.iter().zip(results) {
            match result {
                Ok(outcome) => stats.record(outcome),
                Err(e) => {
                    tracing::error!(card = %task.output.display(), "card failed: {e}");
                    stats.failures.push(CardFailure {
                        output: task.output.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            created = stats.created,
            existing = stats.skipped_existing,
            missing_source = stats.skipped_missing_source,
            failed = stats.failed(),
            "materialization finished"
        );
        Ok(stats)
    }
}

/// `s{season}e{episode}.{extension}`.
pub fn source_file_name(season: u32, episode: u32, extension: &str) -> String {
    format!("s{season}e{episode}.{extension}")
}

/// `Specials` for season 0, `Season {N}` otherwise.
pub fn season_folder(season: u32) -> String {
    if season == 0 {
        "Specials".to_string()
    } else {
        format!("Season {season}")
    }
}

/// Hidden sibling of `output` that renders are written to before being moved into place.
pub fn scratch_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!(".{stem}.partial.{}", ext.to_string_lossy()),
        None => format!(".{stem}.partial"),
    };
    output.with_file_name(name)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CardResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> CardResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(CardError::config("'threads' must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| CardError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/card/materialize.rs"]
mod tests;
