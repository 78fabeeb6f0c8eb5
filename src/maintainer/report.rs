use crate::card::materialize::MaterializeStats;
use crate::foundation::error::{CardError, CardResult};
use crate::profile::variant::ProfileVariant;
use crate::show::model::Show;

/// Result of one (show, variant) pass.
#[derive(Debug)]
pub struct ShowReport {
    /// Full show name.
    pub show: String,
    /// Variant the pass ran under.
    pub profile: ProfileVariant,
    /// Pass tally, or why the show could not be processed.
    pub result: CardResult<MaterializeStats>,
}

impl ShowReport {
    /// Report for `show` with `result`.
    pub fn new(show: &Show, result: CardResult<MaterializeStats>) -> Self {
        Self {
            show: show.full_name().to_string(),
            profile: show.variant(),
            result,
        }
    }

    /// Report for a show that failed before materializing.
    pub fn failed(show: &Show, error: CardError) -> Self {
        Self::new(show, Err(error))
    }

    /// Stats when the pass ran.
    pub fn stats(&self) -> Option<&MaterializeStats> {
        self.result.as_ref().ok()
    }
}

/// Everything one maintainer invocation did.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per (show, variant) attempted.
    pub shows: Vec<ShowReport>,
    /// Requested show names that are not configured.
    pub not_found: Vec<String>,
}

impl BatchReport {
    /// Sum of every pass that ran.
    pub fn totals(&self) -> MaterializeStats {
        let mut out = MaterializeStats::default();
        for stats in self.shows.iter().filter_map(ShowReport::stats) {
            out.merge(stats);
        }
        out
    }

    /// Passes that could not run at all.
    pub fn failed_shows(&self) -> impl Iterator<Item = &ShowReport> {
        self.shows.iter().filter(|r| r.result.is_err())
    }

    /// No show errors, no card failures, no unknown names.
    pub fn is_clean(&self) -> bool {
        self.not_found.is_empty()
            && self.failed_shows().next().is_none()
            && self.totals().failed() == 0
    }
}
