use std::path::{Path, PathBuf};

use crate::card::materialize::CardMaterializer;
use crate::foundation::error::CardResult;
use crate::maintainer::report::ShowReport;
use crate::profile::variant::enumerate;
use crate::show::model::{Show, sanitize_file_name};

/// Expands shows into one copy per profile variant, each writing its own archive tree.
#[derive(Clone, Debug)]
pub struct ShowArchiver {
    archive_root: PathBuf,
}

impl ShowArchiver {
    /// Archiver writing under `archive_root`.
    pub fn new(archive_root: impl Into<PathBuf>) -> Self {
        Self {
            archive_root: archive_root.into(),
        }
    }

    /// Root of every archive tree.
    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    /// `{archive_root}/{full name}/{label}` for one variant of `show`.
    pub fn variant_root(&self, show: &Show, label: &str) -> PathBuf {
        self.archive_root
            .join(sanitize_file_name(show.full_name()))
            .join(label)
    }

    /// One loaded copy of `base` per valid profile variant.
    ///
    /// Every copy re-reads the data file, so a data error fails the whole expansion.
    pub fn expand(&self, base: &Show) -> CardResult<Vec<Show>> {
        let mut out = Vec::new();
        for variant in enumerate(base.flags()) {
            let mut show = base.with_variant(variant, self.variant_root(base, variant.label()));
            show.load()?;
            out.push(show);
        }
        Ok(out)
    }

    /// Create missing cards for every variant of every show.
    ///
    /// Each (show, variant) pair is reported separately; one failing never stops the rest.
    pub fn archive_all(&self, shows: &[Show], materializer: &CardMaterializer) -> Vec<ShowReport> {
        let mut reports = Vec::new();
        for base in shows {
            let variants = match self.expand(base) {
                Ok(v) => v,
                Err(e) => {
                    tracing::error!(show = %base.full_name(), "archive expansion failed: {e}");
                    reports.push(ShowReport::failed(base, e));
                    continue;
                }
            };
            for show in &variants {
                let result = materializer.create_missing(show);
                if let Err(e) = &result {
                    tracing::error!(
                        show = %show.full_name(),
                        profile = %show.variant(),
                        "archive failed: {e}"
                    );
                }
                reports.push(ShowReport::new(show, result));
            }
        }
        reports
    }
}

#[cfg(test)]
#[path = "../../tests/unit/show/archive.rs"]
mod tests;
