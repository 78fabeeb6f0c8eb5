use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{CardError, CardResult};

/// Token stored in place of an intentionally blank top title line.
pub const EMPTY_SENTINEL: &str = "_EMPTY_";

/// Header row written to new data files.
pub const HEADER: &str = "title_top\ttitle_bottom\tseason_number\tepisode_number";

/// One episode row of a show's data file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpisodeRecord {
    /// Upper title line; empty when the title fits on one line.
    pub title_top: String,
    /// Lower title line.
    pub title_bottom: Option<String>,
    /// Season number, `0` for specials.
    pub season: u32,
    /// Episode number within the season, starting at 1.
    pub episode: u32,
}

impl EpisodeRecord {
    /// Build a record with both title lines.
    pub fn new(
        title_top: impl Into<String>,
        title_bottom: impl Into<String>,
        season: u32,
        episode: u32,
    ) -> Self {
        Self {
            title_top: title_top.into(),
            title_bottom: Some(title_bottom.into()),
            season,
            episode,
        }
    }

    /// Non-empty title lines, top first.
    pub fn title_lines(&self) -> Vec<&str> {
        [Some(self.title_top.as_str()), self.title_bottom.as_deref()]
            .into_iter()
            .flatten()
            .filter(|line| !line.is_empty())
            .collect()
    }

    fn to_row(&self) -> String {
        let top = if self.title_top.is_empty() {
            EMPTY_SENTINEL.to_string()
        } else {
            sanitize_field(&self.title_top)
        };
        let bottom = self
            .title_bottom
            .as_deref()
            .map(sanitize_field)
            .unwrap_or_default();
        format!("{top}\t{bottom}\t{}\t{}\n", self.season, self.episode)
    }

    fn parse_row(line: &str, line_no: usize) -> CardResult<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(CardError::data(format!(
                "line {line_no}: expected 4 tab-separated fields, found {}",
                fields.len()
            )));
        }

        let title_top = if fields[0] == EMPTY_SENTINEL {
            String::new()
        } else {
            fields[0].to_string()
        };
        let title_bottom = (!fields[1].is_empty()).then(|| fields[1].to_string());
        let season = fields[2].trim().parse::<u32>().map_err(|e| {
            CardError::data(format!("line {line_no}: bad season '{}': {e}", fields[2]))
        })?;
        let episode = fields[3].trim().parse::<u32>().map_err(|e| {
            CardError::data(format!("line {line_no}: bad episode '{}': {e}", fields[3]))
        })?;
        if episode == 0 {
            return Err(CardError::data(format!(
                "line {line_no}: episode numbers start at 1"
            )));
        }

        Ok(Self {
            title_top,
            title_bottom,
            season,
            episode,
        })
    }
}

fn sanitize_field(s: &str) -> String {
    s.replace(['\t', '\r', '\n'], " ")
}

/// Tab-delimited episode file for one show.
///
/// Row 0 is a header. Appends assume a single writer per file.
#[derive(Clone, Debug)]
pub struct EpisodeDataStore {
    path: PathBuf,
}

impl EpisodeDataStore {
    /// Bind a store to `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` when the backing file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Create the backing file containing only the header. Existing files are left alone.
    pub fn create(&self) -> CardResult<()> {
        if self.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create data directory '{}'", parent.display()))?;
        }
        std::fs::write(&self.path, format!("{HEADER}\n"))
            .with_context(|| format!("write data file '{}'", self.path.display()))?;
        Ok(())
    }

    /// Open the file and stream its records. Each call rescans from the top.
    pub fn read(&self) -> CardResult<EpisodeRows> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CardError::not_found(format!(
                    "data file '{}'",
                    self.path.display()
                )));
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("open data file '{}'", self.path.display()))
                    .into());
            }
        };
        Ok(EpisodeRows {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }

    /// Read every record into memory.
    pub fn read_all(&self) -> CardResult<Vec<EpisodeRecord>> {
        self.read()?.collect()
    }

    /// Append one record, terminating the previous row first if needed.
    pub fn append(&self, record: &EpisodeRecord) -> CardResult<()> {
        if !self.exists() {
            return Err(CardError::not_found(format!(
                "data file '{}'",
                self.path.display()
            )));
        }
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open data file '{}' for append", self.path.display()))?;

        let len = file
            .metadata()
            .with_context(|| format!("stat data file '{}'", self.path.display()))?
            .len();
        if len == 0 {
            // Row 0 is always read as the header.
            file.write_all(format!("{HEADER}\n").as_bytes())
                .with_context(|| format!("write header to '{}'", self.path.display()))?;
        } else {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))
                .and_then(|_| file.read_exact(&mut last))
                .with_context(|| format!("read tail of '{}'", self.path.display()))?;
            if last[0] != b'\n' {
                file.write_all(b"\n")
                    .with_context(|| format!("terminate last row of '{}'", self.path.display()))?;
            }
        }

        file.write_all(record.to_row().as_bytes())
            .with_context(|| format!("append to '{}'", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            season = record.season,
            episode = record.episode,
            "appended episode record"
        );
        Ok(())
    }
}

/// Lazy iterator over the records of an [`EpisodeDataStore`].
#[derive(Debug)]
pub struct EpisodeRows {
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl Iterator for EpisodeRows {
    type Item = CardResult<EpisodeRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(anyhow::Error::new(e).context("read data row").into())),
            };
            self.line_no += 1;
            if self.line_no == 1 {
                continue;
            }
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if line.trim().is_empty() {
                continue;
            }
            return Some(EpisodeRecord::parse_row(line, self.line_no));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/store.rs"]
mod tests;
