/// Development mode utilities for working with saved pages
///
/// When the live site is unavailable (or should not be hit during
/// development), use this module to replay previously saved HTML pages
/// through the same extraction path as a live run. `ArchivingSource`
/// captures those pages from a live run in the first place.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::PageSource;
use crate::logging::{self, Stage};
use crate::metros::MetroSource;
use crate::model::ScrapeError;

/// Page source reading `<dir>/<metro slug>.html` instead of fetching.
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    /// Create a fixture source rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the page for `metro` is expected at
    pub fn page_path(&self, metro: &MetroSource) -> PathBuf {
        self.dir.join(format!("{}.html", metro.slug()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save a live page so later runs can replay it
    pub fn save_page(&self, metro: &MetroSource, html: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.page_path(metro);
        fs::write(&path, html)?;
        Ok(path)
    }
}

impl PageSource for FixtureSource {
    fn fetch_page(&self, metro: &MetroSource) -> Result<String, ScrapeError> {
        let path = self.page_path(metro);
        fs::read_to_string(&path).map_err(|e| ScrapeError::Io(format!("{}: {}", path.display(), e)))
    }
}

/// Wraps another source and saves every page it returns into a fixture
/// directory, so the run can later be replayed with `FixtureSource`.
///
/// A page that cannot be saved is logged and still returned.
pub struct ArchivingSource<'a> {
    inner: &'a dyn PageSource,
    archive: FixtureSource,
}

impl<'a> ArchivingSource<'a> {
    pub fn new(inner: &'a dyn PageSource, archive: FixtureSource) -> Self {
        Self { inner, archive }
    }
}

impl PageSource for ArchivingSource<'_> {
    fn fetch_page(&self, metro: &MetroSource) -> Result<String, ScrapeError> {
        let page = self.inner.fetch_page(metro)?;
        match self.archive.save_page(metro, &page) {
            Ok(path) => logging::debug(
                Stage::Fetch,
                Some(&metro.name),
                &format!("Saved page to {}", path.display()),
            ),
            Err(e) => logging::warn(
                Stage::Fetch,
                Some(&metro.name),
                &format!("could not save page under {}: {}", self.archive.dir().display(), e),
            ),
        }
        Ok(page)
    }
}
