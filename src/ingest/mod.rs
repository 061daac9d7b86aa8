/// Source page ingestion.
///
/// Submodules:
/// - `html`: tolerant scanning of a census table out of page markup.
/// - `wiki`: HTTP client for the configured encyclopedia pages.
///
/// `scrape_metro` is the fetch-and-extract boundary: every per-metro failure
/// is logged and folded into an `Extraction::Empty` here, so nothing past
/// this point has to handle fetch or markup errors.

pub mod html;
pub mod wiki;

use crate::extract::{extract, CensusSchema, EmptyReason, Extraction};
use crate::logging::{self, Stage};
use crate::metros::MetroSource;
use crate::model::ScrapeError;

/// Anything that can return the raw markup of a metro's page.
///
/// Implemented by `wiki::HttpSource` for live runs and
/// `dev_mode::FixtureSource` for offline runs against saved pages.
pub trait PageSource {
    fn fetch_page(&self, metro: &MetroSource) -> Result<String, ScrapeError>;
}

/// Fetches one metro's page and extracts its census observations.
pub fn scrape_metro(
    source: &dyn PageSource,
    metro: &MetroSource,
    table_class: &str,
    schema: &CensusSchema,
) -> Extraction {
    logging::info(Stage::Fetch, Some(&metro.name), &format!("Scraping {}...", metro.name));

    let page = match source.fetch_page(metro) {
        Ok(page) => page,
        Err(err) => {
            logging::log_scrape_failure(&metro.name, &err);
            return Extraction::Empty(EmptyReason::Unavailable(err.to_string()));
        }
    };

    let Some(table) = html::find_table(&page, table_class) else {
        logging::log_scrape_failure(&metro.name, &ScrapeError::TableNotFound(table_class.to_string()));
        return Extraction::Empty(EmptyReason::TableNotFound);
    };

    let extraction = extract(&metro.name, &table, schema);
    match &extraction {
        Extraction::Rows(rows) => logging::info(
            Stage::Extract,
            Some(&metro.name),
            &format!("✓ Scraped {} census data points", rows.len()),
        ),
        Extraction::Empty(reason) => {
            logging::warn(Stage::Extract, Some(&metro.name), &reason.to_string())
        }
    }
    extraction
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
