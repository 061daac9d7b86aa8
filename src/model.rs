/// Core data types for the metro population pipeline.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O; the only logic is the `Series` constructor, which
/// enforces the one-row-per-year invariant every later stage relies on.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// A single (metro, year, population) data point.
///
/// Used both for raw scraped census values and for rows of the final
/// table. The serde renames give the CSV header `Metro,Year,Population`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "Metro")]
    pub metro: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Population")]
    pub population: u64,
}

impl Observation {
    pub fn new(metro: &str, year: i32, population: u64) -> Self {
        Observation {
            metro: metro.to_string(),
            year,
            population,
        }
    }
}

/// Year-ordered observations for one metro.
///
/// Invariant: years are strictly increasing. The only way to build one is
/// `from_observations`, so holders of a `Series` never re-check this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    metro: String,
    points: Vec<Observation>,
}

impl Series {
    /// Builds a series from unordered observations of a single metro.
    ///
    /// Observations belonging to other metros are ignored. When a year
    /// appears more than once the first occurrence (in source order) wins.
    pub fn from_observations(metro: &str, observations: &[Observation]) -> Self {
        let mut points: Vec<Observation> = observations
            .iter()
            .filter(|o| o.metro == metro)
            .cloned()
            .collect();

        // Stable sort keeps source order among equal years, so dedup_by_key
        // retains the first one.
        points.sort_by_key(|o| o.year);
        points.dedup_by_key(|o| o.year);

        Series {
            metro: metro.to_string(),
            points,
        }
    }

    pub fn metro(&self) -> &str {
        &self.metro
    }

    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First and last year covered, or `None` for an empty series.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.year, last.year)),
            _ => None,
        }
    }

    pub fn into_points(self) -> Vec<Observation> {
        self.points
    }
}

// ---------------------------------------------------------------------------
// Raw table
// ---------------------------------------------------------------------------

/// Text cells of one scraped table, row by row.
///
/// The first row is the header row. Cell text is already trimmed and
/// entity-decoded by the HTML scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        RawTable { rows }
    }

    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(|r| r.as_slice())
    }

    /// All rows after the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching a metro's source page.
///
/// These never escape the per-metro scrape step; they are logged and the
/// metro is skipped for the run.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeError {
    /// Non-2xx HTTP response from the page host.
    Http(u16),
    /// The request could not be completed (DNS, TLS, timeout, ...).
    Request(String),
    /// A local fixture page could not be read.
    Io(String),
    /// The page was fetched but holds no table with the census class.
    TableNotFound(String),
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::Http(code) => write!(f, "HTTP error: {}", code),
            ScrapeError::Request(msg) => write!(f, "Request failed: {}", msg),
            ScrapeError::Io(msg) => write!(f, "I/O error: {}", msg),
            ScrapeError::TableNotFound(class) => {
                write!(f, "No table with class '{}' on page", class)
            }
        }
    }
}

impl std::error::Error for ScrapeError {}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ScrapeError::Http(status.as_u16()),
            None => ScrapeError::Request(err.to_string()),
        }
    }
}

/// Errors that stop a pipeline run.
#[derive(Debug, PartialEq)]
pub enum PipelineError {
    /// Every configured metro was skipped; nothing is written.
    NoUsableMetros,
    /// The configuration file is missing, malformed or inconsistent.
    Config(String),
    /// Reading or writing a local file failed.
    Io(String),
    /// The persisted table could not be read or written as CSV.
    Csv(String),
    /// The assembled table holds two rows for the same metro and year.
    DuplicateYear { metro: String, year: i32 },
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::NoUsableMetros => {
                write!(f, "No data was scraped from any configured metro")
            }
            PipelineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::Io(msg) => write!(f, "I/O error: {}", msg),
            PipelineError::Csv(msg) => write!(f, "CSV error: {}", msg),
            PipelineError::DuplicateYear { metro, year } => {
                write!(f, "Duplicate row for {} in {}", metro, year)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err.to_string())
    }
}

impl From<toml::de::Error> for PipelineError {
    fn from(err: toml::de::Error) -> Self {
        PipelineError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
