//! Run Report Module
//!
//! Records what happened to every configured metro during a run (scraped
//! or skipped, and why) together with a summary of the table that was
//! written. The report prints to the console after each run and can also be
//! saved as JSON for scheduled jobs.

use chrono::Utc;
use serde::Serialize;
use std::path::Path;

use crate::assemble::{metro_count, year_span};
use crate::extract::Extraction;
use crate::metros::MetroSource;
use crate::model::{Observation, PipelineError};

/// Rows shown at each end of the table in the console summary.
const PREVIEW_ROWS: usize = 10;

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub outcomes: Vec<MetroOutcome>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub metros_total: usize,
    pub metros_scraped: usize,
    pub metros_skipped: usize,
    pub metros_written: usize,
    pub rows_written: usize,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub output_file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetroOutcome {
    pub metro: String,
    pub url: String,
    pub status: OutcomeStatus,
    /// Known data points contributed by this metro (before interpolation).
    pub data_points: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum OutcomeStatus {
    Scraped,
    Skipped,
}

// ============================================================================
// Construction
// ============================================================================

impl MetroOutcome {
    pub fn scraped(metro: &MetroSource, points: &[Observation]) -> Self {
        MetroOutcome {
            metro: metro.name.clone(),
            url: metro.url.clone(),
            status: OutcomeStatus::Scraped,
            data_points: points.len(),
            first_year: points.iter().map(|p| p.year).min(),
            last_year: points.iter().map(|p| p.year).max(),
            message: None,
        }
    }

    pub fn skipped(metro: &MetroSource, reason: String) -> Self {
        MetroOutcome {
            metro: metro.name.clone(),
            url: metro.url.clone(),
            status: OutcomeStatus::Skipped,
            data_points: 0,
            first_year: None,
            last_year: None,
            message: Some(reason),
        }
    }

    pub fn from_extraction(metro: &MetroSource, extraction: &Extraction) -> Self {
        match extraction {
            Extraction::Rows(rows) => Self::scraped(metro, rows),
            Extraction::Empty(reason) => Self::skipped(metro, reason.to_string()),
        }
    }
}

impl RunReport {
    pub fn new(outcomes: Vec<MetroOutcome>, rows: &[Observation], output_file: &str) -> Self {
        let metros_scraped = outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Scraped)
            .count();
        let span = year_span(rows);

        let summary = RunSummary {
            metros_total: outcomes.len(),
            metros_scraped,
            metros_skipped: outcomes.len() - metros_scraped,
            metros_written: metro_count(rows),
            rows_written: rows.len(),
            min_year: span.map(|(min, _)| min),
            max_year: span.map(|(_, max)| max),
            output_file: output_file.to_string(),
        };

        RunReport {
            timestamp: Utc::now().to_rfc3339(),
            outcomes,
            summary,
        }
    }

    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Saves the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        std::fs::write(path, self.to_json()?)
            .map_err(|e| PipelineError::Io(format!("cannot write {}: {}", path.display(), e)))
    }
}

// ============================================================================
// Console Output
// ============================================================================

pub fn print_summary(report: &RunReport, rows: &[Observation]) {
    let s = &report.summary;
    println!("\n{}", "=".repeat(60));
    println!("Summary:");
    println!("{}", "=".repeat(60));
    println!("Metros:      {} ({} of {} scraped)", s.metros_written, s.metros_scraped, s.metros_total);
    if let (Some(min), Some(max)) = (s.min_year, s.max_year) {
        println!("Year range:  {} - {}", min, max);
    }
    println!("Total data points: {}", s.rows_written);
    println!("Saved to:    {}", s.output_file);

    for outcome in report.outcomes.iter().filter(|o| o.status == OutcomeStatus::Skipped) {
        println!(
            "  skipped {}: {}",
            outcome.metro,
            outcome.message.as_deref().unwrap_or("unknown reason")
        );
    }

    println!("\nFirst few rows:");
    print_rows(rows.iter().take(PREVIEW_ROWS));
    println!("\nLast few rows:");
    print_rows(rows.iter().skip(rows.len().saturating_sub(PREVIEW_ROWS)));
}

fn print_rows<'a>(rows: impl Iterator<Item = &'a Observation>) {
    println!("  {:<20} {:>6} {:>12}", "Metro", "Year", "Population");
    for row in rows {
        println!("  {:<20} {:>6} {:>12}", row.metro, row.year, row.population);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::EmptyReason;

    fn atlanta() -> MetroSource {
        MetroSource::new("Atlanta", "https://en.wikipedia.org/wiki/Atlanta_metropolitan_area")
    }

    fn miami() -> MetroSource {
        MetroSource::new("Miami", "https://en.wikipedia.org/wiki/Miami_metropolitan_area")
    }

    #[test]
    fn test_outcome_from_rows() {
        let extraction = Extraction::Rows(vec![
            Observation::new("Atlanta", 2010, 5_286_728),
            Observation::new("Atlanta", 1990, 3_069_411),
        ]);
        let outcome = MetroOutcome::from_extraction(&atlanta(), &extraction);
        assert_eq!(outcome.status, OutcomeStatus::Scraped);
        assert_eq!(outcome.data_points, 2);
        assert_eq!(outcome.first_year, Some(1990));
        assert_eq!(outcome.last_year, Some(2010));
        assert!(outcome.message.is_none());
    }

    #[test]
    fn test_outcome_from_empty_carries_reason() {
        let extraction = Extraction::Empty(EmptyReason::TableNotFound);
        let outcome = MetroOutcome::from_extraction(&miami(), &extraction);
        assert_eq!(outcome.status, OutcomeStatus::Skipped);
        assert_eq!(outcome.message.as_deref(), Some("could not find census table"));
    }

    #[test]
    fn test_summary_counts() {
        let rows = vec![
            Observation::new("Atlanta", 1990, 3_069_411),
            Observation::new("Atlanta", 1991, 3_188_813),
        ];
        let outcomes = vec![
            MetroOutcome::scraped(&atlanta(), &rows),
            MetroOutcome::skipped(&miami(), "no data rows found".to_string()),
        ];
        let report = RunReport::new(outcomes, &rows, "out.csv");
        let s = &report.summary;
        assert_eq!(s.metros_total, 2);
        assert_eq!(s.metros_scraped, 1);
        assert_eq!(s.metros_skipped, 1);
        assert_eq!(s.metros_written, 1);
        assert_eq!(s.rows_written, 2);
        assert_eq!((s.min_year, s.max_year), (Some(1990), Some(1991)));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = RunReport::new(
            vec![MetroOutcome::skipped(&miami(), "source unavailable: HTTP error: 404".into())],
            &[],
            "out.csv",
        );
        let json = report.to_json().expect("report should serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["outcomes"][0]["status"], "Skipped");
        assert_eq!(value["summary"]["rows_written"], 0);
        assert!(value["summary"]["min_year"].is_null());
    }
}
