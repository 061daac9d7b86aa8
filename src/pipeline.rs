//! Pipeline orchestration.
//!
//! `run` scrapes every configured metro, interpolates annual values and
//! writes the table. `update` merges configured estimates into an existing
//! table, replacing everything after the cutoff year. Both are a straight
//! sequence of pure transformations between one read and one write.

use std::path::Path;
use std::thread;

use crate::analysis::groupings::{duplicate_count, group_by_metro};
use crate::analysis::interpolate::{interpolate, interpolate_all, Rounding};
use crate::assemble::{
    ensure_unique_years, filter_year_range, merge_across_metros, merge_replacing_after, sort,
};
use crate::config::{Config, PipelineSettings};
use crate::ingest::{scrape_metro, PageSource};
use crate::logging::{self, Stage};
use crate::metros::{find_metro, MetroSource};
use crate::model::{Observation, PipelineError, Series};
use crate::report::{MetroOutcome, OutcomeStatus, RunReport};
use crate::sink::{read_csv, write_csv};

// ---------------------------------------------------------------------------
// Scraping
// ---------------------------------------------------------------------------

/// Raw observations from every metro plus what happened to each one.
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    pub observations: Vec<Observation>,
    pub outcomes: Vec<MetroOutcome>,
}

impl ScrapeOutput {
    pub fn scraped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Scraped)
            .count()
    }
}

/// Scrapes every configured metro in order, pausing between requests.
///
/// Never fails: metros whose page cannot be used are recorded as skipped.
pub fn scrape_all(source: &dyn PageSource, config: &Config) -> ScrapeOutput {
    let schema = config.schema();
    let delay = config.request_delay();
    let total = config.metros.len();

    let mut observations = Vec::new();
    let mut outcomes = Vec::with_capacity(total);

    for (i, metro) in config.metros.iter().enumerate() {
        let extraction = scrape_metro(source, metro, &config.pipeline.table_class, &schema);
        outcomes.push(MetroOutcome::from_extraction(metro, &extraction));
        observations.extend(extraction.into_observations());

        // No pause after the last request.
        if i + 1 < total && !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    let output = ScrapeOutput { observations, outcomes };
    let scraped = output.scraped_count();
    logging::log_run_summary(total, scraped, total - scraped);
    output
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Turns raw observations into the sorted, filtered output table.
pub fn build_dataset(
    observations: &[Observation],
    settings: &PipelineSettings,
) -> Result<Vec<Observation>, PipelineError> {
    let series = group_by_metro(observations);

    let dropped = duplicate_count(observations, &series);
    if dropped > 0 {
        logging::debug(
            Stage::Assemble,
            None,
            &format!("Dropped {} repeated census years", dropped),
        );
    }

    let series = if settings.interpolate {
        let interpolated = interpolate_all(&series, settings.rounding);
        let points: usize = interpolated.iter().map(Series::len).sum();
        logging::info(
            Stage::Interpolate,
            None,
            &format!("✓ Interpolated to {} annual data points", points),
        );
        interpolated
    } else {
        series
    };

    let rows = sort(merge_across_metros(&series));
    let rows = filter_year_range(
        rows,
        settings.min_year.unwrap_or(i32::MIN),
        settings.max_year.unwrap_or(i32::MAX),
    );
    ensure_unique_years(&rows)?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Scrapes, assembles and writes the full table.
///
/// Returns `NoUsableMetros` without touching the output file when no metro
/// produced data (or every row fell outside the year range).
pub fn run(config: &Config, source: &dyn PageSource) -> Result<(RunReport, Vec<Observation>), PipelineError> {
    let scraped = scrape_all(source, config);
    if scraped.observations.is_empty() {
        return Err(PipelineError::NoUsableMetros);
    }

    logging::info(
        Stage::Assemble,
        None,
        &format!(
            "✓ Combined data for {} metros ({} census data points)",
            scraped.scraped_count(),
            scraped.observations.len()
        ),
    );

    let rows = build_dataset(&scraped.observations, &config.pipeline)?;
    if rows.is_empty() {
        return Err(PipelineError::NoUsableMetros);
    }

    finish(config, scraped.outcomes, rows)
}

// ---------------------------------------------------------------------------
// Estimate update
// ---------------------------------------------------------------------------

/// Builds post-cutoff rows for every metro with estimates.
///
/// Each metro's persisted row at `cutoff_year` is the anchor; the series
/// from the anchor through the estimates is interpolated (if enabled) and
/// only years after the cutoff are kept. Metros without an anchor row are
/// skipped.
pub fn build_update_rows(
    existing: &[Observation],
    estimates: &[Observation],
    metros: &[MetroSource],
    cutoff_year: i32,
    interpolate_years: bool,
    rounding: Rounding,
) -> (Vec<Observation>, Vec<MetroOutcome>) {
    let mut rows = Vec::new();
    let mut outcomes = Vec::new();

    for estimate_series in group_by_metro(estimates) {
        let name = estimate_series.metro();
        let metro = find_metro(metros, name)
            .cloned()
            .unwrap_or_else(|| MetroSource::new(name, ""));

        let anchor = existing
            .iter()
            .find(|row| row.metro == name && row.year == cutoff_year);
        let Some(anchor) = anchor else {
            let reason = format!("no {} row to anchor estimates", cutoff_year);
            logging::warn(Stage::Assemble, Some(name), &reason);
            outcomes.push(MetroOutcome::skipped(&metro, reason));
            continue;
        };

        let mut points = vec![anchor.clone()];
        points.extend(estimate_series.points().iter().cloned());
        let series = Series::from_observations(name, &points);
        let series = if interpolate_years {
            interpolate(&series, rounding)
        } else {
            series
        };

        let fresh: Vec<Observation> = series
            .into_points()
            .into_iter()
            .filter(|row| row.year > cutoff_year)
            .collect();
        outcomes.push(MetroOutcome::scraped(&metro, estimate_series.points()));
        rows.extend(fresh);
    }

    (rows, outcomes)
}

/// Merges configured estimates into the persisted table.
pub fn update(config: &Config) -> Result<(RunReport, Vec<Observation>), PipelineError> {
    let cutoff_year = config.update.cutoff_year;
    let estimates = config.estimate_observations();
    if estimates.is_empty() {
        return Err(PipelineError::Config("no [[estimate]] entries to merge".to_string()));
    }

    let existing = read_csv(Path::new(&config.pipeline.output_file))?;
    logging::info(
        Stage::Sink,
        None,
        &format!("Read {} rows from {}", existing.len(), config.pipeline.output_file),
    );

    let (fresh, outcomes) = build_update_rows(
        &existing,
        &estimates,
        &config.metros,
        cutoff_year,
        config.pipeline.interpolate,
        config.pipeline.rounding,
    );
    if fresh.is_empty() {
        return Err(PipelineError::NoUsableMetros);
    }

    logging::info(
        Stage::Assemble,
        None,
        &format!("✓ Replacing rows after {} with {} new rows", cutoff_year, fresh.len()),
    );
    let rows = sort(merge_replacing_after(existing, fresh, cutoff_year));
    ensure_unique_years(&rows)?;

    finish(config, outcomes, rows)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn finish(
    config: &Config,
    outcomes: Vec<MetroOutcome>,
    rows: Vec<Observation>,
) -> Result<(RunReport, Vec<Observation>), PipelineError> {
    let output_file = &config.pipeline.output_file;
    write_csv(Path::new(output_file), &rows)?;
    logging::info(Stage::Sink, None, &format!("✓ Data saved to {}", output_file));

    let report = RunReport::new(outcomes, &rows, output_file);
    if let Some(report_file) = &config.pipeline.report_file {
        report.write_json(Path::new(report_file))?;
        logging::info(Stage::Sink, None, &format!("✓ Report saved to {}", report_file));
    }

    Ok((report, rows))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
