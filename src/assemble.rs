//! Dataset assembly: merging, ordering and trimming the flat row table.
//!
//! All functions take the table by value and return the new table, so the
//! pipeline reads as a straight sequence of transformations.

use crate::model::{Observation, PipelineError, Series};

/// Replaces every persisted row after `cutoff_year` with `new_rows`.
///
/// Existing rows with `year > cutoff_year` are dropped wholesale (for all
/// metros), then `new_rows` are appended. No per-row reconciliation is done.
pub fn merge_replacing_after(
    existing: Vec<Observation>,
    new_rows: Vec<Observation>,
    cutoff_year: i32,
) -> Vec<Observation> {
    let mut merged: Vec<Observation> = existing
        .into_iter()
        .filter(|row| row.year <= cutoff_year)
        .collect();
    merged.extend(new_rows);
    merged
}

/// Flattens per-metro series into one table, metro by metro.
pub fn merge_across_metros(series: &[Series]) -> Vec<Observation> {
    series
        .iter()
        .flat_map(|s| s.points().iter().cloned())
        .collect()
}

/// Orders rows by year ascending, then population descending.
///
/// Within a year the largest metro comes first. The sort is stable, so rows
/// with the same year and population keep their input order.
pub fn sort(mut rows: Vec<Observation>) -> Vec<Observation> {
    rows.sort_by(|a, b| {
        a.year
            .cmp(&b.year)
            .then_with(|| b.population.cmp(&a.population))
    });
    rows
}

/// Keeps rows with `min_year <= year <= max_year`.
pub fn filter_year_range(rows: Vec<Observation>, min_year: i32, max_year: i32) -> Vec<Observation> {
    rows.into_iter()
        .filter(|row| (min_year..=max_year).contains(&row.year))
        .collect()
}

/// First (metro, year) pair that occurs more than once, if any.
pub fn find_duplicate_year(rows: &[Observation]) -> Option<(String, i32)> {
    let mut seen = std::collections::HashSet::new();
    for row in rows {
        if !seen.insert((row.metro.as_str(), row.year)) {
            return Some((row.metro.clone(), row.year));
        }
    }
    None
}

/// Fails with `DuplicateYear` if any metro has two rows for one year.
pub fn ensure_unique_years(rows: &[Observation]) -> Result<(), PipelineError> {
    match find_duplicate_year(rows) {
        Some((metro, year)) => Err(PipelineError::DuplicateYear { metro, year }),
        None => Ok(()),
    }
}

/// Earliest and latest year in the table.
pub fn year_span(rows: &[Observation]) -> Option<(i32, i32)> {
    let min = rows.iter().map(|r| r.year).min()?;
    let max = rows.iter().map(|r| r.year).max()?;
    Some((min, max))
}

/// Number of distinct metros in the table.
pub fn metro_count(rows: &[Observation]) -> usize {
    rows.iter()
        .map(|r| r.metro.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
