//! Per-metro grouping of scraped observations.

use crate::model::{Observation, Series};

/// Groups a flat list of observations into one `Series` per metro.
///
/// Metros appear in order of their first observation. Each series is
/// year-sorted with duplicate years removed (first occurrence wins).
pub fn group_by_metro(observations: &[Observation]) -> Vec<Series> {
    let mut metros: Vec<&str> = Vec::new();
    for obs in observations {
        if !metros.contains(&obs.metro.as_str()) {
            metros.push(&obs.metro);
        }
    }

    metros
        .into_iter()
        .map(|metro| Series::from_observations(metro, observations))
        .collect()
}

/// Number of observations that grouping would discard as repeated years.
pub fn duplicate_count(observations: &[Observation], series: &[Series]) -> usize {
    let kept: usize = series.iter().map(Series::len).sum();
    observations.len().saturating_sub(kept)
}
