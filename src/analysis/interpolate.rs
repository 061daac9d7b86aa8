//! Linear interpolation of sparse census points into annual series.
//!
//! For each consecutive pair of known points `(yA, pA) → (yB, pB)`, every
//! year `y` in `[yA, yB)` gets `pA + (pB - pA) * (y - yA) / (yB - yA)`. The
//! end year of a pair is produced as the start of the next pair, and the
//! last known point is copied through unchanged, so every known point
//! keeps its recorded value.
//!
//! Values are computed in exact integer arithmetic. With
//! `Rounding::Truncate` (the default) the result is floored, which matches
//! previously published tables; `Rounding::Nearest` rounds half up.

use serde::Deserialize;

use crate::model::{Observation, Series};

/// How fractional interpolated values become whole people.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    #[default]
    Truncate,
    Nearest,
}

/// Expands `series` to one observation per year from its first to its last
/// known year.
///
/// A single-point series comes back unchanged; an empty one stays empty.
pub fn interpolate(series: &Series, rounding: Rounding) -> Series {
    let points = series.points();
    let Some(last) = points.last() else {
        return series.clone();
    };

    let mut rows = Vec::new();
    for pair in points.windows(2) {
        let (start, end) = (&pair[0], &pair[1]);
        for year in start.year..end.year {
            rows.push(Observation::new(
                series.metro(),
                year,
                value_at(start, end, year, rounding),
            ));
        }
    }
    rows.push(last.clone());

    Series::from_observations(series.metro(), &rows)
}

/// Interpolates every series.
pub fn interpolate_all(series: &[Series], rounding: Rounding) -> Vec<Series> {
    series.iter().map(|s| interpolate(s, rounding)).collect()
}

/// Population at `year`, where `start.year <= year < end.year`.
fn value_at(start: &Observation, end: &Observation, year: i32, rounding: Rounding) -> u64 {
    let span = i128::from(end.year) - i128::from(start.year);
    let offset = i128::from(year) - i128::from(start.year);
    let from = i128::from(start.population);
    let to = i128::from(end.population);

    // from * span + (to - from) * offset is a weighted sum of two
    // non-negative values, so it never goes below zero.
    let numerator = from * span + (to - from) * offset;
    let value = match rounding {
        Rounding::Truncate => numerator / span,
        Rounding::Nearest => (2 * numerator + span) / (2 * span),
    };

    // Bounded by max(from, to), which came from a u64.
    u64::try_from(value).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i32, u64)]) -> Series {
        let obs: Vec<Observation> = points
            .iter()
            .map(|&(year, pop)| Observation::new("Dallas", year, pop))
            .collect();
        Series::from_observations("Dallas", &obs)
    }

    fn pairs(series: &Series) -> Vec<(i32, u64)> {
        series.points().iter().map(|o| (o.year, o.population)).collect()
    }

    #[test]
    fn test_even_increment_is_exact() {
        let result = interpolate(&series(&[(2020, 100), (2024, 500)]), Rounding::Truncate);
        assert_eq!(
            pairs(&result),
            vec![(2020, 100), (2021, 200), (2022, 300), (2023, 400), (2024, 500)]
        );
    }

    #[test]
    fn test_single_year_gap_has_no_intermediate_rows() {
        let result = interpolate(&series(&[(2020, 7), (2021, 10)]), Rounding::Truncate);
        assert_eq!(pairs(&result), vec![(2020, 7), (2021, 10)]);
    }

    #[test]
    fn test_single_point_is_unchanged() {
        let result = interpolate(&series(&[(2020, 50)]), Rounding::Truncate);
        assert_eq!(pairs(&result), vec![(2020, 50)]);
    }

    #[test]
    fn test_empty_series_stays_empty() {
        assert!(interpolate(&series(&[]), Rounding::Truncate).is_empty());
    }

    #[test]
    fn test_truncates_fractional_values() {
        // 10 → 11 over 3 years gives 10.33 and 10.66.
        let result = interpolate(&series(&[(2000, 10), (2003, 11)]), Rounding::Truncate);
        assert_eq!(pairs(&result), vec![(2000, 10), (2001, 10), (2002, 10), (2003, 11)]);
    }

    #[test]
    fn test_nearest_rounds_half_up() {
        let result = interpolate(&series(&[(2000, 10), (2003, 11)]), Rounding::Nearest);
        assert_eq!(pairs(&result), vec![(2000, 10), (2001, 10), (2002, 11), (2003, 11)]);

        let result = interpolate(&series(&[(2000, 0), (2002, 1)]), Rounding::Nearest);
        assert_eq!(pairs(&result), vec![(2000, 0), (2001, 1), (2002, 1)]);
    }

    #[test]
    fn test_declining_population_floors_toward_lower_value() {
        // 100 → 90 over 4 years: 97.5, 95, 92.5
        let result = interpolate(&series(&[(2000, 100), (2004, 90)]), Rounding::Truncate);
        assert_eq!(
            pairs(&result),
            vec![(2000, 100), (2001, 97), (2002, 95), (2003, 92), (2004, 90)]
        );
    }

    #[test]
    fn test_irregular_spacing_covers_every_year() {
        let known = [(1950, 1_000), (1960, 2_000), (1970, 2_500), (1973, 2_800)];
        let result = interpolate(&series(&known), Rounding::Truncate);

        assert_eq!(result.len(), (1973 - 1950 + 1) as usize);
        let years: Vec<i32> = result.points().iter().map(|o| o.year).collect();
        assert_eq!(years, (1950..=1973).collect::<Vec<_>>());

        // Every known point keeps its recorded value.
        for &(year, pop) in &known {
            let row = result.points().iter().find(|o| o.year == year).expect("known year present");
            assert_eq!(row.population, pop, "year {}", year);
        }
        assert!(result.points().iter().all(|o| o.metro == "Dallas"));
    }

    #[test]
    fn test_matches_published_dallas_2021_estimate() {
        // 2020 census 7,637,387 → 2024 estimate 8,344,032; 2021 is 7,814,048.25.
        let result = interpolate(
            &series(&[(2020, 7_637_387), (2024, 8_344_032)]),
            Rounding::Truncate,
        );
        assert_eq!(result.points()[1].population, 7_814_048);
        assert_eq!(result.points()[4].population, 8_344_032);
    }

    #[test]
    fn test_exact_quotient_is_not_floored_below() {
        // 8,343,090 → 3,697,040 over 30 years; 27 years in is exactly 4,161,645.
        // Floating point lands just under it and would truncate to 4,161,644.
        let result = interpolate(
            &series(&[(1990, 8_343_090), (2020, 3_697_040)]),
            Rounding::Truncate,
        );
        let row = result.points().iter().find(|o| o.year == 2017).expect("2017 present");
        assert_eq!(row.population, 4_161_645);
    }

    #[test]
    fn test_interpolate_all_handles_each_metro() {
        let a = Series::from_observations(
            "Miami",
            &[Observation::new("Miami", 2010, 10), Observation::new("Miami", 2012, 20)],
        );
        let b = Series::from_observations("Phoenix", &[Observation::new("Phoenix", 2010, 5)]);
        let result = interpolate_all(&[a, b], Rounding::Truncate);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].len(), 3);
        assert_eq!(result[1].len(), 1);
    }
}
