//! Census table → observation extraction.
//!
//! Turns the text cells of one scraped table into `(metro, year,
//! population)` observations. Extraction never fails: a table that cannot
//! be used yields `Extraction::Empty` with the reason, and the caller moves
//! on to the next metro.

use std::fmt;

use crate::model::{Observation, RawTable};

/// Placeholder some tables put in cells with no census count.
const EM_DASH: &str = "—";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Header names of the two columns the extractor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusSchema {
    pub period_column: String,
    pub count_column: String,
}

impl CensusSchema {
    pub fn new(period_column: &str, count_column: &str) -> Self {
        CensusSchema {
            period_column: period_column.to_string(),
            count_column: count_column.to_string(),
        }
    }
}

impl Default for CensusSchema {
    fn default() -> Self {
        CensusSchema::new("Census", "Pop.")
    }
}

// ---------------------------------------------------------------------------
// Extraction result
// ---------------------------------------------------------------------------

/// Why a source produced no observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// The page could not be fetched.
    Unavailable(String),
    /// The page has no census table.
    TableNotFound,
    /// The table lacks one or more expected columns.
    SchemaMismatch { missing: Vec<String> },
    /// The table has a header but no data rows.
    NoDataRows,
    /// Every data row had an unparseable year or count.
    NoUsableRows,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::Unavailable(msg) => write!(f, "source unavailable: {}", msg),
            EmptyReason::TableNotFound => write!(f, "could not find census table"),
            EmptyReason::SchemaMismatch { missing } => {
                write!(f, "expected columns not found: {}", missing.join(", "))
            }
            EmptyReason::NoDataRows => write!(f, "no data rows found"),
            EmptyReason::NoUsableRows => write!(f, "no rows with a parseable year and count"),
        }
    }
}

/// Outcome of extracting one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Rows(Vec<Observation>),
    Empty(EmptyReason),
}

impl Extraction {
    pub fn observations(&self) -> &[Observation] {
        match self {
            Extraction::Rows(rows) => rows,
            Extraction::Empty(_) => &[],
        }
    }

    pub fn into_observations(self) -> Vec<Observation> {
        match self {
            Extraction::Rows(rows) => rows,
            Extraction::Empty(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.observations().is_empty()
    }

    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            Extraction::Rows(_) => None,
            Extraction::Empty(reason) => Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell parsing
// ---------------------------------------------------------------------------

/// Extracts the first run of four consecutive digits, e.g. "2024 (est.)" → 2024.
pub fn parse_year(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|start| text[start..start + 4].parse().ok())
}

/// Parses a population count, ignoring separators and any other non-digits.
///
/// Returns `None` for empty cells, the em-dash placeholder, and values
/// with no digits or too many to fit.
pub fn parse_count(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || text == EM_DASH {
        return None;
    }
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// Table extraction
// ---------------------------------------------------------------------------

fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}

/// Reads `schema`'s period and count columns out of `table`.
///
/// Rows missing either value are dropped. Observations come back in table
/// order; callers sort them when building a `Series`.
pub fn extract(metro: &str, table: &RawTable, schema: &CensusSchema) -> Extraction {
    let Some(header) = table.header() else {
        return Extraction::Empty(EmptyReason::NoDataRows);
    };

    let period_idx = column_index(header, &schema.period_column);
    let count_idx = column_index(header, &schema.count_column);

    let (period_idx, count_idx) = match (period_idx, count_idx) {
        (Some(p), Some(c)) => (p, c),
        _ => {
            let mut missing = Vec::new();
            if period_idx.is_none() {
                missing.push(schema.period_column.clone());
            }
            if count_idx.is_none() {
                missing.push(schema.count_column.clone());
            }
            return Extraction::Empty(EmptyReason::SchemaMismatch { missing });
        }
    };

    let data_rows = table.data_rows();
    if data_rows.is_empty() {
        return Extraction::Empty(EmptyReason::NoDataRows);
    }

    let observations: Vec<Observation> = data_rows
        .iter()
        .filter_map(|row| {
            let year = parse_year(row.get(period_idx)?)?;
            let population = parse_count(row.get(count_idx)?)?;
            Some(Observation::new(metro, year, population))
        })
        .collect();

    if observations.is_empty() {
        Extraction::Empty(EmptyReason::NoUsableRows)
    } else {
        Extraction::Rows(observations)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    // --- parse_year ---------------------------------------------------------

    #[test]
    fn test_parse_year_plain() {
        assert_eq!(parse_year("1990"), Some(1990));
    }

    #[test]
    fn test_parse_year_strips_qualifiers() {
        assert_eq!(parse_year("2024 (est.)"), Some(2024));
        assert_eq!(parse_year("Est. 2023[5]"), Some(2023));
    }

    #[test]
    fn test_parse_year_takes_first_four_digit_run() {
        assert_eq!(parse_year("19501"), Some(1950));
        assert_eq!(parse_year("1 in 2010"), Some(2010));
    }

    #[test]
    fn test_parse_year_without_four_digits_is_none() {
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("U.S. Decennial Census"), None);
        assert_eq!(parse_year("190"), None);
        assert_eq!(parse_year("19 90"), None);
    }

    // --- parse_count --------------------------------------------------------

    #[test]
    fn test_parse_count_strips_separators() {
        assert_eq!(parse_count("5,286,728"), Some(5_286_728));
        assert_eq!(parse_count(" 1 234 "), Some(1234));
    }

    #[test]
    fn test_parse_count_placeholders_are_none() {
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("   "), None);
        assert_eq!(parse_count("—"), None);
        assert_eq!(parse_count("n/a"), None);
    }

    #[test]
    fn test_parse_count_overflow_is_none() {
        assert_eq!(parse_count("99999999999999999999999"), None);
    }

    // --- extract ------------------------------------------------------------

    #[test]
    fn test_extract_reads_schema_columns() {
        let t = table(&[
            &["Census", "Pop.", "Note", "%±"],
            &["1990", "3,069,411", "", "—"],
            &["2000", "4,263,438", "", "38.9%"],
            &["2024 (est.)", "6,409,047", "", "4.9%"],
        ]);
        let result = extract("Atlanta", &t, &CensusSchema::default());
        assert_eq!(
            result,
            Extraction::Rows(vec![
                Observation::new("Atlanta", 1990, 3_069_411),
                Observation::new("Atlanta", 2000, 4_263_438),
                Observation::new("Atlanta", 2024, 6_409_047),
            ])
        );
    }

    #[test]
    fn test_extract_drops_unparseable_and_short_rows() {
        let t = table(&[
            &["Pop.", "Census"],
            &["—", "1970"],
            &["2,250,000", "1980"],
            &["1,000"],
            &["U.S. Decennial Census", "source"],
        ]);
        let result = extract("Charlotte", &t, &CensusSchema::default());
        assert_eq!(result.observations(), &[Observation::new("Charlotte", 1980, 2_250_000)]);
    }

    #[test]
    fn test_extract_missing_columns_is_schema_mismatch() {
        let t = table(&[&["Year", "Population"], &["2010", "100"]]);
        let result = extract("Phoenix", &t, &CensusSchema::default());
        assert!(result.is_empty());
        assert_eq!(
            result.empty_reason(),
            Some(&EmptyReason::SchemaMismatch {
                missing: vec!["Census".to_string(), "Pop.".to_string()]
            })
        );
    }

    #[test]
    fn test_extract_empty_table_is_no_data() {
        let result = extract("Miami", &RawTable::default(), &CensusSchema::default());
        assert_eq!(result, Extraction::Empty(EmptyReason::NoDataRows));
    }

    #[test]
    fn test_extract_header_only_is_no_data() {
        let t = table(&[&["Census", "Pop."]]);
        let result = extract("Miami", &t, &CensusSchema::default());
        assert_eq!(result, Extraction::Empty(EmptyReason::NoDataRows));
    }

    #[test]
    fn test_extract_all_rows_unparseable_is_no_usable_rows() {
        let t = table(&[&["Census", "Pop."], &["n.d.", "—"]]);
        let result = extract("Miami", &t, &CensusSchema::default());
        assert_eq!(result, Extraction::Empty(EmptyReason::NoUsableRows));
        assert!(result.into_observations().is_empty());
    }

    #[test]
    fn test_extract_honors_custom_schema() {
        let t = table(&[&["Year", "Population"], &["2010", "2,217,012"]]);
        let schema = CensusSchema::new("Year", "Population");
        let result = extract("Charlotte", &t, &schema);
        assert_eq!(result.observations().len(), 1);
    }

    #[test]
    fn test_empty_reason_messages() {
        let reason = EmptyReason::SchemaMismatch { missing: vec!["Pop.".into()] };
        assert_eq!(reason.to_string(), "expected columns not found: Pop.");
        assert_eq!(EmptyReason::NoDataRows.to_string(), "no data rows found");
    }
}
