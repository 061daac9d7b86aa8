//! CSV persistence of the `Metro,Year,Population` table.
//!
//! Writing always truncates the target, so re-running with the same input
//! produces a byte-identical file.

use std::io::{Read, Write};
use std::path::Path;

use crate::model::{Observation, PipelineError};

/// Writes `rows` with a `Metro,Year,Population` header, replacing `path`.
pub fn write_csv(path: &Path, rows: &[Observation]) -> Result<(), PipelineError> {
    let file = std::fs::File::create(path)
        .map_err(|e| PipelineError::Io(format!("cannot create {}: {}", path.display(), e)))?;
    write_rows(file, rows)
}

/// Writes `rows` as CSV to any writer.
pub fn write_rows<W: Write>(writer: W, rows: &[Observation]) -> Result<(), PipelineError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        // serde only emits the header alongside the first record.
        csv_writer.write_record(["Metro", "Year", "Population"])?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Reads a table previously written by `write_csv`.
pub fn read_csv(path: &Path) -> Result<Vec<Observation>, PipelineError> {
    let file = std::fs::File::open(path)
        .map_err(|e| PipelineError::Io(format!("cannot open {}: {}", path.display(), e)))?;
    read_rows(file)
}

/// Reads `Metro,Year,Population` records from any reader.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Observation>, PipelineError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in csv_reader.deserialize() {
        let row: Observation = record?;
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
