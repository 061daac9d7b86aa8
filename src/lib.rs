//! Metro population time series.
//!
//! Scrapes census tables for a configured list of metropolitan areas,
//! interpolates annual values between census years, and writes a
//! `Metro,Year,Population` table.
//!
//! Pipeline, leaf-first:
//! - `ingest` fetches each metro's page and scans out its census table.
//! - `extract` turns table cells into observations.
//! - `analysis` groups observations per metro and interpolates.
//! - `assemble` merges, sorts and trims the flat table.
//! - `sink` writes (and reads back) the CSV.
//! - `pipeline` strings these together for the `run` and `update` commands.

pub mod analysis;
pub mod assemble;
pub mod config;
pub mod dev_mode;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod metros;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod sink;
