/// Series shaping for the metro population pipeline.
///
/// This module turns the flat list of scraped observations into per-metro
/// annual series.
///
/// Submodules:
/// - `groupings`: organizes flat extraction output into per-metro series.
/// - `interpolate`: fills the years between known census points.

pub mod groupings;
pub mod interpolate;
