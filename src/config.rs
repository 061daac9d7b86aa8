/// Configuration loading for the metro population pipeline.
///
/// Settings live in a TOML file (default `metros.toml`) with a `[pipeline]`
/// table, an `[update]` table, and repeated `[[metro]]` / `[[estimate]]`
/// entries. The path can be overridden with `METRO_POP_CONFIG`, which may
/// be set in a `.env` file. When no file exists the copy of `metros.toml`
/// compiled into the binary is used instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::analysis::interpolate::Rounding;
use crate::extract::CensusSchema;
use crate::logging::LogLevel;
use crate::metros::{validate_metros, MetroSource};
use crate::model::{Observation, PipelineError};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "METRO_POP_CONFIG";

/// Used when `METRO_POP_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "metros.toml";

const BUNDLED_CONFIG: &str = include_str!("../metros.toml");

/// Sent with every page request; some hosts answer 403 to library agents.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Where the `Metro,Year,Population` table is written.
    pub output_file: String,
    /// Optional JSON run report.
    pub report_file: Option<String>,
    /// Fill intermediate years between census points.
    pub interpolate: bool,
    pub rounding: Rounding,
    /// Rows before this year are dropped from the output.
    pub min_year: Option<i32>,
    /// Rows after this year are dropped from the output.
    pub max_year: Option<i32>,
    /// Pause between consecutive page requests. Zero disables the pause.
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// CSS class identifying the census table on a page.
    pub table_class: String,
    pub period_column: String,
    pub count_column: String,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            output_file: "metro_population_data.csv".to_string(),
            report_file: None,
            interpolate: true,
            rounding: Rounding::Truncate,
            min_year: Some(1980),
            max_year: None,
            request_delay_ms: 1500,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            table_class: "us-census-pop".to_string(),
            period_column: "Census".to_string(),
            count_column: "Pop.".to_string(),
            log_level: LogLevel::Info,
            log_file: None,
            console_timestamps: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdateSettings {
    /// Persisted rows after this year are replaced by `update`.
    pub cutoff_year: i32,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        UpdateSettings { cutoff_year: 2020 }
    }
}

/// A fresh population estimate merged in by `update`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EstimateEntry {
    pub metro: String,
    pub year: i32,
    pub population: u64,
}

impl EstimateEntry {
    pub fn to_observation(&self) -> Observation {
        Observation::new(&self.metro, self.year, self.population)
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub update: UpdateSettings,
    #[serde(default, rename = "metro")]
    pub metros: Vec<MetroSource>,
    #[serde(default, rename = "estimate")]
    pub estimates: Vec<EstimateEntry>,
}

impl Config {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// The `metros.toml` compiled into the binary.
    pub fn bundled() -> Result<Self, PipelineError> {
        Self::from_toml_str(BUNDLED_CONFIG)
    }

    /// Loads `path` if it exists, otherwise falls back to the bundled copy.
    pub fn load_or_bundled(path: &Path) -> Result<Self, PipelineError> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::bundled()
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        let mut problems = validate_metros(&self.metros);

        if let (Some(min), Some(max)) = (self.pipeline.min_year, self.pipeline.max_year) {
            if min > max {
                problems.push(format!("min_year {} is after max_year {}", min, max));
            }
        }

        for estimate in &self.estimates {
            if !self.metros.iter().any(|m| m.name == estimate.metro) {
                problems.push(format!("estimate for unknown metro '{}'", estimate.metro));
            }
            if estimate.year <= self.update.cutoff_year {
                problems.push(format!(
                    "estimate for '{}' in {} is not after cutoff year {}",
                    estimate.metro, estimate.year, self.update.cutoff_year
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Config(problems.join("; ")))
        }
    }

    pub fn schema(&self) -> CensusSchema {
        CensusSchema::new(&self.pipeline.period_column, &self.pipeline.count_column)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.pipeline.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.timeout_secs)
    }

    pub fn estimate_observations(&self) -> Vec<Observation> {
        self.estimates.iter().map(|e| e.to_observation()).collect()
    }
}

/// Resolves the configuration path from `METRO_POP_CONFIG` (after loading
/// `.env`, if present), falling back to `metros.toml`.
pub fn config_path() -> PathBuf {
    dotenv::dotenv().ok();
    std::env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
