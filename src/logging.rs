/// Structured logging for the metro population pipeline
///
/// Provides context-rich logging tagged with the pipeline stage and, where
/// relevant, the metro being processed. Supports both console output and
/// appending to a log file for scheduled runs.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::ScrapeError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Interpolate,
    Assemble,
    Sink,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "FETCH"),
            Stage::Extract => write!(f, "EXTRACT"),
            Stage::Interpolate => write!(f, "INTERP"),
            Stage::Assemble => write!(f, "ASSEMBLE"),
            Stage::Sink => write!(f, "SINK"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - page exists but carries no census table
    Expected,
    /// Unexpected failure - indicates a host problem or a bad URL in the config
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut global) = LOGGER.lock() {
            *global = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, stage: Stage, metro: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let metro_part = metro.map(|m| format!(" [{}]", m)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, metro_part, message)
    }

    fn log(&self, level: LogLevel, stage: Stage, metro: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, stage, metro, message);
        let metro_part = metro.map(|m| format!(" [{}]", m)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("  ✗ {}{}: {}", stage, metro_part, message),
                LogLevel::Warning => eprintln!("  ⚠️  {}{}: {}", stage, metro_part, message),
                LogLevel::Info => println!("  {}", message),
                LogLevel::Debug => println!("  [DEBUG] {}{}: {}", stage, metro_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn log_global(level: LogLevel, stage: Stage, metro: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, metro, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(stage: Stage, metro: Option<&str>, message: &str) {
    log_global(LogLevel::Info, stage, metro, message);
}

/// Log a warning message
pub fn warn(stage: Stage, metro: Option<&str>, message: &str) {
    log_global(LogLevel::Warning, stage, metro, message);
}

/// Log an error message
pub fn error(stage: Stage, metro: Option<&str>, message: &str) {
    log_global(LogLevel::Error, stage, metro, message);
}

/// Log a debug message
pub fn debug(stage: Stage, metro: Option<&str>, message: &str) {
    log_global(LogLevel::Debug, stage, metro, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a page fetch failure.
pub fn classify_scrape_failure(err: &ScrapeError) -> FailureType {
    match err {
        // Pages without a census table are common; the metro just has no data.
        ScrapeError::TableNotFound(_) => FailureType::Expected,
        // 404/410 point at a stale URL in the config; 5xx and 403 at the host.
        ScrapeError::Http(_) => FailureType::Unexpected,
        ScrapeError::Request(msg) if msg.contains("timed out") => FailureType::Unexpected,
        ScrapeError::Request(_) | ScrapeError::Io(_) => FailureType::Unknown,
    }
}

/// Log a per-metro scrape failure with automatic classification.
pub fn log_scrape_failure(metro: &str, err: &ScrapeError) {
    let failure_type = classify_scrape_failure(err);
    let message = format!("scrape failed [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => warn(Stage::Fetch, Some(metro), &message),
        FailureType::Unexpected => error(Stage::Fetch, Some(metro), &message),
        FailureType::Unknown => warn(Stage::Fetch, Some(metro), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a scrape pass over all configured metros.
pub fn log_run_summary(total: usize, scraped: usize, skipped: usize) {
    let message = format!(
        "Scrape complete: {}/{} metros scraped, {} skipped",
        scraped, total, skipped
    );

    if skipped == 0 {
        info(Stage::System, None, &message);
    } else if scraped == 0 {
        error(Stage::System, None, &message);
    } else {
        warn(Stage::System, None, &message);
    }
}
