//! Error types for the stride_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stride_core operations
///
/// The level engine itself never fails; these errors come from the
/// stores, configuration and ingestion checks around it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile store error
    #[error("Profile error: {0}")]
    Profile(String),

    /// Level state management error
    #[error("State error: {0}")]
    State(String),

    /// A daily log already exists for this day
    #[error("A daily log for {0} already exists")]
    DuplicateLog(NaiveDate),

    /// Input rejected at the ingestion boundary
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
