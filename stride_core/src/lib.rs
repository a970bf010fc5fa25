#![forbid(unsafe_code)]

//! Core domain model and business logic for the Stride athlete level system.
//!
//! This crate provides:
//! - Domain types (daily logs, body metrics, profiles, tiers)
//! - The level engine
//! - Ingestion checks
//! - Persistence (JSONL log store, CSV archive, profile and level state)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod ingest;
pub mod log_store;
pub mod csv_rollup;
pub mod history;
pub mod profile;
pub mod state;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, ScoringConfig};
pub use log_store::{DailyLogSink, JsonlLogStore};
pub use history::load_logs;
pub use state::{detect_level_up, LevelState, LevelUp};
pub use engine::{compute_level, compute_level_with};
