//! Daily log history loading.
//!
//! This module merges the live JSONL store with the CSV archive into one
//! ordered sequence for the level engine.

use crate::csv_rollup::CsvRow;
use crate::{DailyLog, Result};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::path::Path;

/// Load every daily log from both the JSONL store and the CSV archive
///
/// Returns logs sorted by date, oldest first. A day present in both
/// sources keeps the JSONL copy. The store is read before the archive, so a
/// rollup running in between moves days into a source not yet read.
pub fn load_logs(jsonl_path: &Path, csv_path: &Path) -> Result<Vec<DailyLog>> {
    let mut by_date = BTreeMap::new();

    if jsonl_path.exists() {
        let live = crate::log_store::read_logs(jsonl_path)?;
        tracing::debug!("Loaded {} daily logs from JSONL", live.len());
        for log in live {
            by_date.insert(log.date, log);
        }
    }

    if csv_path.exists() {
        let archived = load_logs_from_csv(csv_path)?;
        tracing::debug!("Loaded {} daily logs from CSV", archived.len());
        for log in archived {
            by_date.entry(log.date).or_insert(log);
        }
    }

    let logs: Vec<DailyLog> = by_date.into_values().collect();
    tracing::info!("Loaded {} daily logs", logs.len());
    Ok(logs)
}

/// Load all logs from the CSV archive
fn load_logs_from_csv(path: &Path) -> Result<Vec<DailyLog>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut logs = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => logs.push(DailyLog::from(row)),
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(logs)
}
