//! CSV rollup for archiving the daily log store.
//!
//! This module implements atomic JSONL-to-CSV conversion with proper error
//! handling to prevent data loss.

use crate::{DailyLog, MacroTotals, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    date: NaiveDate,
    workout_score: i32,
    nutrition_score: i32,
    sleep_hours: Option<f64>,
    resting_heart_rate: Option<u16>,
    mood: Option<u8>,
    steps: Option<u32>,
    water_intake: Option<f64>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
}

impl From<&DailyLog> for CsvRow {
    fn from(log: &DailyLog) -> Self {
        let macros = log.macros.as_ref();
        CsvRow {
            date: log.date,
            workout_score: log.workout_score,
            nutrition_score: log.nutrition_score,
            sleep_hours: log.sleep_hours,
            resting_heart_rate: log.resting_heart_rate,
            mood: log.mood,
            steps: log.steps,
            water_intake: log.water_intake,
            calories: macros.map(|m| m.calories),
            protein: macros.map(|m| m.protein),
            carbs: macros.map(|m| m.carbs),
            fat: macros.map(|m| m.fat),
        }
    }
}

impl From<CsvRow> for DailyLog {
    fn from(row: CsvRow) -> Self {
        let has_macros = row.calories.is_some()
            || row.protein.is_some()
            || row.carbs.is_some()
            || row.fat.is_some();
        let macros = has_macros.then(|| MacroTotals {
            calories: row.calories.unwrap_or_default(),
            protein: row.protein.unwrap_or_default(),
            carbs: row.carbs.unwrap_or_default(),
            fat: row.fat.unwrap_or_default(),
        });

        DailyLog {
            date: row.date,
            workout_score: row.workout_score,
            nutrition_score: row.nutrition_score,
            sleep_hours: row.sleep_hours,
            resting_heart_rate: row.resting_heart_rate,
            mood: row.mood,
            steps: row.steps,
            water_intake: row.water_intake,
            macros,
        }
    }
}

/// Roll up the JSONL log store into CSV and archive it atomically
///
/// This function:
/// 1. Takes an exclusive lock on the JSONL store
/// 2. Appends its logs to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Copies the JSONL contents to `.jsonl.processed`
/// 5. Truncates the JSONL store
/// 6. Returns the number of logs processed
///
/// The lock is held until the store is empty again. A writer that opened
/// the store before the rollup appends to the same (now empty) file once it
/// gets the lock, so no day can land in the archive copy only.
pub fn logs_to_csv_and_archive(jsonl_path: &Path, csv_path: &Path) -> Result<usize> {
    if !jsonl_path.exists() {
        return Ok(0);
    }

    let mut file = OpenOptions::new().read(true).write(true).open(jsonl_path)?;
    file.lock_exclusive()?;

    let result = archive_locked(&mut file, jsonl_path, csv_path);

    file.unlock()?;
    result
}

fn archive_locked(file: &mut File, jsonl_path: &Path, csv_path: &Path) -> Result<usize> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let logs = crate::log_store::parse_logs(&contents);
    if logs.is_empty() {
        tracing::info!("No daily logs to roll up");
        return Ok(0);
    }

    append_to_csv(csv_path, &logs)?;
    tracing::info!("Wrote {} daily logs to CSV", logs.len());

    let processed_path = jsonl_path.with_extension("jsonl.processed");
    let mut archive = File::create(&processed_path)?;
    archive.write_all(contents.as_bytes())?;
    archive.sync_all()?;

    file.set_len(0)?;
    file.sync_all()?;

    tracing::info!("Archived log store to {:?}", processed_path);

    Ok(logs.len())
}

fn append_to_csv(csv_path: &Path, logs: &[DailyLog]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only on the first write to a fresh file
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for log in logs {
        writer.serialize(CsvRow::from(log))?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;
    Ok(())
}

/// Remove archived `.processed` log files from a directory
pub fn cleanup_processed(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed log file: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed log files", count);
    }

    Ok(count)
}
