//! Append-only store for daily logs.
//!
//! Logs are appended to a JSONL (JSON Lines) file with file locking
//! to ensure safe concurrent access. A day can be logged only once.

use crate::{DailyLog, Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Log sink trait for persisting daily logs
pub trait DailyLogSink {
    fn append(&mut self, log: &DailyLog) -> Result<()>;
}

/// JSONL-based daily log store with file locking
pub struct JsonlLogStore {
    path: PathBuf,
}

impl JsonlLogStore {
    /// Create a new JSONL store for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl DailyLogSink for JsonlLogStore {
    fn append(&mut self, log: &DailyLog) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // Hold the exclusive lock across the duplicate check and the write
        file.lock_exclusive()?;

        let result = append_locked(&file, log);

        file.unlock()?;
        result?;

        tracing::debug!("Appended daily log for {}", log.date);
        Ok(())
    }
}

fn append_locked(file: &File, log: &DailyLog) -> Result<()> {
    let mut contents = String::new();
    BufReader::new(file).read_to_string(&mut contents)?;

    if parse_logs(&contents).iter().any(|existing| existing.date == log.date) {
        return Err(Error::DuplicateLog(log.date));
    }

    let mut writer = std::io::BufWriter::new(file);
    // Terminate a partial line left by an interrupted write
    if !contents.is_empty() && !contents.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    let line = serde_json::to_string(log)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read all daily logs from a JSONL file in file order
///
/// Malformed lines are skipped with a warning.
pub fn read_logs(path: &Path) -> Result<Vec<DailyLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Acquire shared lock for reading
    file.lock_shared()?;
    let mut contents = String::new();
    let read = BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    let logs = parse_logs(&contents);
    tracing::debug!("Read {} daily logs from {:?}", logs.len(), path);
    Ok(logs)
}

pub(crate) fn parse_logs(contents: &str) -> Vec<DailyLog> {
    let mut logs = Vec::new();

    for (line_num, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<DailyLog>(line) {
            Ok(log) => logs.push(log),
            Err(e) => {
                tracing::warn!("Failed to parse daily log at line {}: {}", line_num + 1, e);
            }
        }
    }

    logs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    #[test]
    fn test_append_and_read_single_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("daily_logs.jsonl");

        let mut store = JsonlLogStore::new(&path);
        store.append(&DailyLog::new(date(1), 90, 75)).unwrap();

        let logs = read_logs(&path).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].workout_score, 90);
        assert_eq!(logs[0].nutrition_score, 75);
    }

    #[test]
    fn test_append_preserves_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/daily_logs.jsonl");

        let mut store = JsonlLogStore::new(&path);
        for day in 1..=5 {
            store.append(&DailyLog::new(date(day), day as i32 * 10, 50)).unwrap();
        }

        let dates: Vec<NaiveDate> = read_logs(&path).unwrap().iter().map(|l| l.date).collect();
        assert_eq!(dates, (1..=5).map(date).collect::<Vec<_>>());
    }

    #[test]
    fn test_rejects_second_log_for_same_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("daily_logs.jsonl");

        let mut store = JsonlLogStore::new(&path);
        store.append(&DailyLog::new(date(3), 60, 60)).unwrap();

        match store.append(&DailyLog::new(date(3), 100, 100)) {
            Err(Error::DuplicateLog(d)) => assert_eq!(d, date(3)),
            other => panic!("Expected duplicate log error, got {:?}", other),
        }

        // First entry is untouched
        let logs = read_logs(&path).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].workout_score, 60);
    }

    #[test]
    fn test_skips_malformed_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("daily_logs.jsonl");

        std::fs::write(
            &path,
            "{\"date\":\"2024-02-01\",\"workout_score\":80,\"nutrition_score\":70}\n\
             { not json }\n\
             \n\
             {\"date\":\"2024-02-02\",\"workout_score\":40,\"nutrition_score\":90,\"steps\":9000}\n",
        )
        .unwrap();

        let logs = read_logs(&path).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].steps, Some(9000));
    }

    #[test]
    fn test_append_after_partial_line() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("daily_logs.jsonl");
        std::fs::write(&path, "{\"date\":\"2024-02-01\",\"workout_sc").unwrap();

        JsonlLogStore::new(&path)
            .append(&DailyLog::new(date(2), 70, 70))
            .unwrap();

        let logs = read_logs(&path).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].date, date(2));
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let logs = read_logs(&temp_dir.path().join("missing.jsonl")).unwrap();
        assert!(logs.is_empty());
    }
}
