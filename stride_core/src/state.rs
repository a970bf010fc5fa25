//! Persisted display state and level-up detection.
//!
//! The engine never remembers previous results. Consumers that want to
//! celebrate a promotion keep the last tier they showed here and compare
//! it against each new result.

use crate::{Error, LevelResult, Result, Tier};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Last level result shown to the user
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct LevelState {
    pub last_tier: Option<Tier>,
    pub last_score: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A promotion between two tiers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelUp {
    pub from: Tier,
    pub to: Tier,
}

/// Compare the previously displayed tier with a newly computed one
///
/// Only a strict promotion over a known previous tier counts. The first
/// result ever shown establishes a baseline, and demotions are silent.
pub fn detect_level_up(previous: Option<Tier>, current: Tier) -> Option<LevelUp> {
    match previous {
        Some(from) if current > from => Some(LevelUp { from, to: current }),
        _ => None,
    }
}

impl LevelState {
    /// Load level state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No level state found, starting fresh");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open level state {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock level state {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        if let Err(e) = read {
            tracing::warn!(
                "Failed to read level state {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        match serde_json::from_str::<LevelState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded level state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse level state {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save level state atomically with exclusive locking
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("State path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved level state to {:?}", path);
        Ok(())
    }

    /// Record a freshly displayed result, returning the promotion if any
    pub fn record(&mut self, result: &LevelResult, now: DateTime<Utc>) -> Option<LevelUp> {
        let level_up = detect_level_up(self.last_tier, result.status);
        if let Some(ref up) = level_up {
            tracing::info!("Level up: {} -> {}", up.from, up.to);
        }

        self.last_tier = Some(result.status);
        self.last_score = Some(result.score);
        self.updated_at = Some(now);
        level_up
    }
}
