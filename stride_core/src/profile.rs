//! User profile persistence with file locking.
//!
//! The profile holds the body metric history, the advanced health record
//! and the subscription tier. Unlike the level state, a profile that
//! cannot be parsed is reported instead of being replaced, since saving a
//! fresh profile over it would lose the metric history.

use crate::{
    AdvancedHealthData, BodyMetricLog, Error, Result, SubscriptionTier, UserProfile,
};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl UserProfile {
    /// Load a profile from a file with shared locking
    ///
    /// Returns a new profile if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No profile found at {:?}, starting a new one", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let profile = serde_json::from_str::<UserProfile>(&contents).map_err(|e| {
            Error::Profile(format!("Failed to parse profile {:?}: {}", path, e))
        })?;

        tracing::debug!("Loaded profile {} from {:?}", profile.id, path);
        Ok(profile)
    }

    /// Save the profile with exclusive locking
    ///
    /// Atomically writes the profile by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the existing file
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Profile(format!("Profile path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile {} to {:?}", self.id, path);
        Ok(())
    }

    /// Load the profile, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserProfile) -> Result<()>,
    {
        let mut profile = Self::load(path)?;
        f(&mut profile)?;
        profile.save(path)?;
        Ok(profile)
    }

    /// Add a body metric snapshot, keeping the history ordered by date
    ///
    /// A snapshot for a date that already has one replaces it.
    pub fn record_body_metrics(&mut self, metrics: BodyMetricLog) {
        match self
            .metrics_history
            .binary_search_by(|existing| existing.date.cmp(&metrics.date))
        {
            Ok(index) => {
                tracing::info!("Replacing body metrics for {}", metrics.date);
                self.metrics_history[index] = metrics;
            }
            Err(index) => self.metrics_history.insert(index, metrics),
        }
    }

    /// Replace the advanced health record wholesale
    pub fn set_advanced_health(&mut self, health: AdvancedHealthData) {
        self.advanced_health = Some(health);
    }

    pub fn set_subscription(&mut self, tier: SubscriptionTier) {
        if self.subscription_tier != tier {
            tracing::info!(
                "Subscription changed from {:?} to {:?}",
                self.subscription_tier,
                tier
            );
        }
        self.subscription_tier = tier;
    }

    /// Most recent body metric snapshot
    pub fn latest_metrics(&self) -> Option<&BodyMetricLog> {
        self.metrics_history.last()
    }
}
