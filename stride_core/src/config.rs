//! Configuration file support for Stride.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/stride/config.toml`.
//! Every scoring constant used by the level engine lives here so that the
//! weights can be tuned without touching the engine. The defaults are the
//! production values.

use crate::{Error, Result, Tier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// All level engine weights, ceilings and thresholds
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ScoringConfig {
    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub consistency: ConsistencyConfig,

    #[serde(default)]
    pub performance: PerformanceConfig,

    #[serde(default)]
    pub advanced: AdvancedConfig,

    #[serde(default)]
    pub tiers: TierThresholds,
}

/// Recent-window selection
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WindowConfig {
    /// Number of most recent logs considered
    #[serde(default = "default_window_size")]
    pub size: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: default_window_size(),
        }
    }
}

/// Consistency sub-score parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsistencyConfig {
    /// A day counts as active when its workout score is strictly above this
    #[serde(default = "default_active_day_min_score")]
    pub active_day_min_score: i32,

    /// Active days in the window that earn the full sub-score
    #[serde(default = "default_target_active_days")]
    pub target_active_days: u32,

    #[serde(default = "default_consistency_max")]
    pub max_points: f64,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            active_day_min_score: default_active_day_min_score(),
            target_active_days: default_target_active_days(),
            max_points: default_consistency_max(),
        }
    }
}

/// Performance sub-score parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PerformanceConfig {
    #[serde(default = "default_adherence_points")]
    pub workout_points: f64,

    #[serde(default = "default_adherence_points")]
    pub nutrition_points: f64,

    #[serde(default = "default_performance_max")]
    pub max_points: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            workout_points: default_adherence_points(),
            nutrition_points: default_adherence_points(),
            max_points: default_performance_max(),
        }
    }
}

/// Advanced metrics sub-score parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdvancedConfig {
    /// VO2 max (ml/kg/min) that earns the full VO2 component
    #[serde(default = "default_vo2_reference")]
    pub vo2_reference: f64,

    #[serde(default = "default_vo2_points")]
    pub vo2_points: f64,

    /// Body fat percentage at or above which the fat term is zero
    #[serde(default = "default_body_fat_reference")]
    pub body_fat_reference: f64,

    /// Percentage points below the reference that earn `body_fat_points`
    #[serde(default = "default_body_fat_span")]
    pub body_fat_span: f64,

    #[serde(default = "default_body_comp_points")]
    pub body_fat_points: f64,

    /// Muscle mass percentage that earns the full muscle term
    #[serde(default = "default_muscle_mass_reference")]
    pub muscle_mass_reference: f64,

    #[serde(default = "default_body_comp_points")]
    pub muscle_mass_points: f64,

    #[serde(default = "default_elite_bonus")]
    pub elite_bonus: f64,

    #[serde(default = "default_elite_plus_bonus")]
    pub elite_plus_bonus: f64,

    #[serde(default = "default_advanced_max")]
    pub max_points: f64,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            vo2_reference: default_vo2_reference(),
            vo2_points: default_vo2_points(),
            body_fat_reference: default_body_fat_reference(),
            body_fat_span: default_body_fat_span(),
            body_fat_points: default_body_comp_points(),
            muscle_mass_reference: default_muscle_mass_reference(),
            muscle_mass_points: default_body_comp_points(),
            elite_bonus: default_elite_bonus(),
            elite_plus_bonus: default_elite_plus_bonus(),
            max_points: default_advanced_max(),
        }
    }
}

/// Inclusive lower score bound of each tier
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TierThresholds {
    #[serde(default)]
    pub amateur: i64,
    #[serde(default = "default_skilled")]
    pub skilled: i64,
    #[serde(default = "default_semi_pro")]
    pub semi_pro: i64,
    #[serde(default = "default_advanced_tier")]
    pub advanced: i64,
    #[serde(default = "default_pro")]
    pub pro: i64,
    #[serde(default = "default_elite")]
    pub elite: i64,

    /// Elite has no next tier; progress runs toward `elite * multiplier`
    #[serde(default = "default_elite_cap_multiplier")]
    pub elite_cap_multiplier: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            amateur: 0,
            skilled: default_skilled(),
            semi_pro: default_semi_pro(),
            advanced: default_advanced_tier(),
            pro: default_pro(),
            elite: default_elite(),
            elite_cap_multiplier: default_elite_cap_multiplier(),
        }
    }
}

impl TierThresholds {
    /// Threshold for a tier
    pub fn threshold(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Amateur => self.amateur,
            Tier::Skilled => self.skilled,
            Tier::SemiPro => self.semi_pro,
            Tier::Advanced => self.advanced,
            Tier::Pro => self.pro,
            Tier::Elite => self.elite,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("stride")
}

fn default_window_size() -> usize {
    30
}

fn default_active_day_min_score() -> i32 {
    5
}

fn default_target_active_days() -> u32 {
    25
}

fn default_consistency_max() -> f64 {
    500.0
}

fn default_adherence_points() -> f64 {
    250.0
}

fn default_performance_max() -> f64 {
    500.0
}

fn default_vo2_reference() -> f64 {
    65.0
}

fn default_vo2_points() -> f64 {
    150.0
}

fn default_body_fat_reference() -> f64 {
    25.0
}

fn default_body_fat_span() -> f64 {
    15.0
}

fn default_body_comp_points() -> f64 {
    75.0
}

fn default_muscle_mass_reference() -> f64 {
    50.0
}

fn default_elite_bonus() -> f64 {
    50.0
}

fn default_elite_plus_bonus() -> f64 {
    100.0
}

fn default_advanced_max() -> f64 {
    300.0
}

fn default_skilled() -> i64 {
    200
}

fn default_semi_pro() -> i64 {
    450
}

fn default_advanced_tier() -> i64 {
    700
}

fn default_pro() -> i64 {
    900
}

fn default_elite() -> i64 {
    1100
}

fn default_elite_cap_multiplier() -> f64 {
    1.5
}

impl ScoringConfig {
    /// Check the invariants the engine relies on
    ///
    /// Returns a list of problems; an empty list means the configuration
    /// is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.window.size == 0 {
            errors.push("window.size must be at least 1".to_string());
        }
        if self.consistency.target_active_days == 0 {
            errors.push("consistency.target_active_days must be at least 1".to_string());
        }

        let positive = [
            ("advanced.vo2_reference", self.advanced.vo2_reference),
            ("advanced.body_fat_span", self.advanced.body_fat_span),
            (
                "advanced.muscle_mass_reference",
                self.advanced.muscle_mass_reference,
            ),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{} must be a positive number", name));
            }
        }

        let maxima = [
            ("consistency.max_points", self.consistency.max_points),
            ("performance.max_points", self.performance.max_points),
            ("advanced.max_points", self.advanced.max_points),
        ];
        for (name, value) in maxima {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{} must not be negative", name));
            }
        }

        let thresholds: Vec<i64> = Tier::ALL
            .iter()
            .map(|tier| self.tiers.threshold(*tier))
            .collect();
        if thresholds.windows(2).any(|pair| pair[0] >= pair[1]) {
            errors.push(format!(
                "tier thresholds must be strictly ascending, got {:?}",
                thresholds
            ));
        }
        if !(self.tiers.elite_cap_multiplier.is_finite() && self.tiers.elite_cap_multiplier >= 1.0)
        {
            errors.push("tiers.elite_cap_multiplier must be at least 1.0".to_string());
        }

        errors
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    ///
    /// Scoring sections that fail validation are rejected.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        let errors = config.scoring.validate();
        if !errors.is_empty() {
            return Err(Error::Config(errors.join("; ")));
        }

        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("stride").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
