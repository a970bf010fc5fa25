//! Core domain types for the Stride athlete level system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Daily activity logs and body composition snapshots
//! - The user profile aggregate and subscription tiers
//! - Athlete tiers and the computed level result

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Daily Logs
// ============================================================================

/// Macro nutrient totals for a single day
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// One finalized day of tracking.
///
/// Logs are append-only: once written for a calendar day they are never
/// mutated. Only `workout_score` and `nutrition_score` feed the level engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyLog {
    pub date: NaiveDate,
    /// Percentage of planned workout sets completed (0-100)
    pub workout_score: i32,
    /// Percentage of planned meals marked consumed (0-100)
    pub nutrition_score: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resting_heart_rate: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    /// Litres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_intake: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<MacroTotals>,
}

impl DailyLog {
    /// Create a log carrying only the two adherence scores
    pub fn new(date: NaiveDate, workout_score: i32, nutrition_score: i32) -> Self {
        Self {
            date,
            workout_score,
            nutrition_score,
            sleep_hours: None,
            resting_heart_rate: None,
            mood: None,
            steps: None,
            water_intake: None,
            macros: None,
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Circumference measurements in centimetres
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Measurements {
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub arm: Option<f64>,
    pub thigh: Option<f64>,
}

/// Periodic body composition snapshot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyMetricLog {
    pub date: NaiveDate,
    pub weight: f64,
    /// Body fat percentage
    pub body_fat: Option<f64>,
    /// Muscle mass as a percentage of body weight
    pub muscle_mass: Option<f64>,
    pub bmi: f64,
    #[serde(default)]
    pub measurements: Measurements,
}

/// User-entered biometric profile. Replaced wholesale on every save.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvancedHealthData {
    /// ml/kg/min, 0 when not measured
    #[serde(default)]
    pub vo2_max: f64,
    pub metabolic_age: Option<u32>,
    pub recovery_index: Option<f64>,
    pub genetic_markers: Option<String>,
    pub hormonal_history: Option<String>,
}

/// Paid plan of the user
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Elite,
    ElitePlus,
}

impl std::str::FromStr for SubscriptionTier {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "elite" => Ok(SubscriptionTier::Elite),
            "elite_plus" | "eliteplus" => Ok(SubscriptionTier::ElitePlus),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown subscription tier: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Elite => "elite",
            SubscriptionTier::ElitePlus => "elite_plus",
        })
    }
}

/// Aggregate root read by the level engine as an immutable snapshot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Ordered oldest to newest
    #[serde(default)]
    pub metrics_history: Vec<BodyMetricLog>,
    #[serde(default)]
    pub advanced_health: Option<AdvancedHealthData>,
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            email: None,
            metrics_history: Vec::new(),
            advanced_health: None,
            subscription_tier: SubscriptionTier::Free,
        }
    }
}

// ============================================================================
// Level Result
// ============================================================================

/// Athlete skill tier, ordered from lowest to highest
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Amateur,
    Skilled,
    #[serde(rename = "Semi-Pro")]
    SemiPro,
    Advanced,
    Pro,
    Elite,
}

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 6] = [
        Tier::Amateur,
        Tier::Skilled,
        Tier::SemiPro,
        Tier::Advanced,
        Tier::Pro,
        Tier::Elite,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Amateur => "Amateur",
            Tier::Skilled => "Skilled",
            Tier::SemiPro => "Semi-Pro",
            Tier::Advanced => "Advanced",
            Tier::Pro => "Pro",
            Tier::Elite => "Elite",
        }
    }

    /// The tier directly above this one, `None` at Elite
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Amateur => Some(Tier::Skilled),
            Tier::Skilled => Some(Tier::SemiPro),
            Tier::SemiPro => Some(Tier::Advanced),
            Tier::Advanced => Some(Tier::Pro),
            Tier::Pro => Some(Tier::Elite),
            Tier::Elite => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scored factor of the level computation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreComponent {
    /// Rounded for display
    pub score: i64,
    /// Clamped, unrounded value that feeds the total
    pub raw: f64,
    pub detail: String,
}

impl ScoreComponent {
    pub fn new(raw: f64, detail: impl Into<String>) -> Self {
        Self {
            score: raw.round() as i64,
            raw,
            detail: detail.into(),
        }
    }
}

/// Itemised sub-scores behind a level result
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub consistency: ScoreComponent,
    pub performance: ScoreComponent,
    pub advanced: ScoreComponent,
}

/// Output of the level engine. Recomputed on demand, never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LevelResult {
    pub status: Tier,
    pub score: i64,
    /// Position between the current and next tier thresholds (0-100)
    pub progress_to_next: u8,
    pub breakdown: ScoreBreakdown,
}
