//! Input checks applied before data reaches the stores.
//!
//! The level engine trusts its inputs, so percentages are clamped and
//! impossible biometrics are rejected here, at the point where user input
//! is turned into stored records.

use crate::{AdvancedHealthData, BodyMetricLog, DailyLog, Error, Result};

const MOOD_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Clamp adherence percentages to 0-100 and reject impossible optional values
pub fn sanitize_daily_log(mut log: DailyLog) -> Result<DailyLog> {
    log.workout_score = clamp_percentage("workout_score", log.workout_score);
    log.nutrition_score = clamp_percentage("nutrition_score", log.nutrition_score);

    if let Some(hours) = log.sleep_hours {
        if !(0.0..=24.0).contains(&hours) {
            return Err(Error::InvalidInput(format!(
                "sleep_hours must be between 0 and 24, got {}",
                hours
            )));
        }
    }

    if let Some(mood) = log.mood {
        if !MOOD_RANGE.contains(&mood) {
            return Err(Error::InvalidInput(format!(
                "mood must be between 1 and 10, got {}",
                mood
            )));
        }
    }

    if let Some(water) = log.water_intake {
        require_non_negative("water_intake", water)?;
    }

    if let Some(ref macros) = log.macros {
        require_non_negative("calories", macros.calories)?;
        require_non_negative("protein", macros.protein)?;
        require_non_negative("carbs", macros.carbs)?;
        require_non_negative("fat", macros.fat)?;
    }

    Ok(log)
}

/// Reject body metrics that cannot describe a real person
pub fn validate_body_metrics(metrics: &BodyMetricLog) -> Result<()> {
    if !(metrics.weight.is_finite() && metrics.weight > 0.0) {
        return Err(Error::InvalidInput(format!(
            "weight must be positive, got {}",
            metrics.weight
        )));
    }
    require_non_negative("bmi", metrics.bmi)?;

    if let Some(body_fat) = metrics.body_fat {
        require_percentage("body_fat", body_fat)?;
    }
    if let Some(muscle_mass) = metrics.muscle_mass {
        require_percentage("muscle_mass", muscle_mass)?;
    }

    let m = &metrics.measurements;
    for (name, value) in [
        ("chest", m.chest),
        ("waist", m.waist),
        ("hips", m.hips),
        ("arm", m.arm),
        ("thigh", m.thigh),
    ] {
        if let Some(value) = value {
            require_non_negative(name, value)?;
        }
    }

    Ok(())
}

/// Reject negative or non-finite advanced biometrics
pub fn validate_advanced_health(health: &AdvancedHealthData) -> Result<()> {
    require_non_negative("vo2_max", health.vo2_max)?;
    if let Some(index) = health.recovery_index {
        require_non_negative("recovery_index", index)?;
    }
    Ok(())
}

fn clamp_percentage(field: &str, value: i32) -> i32 {
    let clamped = value.clamp(0, 100);
    if clamped != value {
        tracing::warn!("Clamped {} from {} to {}", field, value, clamped);
    }
    clamped
}

fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} must not be negative, got {}",
            field, value
        )))
    }
}

fn require_percentage(field: &str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} must be a percentage between 0 and 100, got {}",
            field, value
        )))
    }
}
