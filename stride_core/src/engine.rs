//! Level engine converting recent activity into an athlete tier.
//!
//! The score is the sum of three clamped sub-scores:
//! - **Consistency** (max 500): active days in the recent window
//! - **Performance** (max 500): mean workout and nutrition adherence
//! - **Advanced** (max 300): VO2 max, body composition, subscription bonus
//!
//! The total is mapped onto the six ordered tiers, with a progress
//! percentage toward the next tier threshold.
//!
//! The engine is a pure function of its inputs. It performs no validation of
//! raw values; that happens in [`crate::ingest`] before data is stored.

use crate::config::ScoringConfig;
use crate::{
    DailyLog, LevelResult, ScoreBreakdown, ScoreComponent, SubscriptionTier, Tier, UserProfile,
};
use once_cell::sync::Lazy;

/// Cached default scoring parameters
static DEFAULT_SCORING: Lazy<ScoringConfig> = Lazy::new(ScoringConfig::default);

/// Compute the athlete level using the default scoring parameters
///
/// `logs` must be ordered oldest to newest; only the most recent window
/// is considered.
pub fn compute_level(profile: &UserProfile, logs: &[DailyLog]) -> LevelResult {
    compute_level_with(&DEFAULT_SCORING, profile, logs)
}

/// Compute the athlete level with explicit scoring parameters
pub fn compute_level_with(
    scoring: &ScoringConfig,
    profile: &UserProfile,
    logs: &[DailyLog],
) -> LevelResult {
    let window = recent_window(logs, scoring.window.size);

    let consistency = consistency_score(scoring, window);
    let performance = performance_score(scoring, window);
    let advanced = advanced_score(scoring, profile);

    let total = (consistency.raw + performance.raw + advanced.raw).round() as i64;
    let status = resolve_tier(scoring, total);
    let progress_to_next = progress_to_next(scoring, status, total);

    tracing::debug!(
        "Level computed from {} logs: {} ({} pts, {}% to next)",
        window.len(),
        status,
        total,
        progress_to_next
    );

    LevelResult {
        status,
        score: total,
        progress_to_next,
        breakdown: ScoreBreakdown {
            consistency,
            performance,
            advanced,
        },
    }
}

/// The last `size` logs, or all of them if there are fewer
pub fn recent_window(logs: &[DailyLog], size: usize) -> &[DailyLog] {
    &logs[logs.len().saturating_sub(size)..]
}

/// Score how often the athlete showed up in the window
fn consistency_score(scoring: &ScoringConfig, window: &[DailyLog]) -> ScoreComponent {
    let params = &scoring.consistency;

    let workout_days = window
        .iter()
        .filter(|log| log.workout_score > params.active_day_min_score)
        .count();

    let raw = (workout_days as f64 / params.target_active_days as f64 * params.max_points)
        .min(params.max_points);

    ScoreComponent::new(
        raw,
        format!(
            "{}/{} active days",
            workout_days, params.target_active_days
        ),
    )
}

/// Score mean workout and nutrition adherence over the window
fn performance_score(scoring: &ScoringConfig, window: &[DailyLog]) -> ScoreComponent {
    if window.is_empty() {
        return ScoreComponent::new(0.0, "No recent logs.");
    }

    let params = &scoring.performance;
    let count = window.len() as f64;
    let avg_workout = window
        .iter()
        .map(|log| log.workout_score as f64)
        .sum::<f64>()
        / count;
    let avg_nutrition = window
        .iter()
        .map(|log| log.nutrition_score as f64)
        .sum::<f64>()
        / count;

    let raw = (avg_workout / 100.0 * params.workout_points
        + avg_nutrition / 100.0 * params.nutrition_points)
        .min(params.max_points);

    ScoreComponent::new(
        raw,
        format!(
            "Avg workout: {}%, Avg nutrition: {}%",
            avg_workout.round(),
            avg_nutrition.round()
        ),
    )
}

/// Score optional biometrics plus the subscription bonus
///
/// Each signal is skipped entirely when its source data is absent, so it
/// adds neither points nor a detail fragment.
fn advanced_score(scoring: &ScoringConfig, profile: &UserProfile) -> ScoreComponent {
    let params = &scoring.advanced;
    let mut total = 0.0;
    let mut details: Vec<String> = Vec::new();

    if let Some(ref health) = profile.advanced_health {
        let vo2 = (health.vo2_max / params.vo2_reference * params.vo2_points)
            .min(params.vo2_points);
        if vo2 > 0.0 {
            total += vo2;
            details.push(format!("VO2 Max: {}", health.vo2_max));
        }
    }

    if let Some(latest) = profile.latest_metrics() {
        if let (Some(body_fat), Some(muscle_mass)) = (latest.body_fat, latest.muscle_mass) {
            // The fat term has no upper cap: every point below the lean
            // reference keeps earning. The sub-score clamp bounds it.
            let fat = ((params.body_fat_reference - body_fat) / params.body_fat_span).max(0.0)
                * params.body_fat_points;
            let muscle =
                (muscle_mass / params.muscle_mass_reference).min(1.0) * params.muscle_mass_points;
            total += fat + muscle;
            details.push(format!("Body Comp: {}% Fat", body_fat));
        }
    }

    total += match profile.subscription_tier {
        SubscriptionTier::Free => 0.0,
        SubscriptionTier::Elite => params.elite_bonus,
        SubscriptionTier::ElitePlus => params.elite_plus_bonus,
    };

    let detail = if details.is_empty() {
        "No advanced data submitted.".to_string()
    } else {
        details.join(", ")
    };

    ScoreComponent::new(total.min(params.max_points), detail)
}

/// Highest tier whose threshold does not exceed the score
fn resolve_tier(scoring: &ScoringConfig, score: i64) -> Tier {
    Tier::ALL
        .iter()
        .rev()
        .copied()
        .find(|tier| scoring.tiers.threshold(*tier) <= score)
        .unwrap_or(Tier::Amateur)
}

/// Percentage of the way from the current tier threshold to the next
fn progress_to_next(scoring: &ScoringConfig, status: Tier, score: i64) -> u8 {
    let current = scoring.tiers.threshold(status) as f64;
    let next = match status.next() {
        Some(next_tier) => scoring.tiers.threshold(next_tier) as f64,
        None => current * scoring.tiers.elite_cap_multiplier,
    };

    let span = next - current;
    if span <= 0.0 {
        return 100;
    }

    let percent = ((score as f64 - current) / span * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdvancedHealthData, BodyMetricLog, Measurements};
    use chrono::{Duration, NaiveDate};

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(offset)
    }

    fn create_logs(count: usize, workout: i32, nutrition: i32) -> Vec<DailyLog> {
        (0..count)
            .map(|i| DailyLog::new(day(i as i64), workout, nutrition))
            .collect()
    }

    fn free_profile() -> UserProfile {
        UserProfile::default()
    }

    fn body_metrics(body_fat: Option<f64>, muscle_mass: Option<f64>) -> BodyMetricLog {
        BodyMetricLog {
            date: day(0),
            weight: 80.0,
            body_fat,
            muscle_mass,
            bmi: 24.0,
            measurements: Measurements::default(),
        }
    }

    fn with_vo2(vo2_max: f64) -> Option<AdvancedHealthData> {
        Some(AdvancedHealthData {
            vo2_max,
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_logs_is_amateur() {
        crate::logging::init_test();
        let result = compute_level(&free_profile(), &[]);

        assert_eq!(result.breakdown.consistency.score, 0);
        assert_eq!(result.breakdown.performance.score, 0);
        assert_eq!(result.breakdown.performance.detail, "No recent logs.");
        assert_eq!(result.breakdown.advanced.detail, "No advanced data submitted.");
        assert_eq!(result.status, Tier::Amateur);
        assert_eq!(result.score, 0);
        assert_eq!(result.progress_to_next, 0);
    }

    #[test]
    fn test_perfect_month_free_is_pro() {
        let logs = create_logs(25, 100, 100);
        let result = compute_level(&free_profile(), &logs);

        assert_eq!(result.breakdown.consistency.score, 500);
        assert_eq!(result.breakdown.consistency.detail, "25/25 active days");
        assert_eq!(result.breakdown.performance.score, 500);
        assert_eq!(
            result.breakdown.performance.detail,
            "Avg workout: 100%, Avg nutrition: 100%"
        );
        assert_eq!(result.breakdown.advanced.score, 0);
        assert_eq!(result.score, 1000);
        assert_eq!(result.status, Tier::Pro);
        assert_eq!(result.progress_to_next, 50);
    }

    #[test]
    fn test_perfect_month_elite_plus_is_elite() {
        let logs = create_logs(25, 100, 100);
        let profile = UserProfile {
            subscription_tier: SubscriptionTier::ElitePlus,
            ..free_profile()
        };
        let result = compute_level(&profile, &logs);

        assert_eq!(result.breakdown.advanced.score, 100);
        assert_eq!(result.score, 1100);
        assert_eq!(result.status, Tier::Elite);
        assert_eq!(result.progress_to_next, 0);
    }

    #[test]
    fn test_tier_boundaries() {
        let scoring = ScoringConfig::default();
        assert_eq!(resolve_tier(&scoring, 1100), Tier::Elite);
        assert_eq!(resolve_tier(&scoring, 1099), Tier::Pro);
        assert_eq!(resolve_tier(&scoring, 900), Tier::Pro);
        assert_eq!(resolve_tier(&scoring, 899), Tier::Advanced);
        assert_eq!(resolve_tier(&scoring, 450), Tier::SemiPro);
        assert_eq!(resolve_tier(&scoring, 199), Tier::Amateur);
        assert_eq!(resolve_tier(&scoring, -20), Tier::Amateur);
    }

    #[test]
    fn test_progress_within_tier() {
        let scoring = ScoringConfig::default();
        assert_eq!(progress_to_next(&scoring, Tier::Skilled, 325), 50);
        assert_eq!(progress_to_next(&scoring, Tier::Advanced, 1099), 100);
        assert_eq!(progress_to_next(&scoring, Tier::Amateur, -50), 0);
    }

    #[test]
    fn test_elite_progress_uses_virtual_cap() {
        let scoring = ScoringConfig::default();
        // Virtual cap is 1650, so 1375 is halfway
        assert_eq!(progress_to_next(&scoring, Tier::Elite, 1375), 50);
        assert_eq!(progress_to_next(&scoring, Tier::Elite, 1450), 64);
        assert_eq!(progress_to_next(&scoring, Tier::Elite, 2000), 100);
    }

    #[test]
    fn test_progress_always_in_range() {
        let profile = UserProfile {
            subscription_tier: SubscriptionTier::ElitePlus,
            advanced_health: with_vo2(80.0),
            metrics_history: vec![body_metrics(Some(5.0), Some(60.0))],
            ..free_profile()
        };

        for count in [0, 1, 7, 20, 25, 30, 45] {
            for score in [0, 6, 50, 100] {
                let result = compute_level(&profile, &create_logs(count, score, score));
                assert!(result.progress_to_next <= 100);
                let free = compute_level(&free_profile(), &create_logs(count, score, score));
                assert!(free.progress_to_next <= 100);
            }
        }
    }

    #[test]
    fn test_score_is_rounded_sum_of_components() {
        let logs: Vec<DailyLog> = (0..13)
            .map(|i| DailyLog::new(day(i), 37 + i as i32 * 3, 81 - i as i32))
            .collect();
        let profile = UserProfile {
            advanced_health: with_vo2(41.3),
            metrics_history: vec![body_metrics(Some(18.7), Some(43.1))],
            subscription_tier: SubscriptionTier::Elite,
            ..free_profile()
        };

        let result = compute_level(&profile, &logs);
        let b = &result.breakdown;

        assert!(b.consistency.raw <= 500.0);
        assert!(b.performance.raw <= 500.0);
        assert!(b.advanced.raw <= 300.0);
        assert_eq!(
            result.score,
            (b.consistency.raw + b.performance.raw + b.advanced.raw).round() as i64
        );
    }

    #[test]
    fn test_consistency_monotonic_and_saturates() {
        let scoring = ScoringConfig::default();
        let mut previous = -1.0;

        for active in 0..=30 {
            let mut logs = create_logs(30 - active, 0, 50);
            logs.extend(create_logs(active, 80, 50));
            let component = consistency_score(&scoring, recent_window(&logs, 30));

            assert!(component.raw >= previous);
            if active >= 25 {
                assert_eq!(component.raw, 500.0);
            }
            previous = component.raw;
        }
    }

    #[test]
    fn test_active_day_threshold_is_strict() {
        let scoring = ScoringConfig::default();

        let at_threshold = create_logs(10, 5, 100);
        assert_eq!(consistency_score(&scoring, &at_threshold).raw, 0.0);

        let above = create_logs(10, 6, 100);
        let component = consistency_score(&scoring, &above);
        assert_eq!(component.score, 200);
        assert_eq!(component.detail, "10/25 active days");
    }

    #[test]
    fn test_only_recent_window_counts() {
        // 40 perfect days followed by 30 idle days
        let mut logs = create_logs(40, 100, 100);
        logs.extend((40..70).map(|i| DailyLog::new(day(i), 0, 0)));

        let result = compute_level(&free_profile(), &logs);
        assert_eq!(result.breakdown.consistency.raw, 0.0);
        assert_eq!(result.breakdown.performance.raw, 0.0);
        assert_eq!(result.status, Tier::Amateur);

        // A short history uses every entry
        let short = create_logs(10, 100, 100);
        let result = compute_level(&free_profile(), &short);
        assert_eq!(result.breakdown.consistency.score, 200);
    }

    #[test]
    fn test_recent_window_takes_newest() {
        let logs = create_logs(10, 50, 50);

        let recent = recent_window(&logs, 3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].date, day(7));
        assert_eq!(recent_window(&logs, 30).len(), 10);
        assert!(recent_window(&[], 30).is_empty());
    }

    #[test]
    fn test_performance_weights_workout_and_nutrition_equally() {
        let scoring = ScoringConfig::default();
        let logs = vec![
            DailyLog::new(day(0), 100, 0),
            DailyLog::new(day(1), 50, 50),
        ];

        let component = performance_score(&scoring, &logs);
        // avg workout 75%, avg nutrition 25%
        assert_eq!(component.raw, 250.0);
        assert_eq!(component.detail, "Avg workout: 75%, Avg nutrition: 25%");
    }

    #[test]
    fn test_vo2_component() {
        let scoring = ScoringConfig::default();

        let profile = UserProfile {
            advanced_health: with_vo2(65.0),
            ..free_profile()
        };
        let component = advanced_score(&scoring, &profile);
        assert_eq!(component.raw, 150.0);
        assert_eq!(component.detail, "VO2 Max: 65");

        // Above the reference stays capped
        let profile = UserProfile {
            advanced_health: with_vo2(90.0),
            ..free_profile()
        };
        assert_eq!(advanced_score(&scoring, &profile).raw, 150.0);

        // Unset VO2 contributes no detail
        let profile = UserProfile {
            advanced_health: with_vo2(0.0),
            ..free_profile()
        };
        let component = advanced_score(&scoring, &profile);
        assert_eq!(component.raw, 0.0);
        assert_eq!(component.detail, "No advanced data submitted.");
    }

    #[test]
    fn test_body_composition_uses_latest_entry() {
        let scoring = ScoringConfig::default();
        let profile = UserProfile {
            metrics_history: vec![
                body_metrics(Some(10.0), Some(50.0)),
                body_metrics(Some(19.0), Some(40.0)),
            ],
            ..free_profile()
        };

        let component = advanced_score(&scoring, &profile);
        // fat: (25 - 19) / 15 * 75 = 30, muscle: 40 / 50 * 75 = 60
        assert!((component.raw - 90.0).abs() < 1e-9);
        assert_eq!(component.detail, "Body Comp: 19% Fat");
    }

    #[test]
    fn test_body_composition_requires_both_fields() {
        let scoring = ScoringConfig::default();
        let profile = UserProfile {
            metrics_history: vec![
                body_metrics(Some(12.0), Some(45.0)),
                body_metrics(Some(12.0), None),
            ],
            ..free_profile()
        };

        let component = advanced_score(&scoring, &profile);
        assert_eq!(component.raw, 0.0);
        assert_eq!(component.detail, "No advanced data submitted.");
    }

    #[test]
    fn test_high_body_fat_adds_only_muscle_term() {
        let scoring = ScoringConfig::default();
        let profile = UserProfile {
            metrics_history: vec![body_metrics(Some(31.0), Some(25.0))],
            ..free_profile()
        };

        let component = advanced_score(&scoring, &profile);
        assert_eq!(component.raw, 37.5);
    }

    #[test]
    fn test_advanced_details_are_joined() {
        let scoring = ScoringConfig::default();
        let profile = UserProfile {
            advanced_health: with_vo2(52.5),
            metrics_history: vec![body_metrics(Some(14.0), Some(42.0))],
            ..free_profile()
        };

        let component = advanced_score(&scoring, &profile);
        assert_eq!(component.detail, "VO2 Max: 52.5, Body Comp: 14% Fat");
    }

    #[test]
    fn test_subscription_bonus_below_cap() {
        let scoring = ScoringConfig::default();
        let free = UserProfile {
            advanced_health: with_vo2(32.5),
            ..free_profile()
        };
        let elite = UserProfile {
            subscription_tier: SubscriptionTier::Elite,
            ..free.clone()
        };
        let elite_plus = UserProfile {
            subscription_tier: SubscriptionTier::ElitePlus,
            ..free.clone()
        };

        let base = advanced_score(&scoring, &free).raw;
        assert_eq!(base, 75.0);
        assert_eq!(advanced_score(&scoring, &elite).raw - base, 50.0);
        assert_eq!(advanced_score(&scoring, &elite_plus).raw - base, 100.0);
    }

    #[test]
    fn test_subscription_bonus_absorbed_by_cap() {
        let scoring = ScoringConfig::default();
        // VO2 150 + fat 75 + muscle 75 = 300 before any bonus
        let free = UserProfile {
            advanced_health: with_vo2(65.0),
            metrics_history: vec![body_metrics(Some(10.0), Some(50.0))],
            ..free_profile()
        };
        let elite_plus = UserProfile {
            subscription_tier: SubscriptionTier::ElitePlus,
            ..free.clone()
        };

        assert_eq!(advanced_score(&scoring, &free).raw, 300.0);
        assert_eq!(advanced_score(&scoring, &elite_plus).raw, 300.0);

        // Partially saturated: a 225 baseline only gains 75 of the 100 bonus
        let partial = UserProfile {
            advanced_health: with_vo2(65.0),
            metrics_history: vec![body_metrics(Some(25.0), Some(100.0))],
            subscription_tier: SubscriptionTier::ElitePlus,
            ..free_profile()
        };
        assert_eq!(advanced_score(&scoring, &partial).raw, 300.0);
    }

    #[test]
    fn test_custom_scoring_parameters() {
        let mut scoring = ScoringConfig::default();
        scoring.window.size = 7;
        scoring.consistency.target_active_days = 5;

        let logs = create_logs(12, 100, 100);
        let result = compute_level_with(&scoring, &free_profile(), &logs);

        assert_eq!(result.breakdown.consistency.score, 500);
        assert_eq!(result.breakdown.consistency.detail, "7/5 active days");
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let logs = create_logs(18, 73, 64);
        let profile = UserProfile {
            advanced_health: with_vo2(47.0),
            metrics_history: vec![body_metrics(Some(16.0), Some(38.0))],
            subscription_tier: SubscriptionTier::Elite,
            ..free_profile()
        };
        let snapshot = profile.clone();

        let first = compute_level(&profile, &logs);
        let second = compute_level(&profile, &logs);

        assert_eq!(first, second);
        assert_eq!(profile, snapshot);
    }
}
