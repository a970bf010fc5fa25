use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use stride_core::*;

#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Athlete level tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current athlete level (default)
    Level {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Finalize tracking for a day
    Log {
        /// Percentage of planned workout sets completed
        #[arg(long, allow_hyphen_values = true)]
        workout: i32,

        /// Percentage of planned meals consumed
        #[arg(long, allow_hyphen_values = true)]
        nutrition: i32,

        /// Day being logged (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        sleep: Option<f64>,

        #[arg(long)]
        resting_hr: Option<u16>,

        /// Self-rated mood, 1-10
        #[arg(long)]
        mood: Option<u8>,

        #[arg(long)]
        steps: Option<u32>,

        /// Water intake in litres
        #[arg(long)]
        water: Option<f64>,
    },

    /// Record a body composition snapshot
    Metrics {
        #[arg(long)]
        weight: f64,

        #[arg(long)]
        bmi: f64,

        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,

        /// Muscle mass percentage
        #[arg(long)]
        muscle_mass: Option<f64>,

        /// Measurement day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        chest: Option<f64>,

        #[arg(long)]
        waist: Option<f64>,

        #[arg(long)]
        hips: Option<f64>,

        #[arg(long)]
        arm: Option<f64>,

        #[arg(long)]
        thigh: Option<f64>,
    },

    /// Replace the advanced health record
    Health {
        /// VO2 max in ml/kg/min
        #[arg(long, allow_hyphen_values = true)]
        vo2_max: f64,

        #[arg(long)]
        metabolic_age: Option<u32>,

        #[arg(long)]
        recovery_index: Option<f64>,

        #[arg(long)]
        genetic_markers: Option<String>,

        #[arg(long)]
        hormonal_history: Option<String>,
    },

    /// Change the subscription tier (free, elite, elite_plus)
    Subscribe { tier: SubscriptionTier },

    /// Roll up the daily log store to CSV
    Rollup {
        /// Clean up processed log files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

/// File locations under the data directory
struct Paths {
    logs_dir: PathBuf,
    jsonl: PathBuf,
    csv: PathBuf,
    profile: PathBuf,
    level_state: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        let logs_dir = data_dir.join("logs");
        Self {
            jsonl: logs_dir.join("daily_logs.jsonl"),
            level_state: logs_dir.join("level_state.json"),
            csv: data_dir.join("daily_logs.csv"),
            profile: data_dir.join("profile.json"),
            logs_dir,
        }
    }
}

fn main() -> ExitCode {
    stride_core::logging::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Some(Commands::Level { json }) => cmd_level(&paths, &config, json),
        Some(Commands::Log {
            workout,
            nutrition,
            date,
            sleep,
            resting_hr,
            mood,
            steps,
            water,
        }) => {
            let mut log = DailyLog::new(date.unwrap_or_else(today), workout, nutrition);
            log.sleep_hours = sleep;
            log.resting_heart_rate = resting_hr;
            log.mood = mood;
            log.steps = steps;
            log.water_intake = water;
            cmd_log(&paths, &config, log)
        }
        Some(Commands::Metrics {
            weight,
            bmi,
            body_fat,
            muscle_mass,
            date,
            chest,
            waist,
            hips,
            arm,
            thigh,
        }) => cmd_metrics(
            &paths,
            BodyMetricLog {
                date: date.unwrap_or_else(today),
                weight,
                body_fat,
                muscle_mass,
                bmi,
                measurements: Measurements {
                    chest,
                    waist,
                    hips,
                    arm,
                    thigh,
                },
            },
        ),
        Some(Commands::Health {
            vo2_max,
            metabolic_age,
            recovery_index,
            genetic_markers,
            hormonal_history,
        }) => cmd_health(
            &paths,
            AdvancedHealthData {
                vo2_max,
                metabolic_age,
                recovery_index,
                genetic_markers,
                hormonal_history,
            },
        ),
        Some(Commands::Subscribe { tier }) => cmd_subscribe(&paths, tier),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
        None => cmd_level(&paths, &config, false),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn cmd_level(paths: &Paths, config: &Config, json: bool) -> Result<()> {
    let profile = UserProfile::load(&paths.profile)?;
    let logs = load_logs(&paths.jsonl, &paths.csv)?;
    let result = compute_level_with(&config.scoring, &profile, &logs);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut state = LevelState::load(&paths.level_state)?;
    let level_up = state.record(&result, Utc::now());

    if let Some(up) = level_up {
        tracing::info!("Level up from {} to {}", up.from, up.to);
        println!("\n★ LEVEL UP! {} → {}", up.from, up.to);
    }

    let window = stride_core::engine::recent_window(&logs, config.scoring.window.size);
    display_level(&result, &config.scoring, window.len(), logs.len());

    state.save(&paths.level_state)?;
    Ok(())
}

fn cmd_log(paths: &Paths, config: &Config, log: DailyLog) -> Result<()> {
    let log = stride_core::ingest::sanitize_daily_log(log)?;

    // The archive is outside the store's lock, so check it here
    let history = load_logs(&paths.jsonl, &paths.csv)?;
    if history.iter().any(|existing| existing.date == log.date) {
        return Err(Error::DuplicateLog(log.date));
    }

    let mut store = JsonlLogStore::new(&paths.jsonl);
    store.append(&log)?;
    tracing::info!("Recorded daily log for {}", log.date);

    let active = log.workout_score > config.scoring.consistency.active_day_min_score;
    println!(
        "✓ Logged {}: workout {}%, nutrition {}%{}",
        log.date,
        log.workout_score,
        log.nutrition_score,
        if active { "" } else { " (rest day)" }
    );
    Ok(())
}

fn cmd_metrics(paths: &Paths, metrics: BodyMetricLog) -> Result<()> {
    stride_core::ingest::validate_body_metrics(&metrics)?;

    let date = metrics.date;
    let profile = UserProfile::update(&paths.profile, |profile| {
        profile.record_body_metrics(metrics);
        Ok(())
    })?;
    tracing::info!("Recorded body metrics for {}", date);

    println!(
        "✓ Body metrics recorded for {} ({} snapshots)",
        date,
        profile.metrics_history.len()
    );
    Ok(())
}

fn cmd_health(paths: &Paths, health: AdvancedHealthData) -> Result<()> {
    stride_core::ingest::validate_advanced_health(&health)?;

    let vo2_max = health.vo2_max;
    UserProfile::update(&paths.profile, |profile| {
        profile.set_advanced_health(health);
        Ok(())
    })?;
    tracing::info!("Replaced advanced health data");

    println!("✓ Advanced health data saved (VO2 Max: {})", vo2_max);
    Ok(())
}

fn cmd_subscribe(paths: &Paths, tier: SubscriptionTier) -> Result<()> {
    UserProfile::update(&paths.profile, |profile| {
        profile.set_subscription(tier);
        Ok(())
    })?;
    tracing::info!("Subscription changed to {}", tier);

    println!("✓ Subscription set to {}", tier);
    Ok(())
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.jsonl.exists() {
        println!("No daily log store found - nothing to roll up.");
        return Ok(());
    }

    let count = stride_core::csv_rollup::logs_to_csv_and_archive(&paths.jsonl, &paths.csv)?;
    tracing::debug!("Rollup moved {} daily logs into {:?}", count, paths.csv);

    println!("✓ Rolled up {} daily logs to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = stride_core::csv_rollup::cleanup_processed(&paths.logs_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed log files", cleaned);
        }
    }

    Ok(())
}

fn display_level(result: &LevelResult, scoring: &ScoringConfig, window: usize, total: usize) {
    const BAR_WIDTH: usize = 20;

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}  ·  {} pts", result.status.label().to_uppercase(), result.score);
    println!("╰─────────────────────────────────────────╯");
    println!();

    let filled = result.progress_to_next as usize * BAR_WIDTH / 100;
    let target = match result.status.next() {
        Some(next) => format!(
            "{} ({} pts)",
            next,
            scoring.tiers.threshold(next)
        ),
        None => "Elite mastery".to_string(),
    };
    println!(
        "  Progress to {}: [{}{}] {}%",
        target,
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        result.progress_to_next
    );
    println!();

    let b = &result.breakdown;
    for (name, component) in [
        ("Consistency", &b.consistency),
        ("Performance", &b.performance),
        ("Advanced", &b.advanced),
    ] {
        println!("  {:<12} {:>4}  {}", name, component.score, component.detail);
    }

    println!();
    println!("  Based on the last {} of {} daily logs", window, total);
    println!();
}
