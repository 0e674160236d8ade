use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use tracing::info;

mod config;

use config::Config;
use courtcast::{forecast, forecast_with_momentum, MatchSnapshot, MomentumTracker, PointRecord};

fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;
    let options = config.forecast_options();

    let raw = read_input(&config.snapshot)
        .with_context(|| format!("reading snapshot from {}", config.snapshot))?;
    let snapshot: MatchSnapshot =
        serde_json::from_str(&raw).context("parsing snapshot JSON")?;
    snapshot.validate()?;
    let score = snapshot.score;
    info!(
        "{:?} serving at {}, games {}-{}, sets {}-{} (best of {})",
        score.server,
        score.display_points(),
        score.games_server,
        score.games_receiver,
        score.sets_server,
        score.sets_receiver,
        score.best_of_sets
    );

    let bundle = if let Some(path) = &config.point_log {
        let raw_log =
            read_input(path).with_context(|| format!("reading point log from {path}"))?;
        let points: Vec<PointRecord> =
            serde_json::from_str(&raw_log).context("parsing point log JSON")?;
        let mut tracker = MomentumTracker::with_smoothing(options.window_size, options.smoothing)?;
        for point in &points {
            tracker.record_point(point.role, point.won, point.p_if_won, point.p_if_lost)?;
        }
        info!("Replayed {} points from {}", points.len(), path);
        if let Some(spike) = tracker.momentum_spike(options.spike_threshold, options.momentum_alpha)? {
            info!("Momentum spike: +{:.3} over the last 5 points", spike);
        }
        forecast_with_momentum(&snapshot, &options, &tracker)?
    } else {
        forecast(&snapshot, &options)?
    };

    let rendered = if config.compact {
        serde_json::to_string(&bundle)?
    } else {
        serde_json::to_string_pretty(&bundle)?
    };
    println!("{rendered}");

    Ok(())
}

fn read_input(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
    }
}
