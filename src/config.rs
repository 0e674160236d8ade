use clap::Parser;
use courtcast::ForecastOptions;

/// Live tennis win-probability forecaster
#[derive(Parser, Debug, Clone)]
#[command(name = "courtcast", version, about)]
pub struct Config {
    /// Path to the match snapshot JSON ("-" reads stdin)
    #[arg(long, env = "SNAPSHOT_PATH", default_value = "-")]
    pub snapshot: String,

    /// Optional point-log JSON replayed through the momentum tracker
    #[arg(long, env = "POINT_LOG_PATH")]
    pub point_log: Option<String>,

    /// Weight on the live serve rate vs the tour prior (0.0–1.0)
    #[arg(long, env = "LIVE_WEIGHT", default_value = "0.70")]
    pub live_weight: f64,

    /// Tour-average prior serve-point win rate
    #[arg(long, env = "PRIOR_RATE", default_value = "0.62")]
    pub prior_rate: f64,

    /// Momentum decay parameter
    #[arg(long, env = "MOMENTUM_ALPHA", default_value = "3.4")]
    pub momentum_alpha: f64,

    /// Rolling momentum window in points
    #[arg(long, env = "WINDOW_SIZE", default_value = "20")]
    pub window_size: usize,

    /// Additive smoothing for the rolling point-win rates
    #[arg(long, env = "SMOOTHING", default_value = "1.0")]
    pub smoothing: f64,

    /// Projection horizon in games for upcoming-game and set-score views
    #[arg(long, env = "GAMES_AHEAD", default_value = "3")]
    pub games_ahead: usize,

    /// Override for the server's tiebreak win probability
    #[arg(long, env = "TIEBREAK_WIN_PROB")]
    pub tiebreak_win_prob: Option<f64>,

    /// Minimum recent momentum gain reported as a spike
    #[arg(long, env = "SPIKE_THRESHOLD", default_value = "0.15")]
    pub spike_threshold: f64,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long, env = "COMPACT_OUTPUT", default_value = "false")]
    pub compact: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.live_weight) {
            anyhow::bail!("live_weight must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.prior_rate) {
            anyhow::bail!("prior_rate must be between 0.0 and 1.0");
        }
        if let Some(tb) = self.tiebreak_win_prob {
            if !(0.0..=1.0).contains(&tb) {
                anyhow::bail!("tiebreak_win_prob must be between 0.0 and 1.0");
            }
        }
        if self.window_size == 0 {
            anyhow::bail!("window_size must be at least 1");
        }
        if !(self.smoothing > 0.0 && self.smoothing.is_finite()) {
            anyhow::bail!("smoothing must be positive");
        }
        if self.games_ahead == 0 {
            anyhow::bail!("games_ahead must be at least 1");
        }
        if !(self.spike_threshold >= 0.0 && self.spike_threshold.is_finite()) {
            anyhow::bail!("spike_threshold must be non-negative");
        }
        Ok(())
    }

    pub fn forecast_options(&self) -> ForecastOptions {
        ForecastOptions {
            live_weight: self.live_weight,
            prior_rate: self.prior_rate,
            momentum_alpha: self.momentum_alpha,
            window_size: self.window_size,
            smoothing: self.smoothing,
            games_ahead: self.games_ahead,
            tiebreak_win_probability: self.tiebreak_win_prob,
            spike_threshold: self.spike_threshold,
        }
    }
}
