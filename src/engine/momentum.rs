//! Point-by-point momentum tracking.
//!
//! Two signals come out of the recorded point stream:
//!
//! - A rolling point-win rate per serve role over a fixed window, with
//!   additive smoothing so a cold streak never reports exactly zero.
//! - A leverage-weighted momentum score: each won point contributes the
//!   win-probability swing it was worth, decayed by recency with an
//!   exponential weighting over the full history, in the spirit of the
//!   leverage-based momentum features of Wang et al. (2024).
//!
//! The decay parameter is deliberately unconstrained. Values above 1
//! flip the decay factor negative and the weights oscillate in sign;
//! the score is still well defined whenever the weight sums stay finite
//! and nonzero, and the evaluation reports instability otherwise rather
//! than guessing.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{check_probability, ForecastError, Result};
use crate::snapshot::ServeRole;

/// Default rolling-window length in points.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Default additive smoothing added to the rolling win count.
pub const DEFAULT_SMOOTHING: f64 = 1.0;

/// Default decay parameter for the momentum score.
pub const DEFAULT_MOMENTUM_ALPHA: f64 = 3.4;

/// Default minimum recent-window momentum gain that counts as a spike.
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 0.15;

/// Points in the recent window compared against the rest of the history
/// when looking for a spike.
const SPIKE_LOOKBACK: usize = 5;

/// One recorded point with its leverage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LeverageSample {
    pub role: ServeRole,
    pub won: bool,
    /// Win-probability swing credited to the point: the won/lost gap for
    /// a won point (floored at zero), nothing for a lost one.
    pub leverage: f64,
}

/// Accumulates one match's point stream for one tracked player.
///
/// One tracker per match; call [`MomentumTracker::reset`] before reusing
/// it for another. Not internally synchronized.
#[derive(Debug, Clone)]
pub struct MomentumTracker {
    window_size: usize,
    smoothing: f64,
    serve_window: VecDeque<bool>,
    receive_window: VecDeque<bool>,
    samples: Vec<LeverageSample>,
}

impl MomentumTracker {
    pub fn new(window_size: usize) -> Result<Self> {
        Self::with_smoothing(window_size, DEFAULT_SMOOTHING)
    }

    pub fn with_smoothing(window_size: usize, smoothing: f64) -> Result<Self> {
        if window_size == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "window_size must be at least 1".to_string(),
            ));
        }
        if !(smoothing > 0.0 && smoothing.is_finite()) {
            return Err(ForecastError::InvalidConfiguration(
                "smoothing must be positive".to_string(),
            ));
        }
        Ok(MomentumTracker {
            window_size,
            smoothing,
            serve_window: VecDeque::with_capacity(window_size),
            receive_window: VecDeque::with_capacity(window_size),
            samples: Vec::new(),
        })
    }

    /// Record one point. `p_if_won` and `p_if_lost` are the
    /// counterfactual match-win probabilities the collaborator computed
    /// before the point resolved.
    pub fn record_point(
        &mut self,
        role: ServeRole,
        won: bool,
        p_if_won: f64,
        p_if_lost: f64,
    ) -> Result<()> {
        check_probability("p_if_won", p_if_won)?;
        check_probability("p_if_lost", p_if_lost)?;
        let leverage = if won {
            (p_if_won - p_if_lost).max(0.0)
        } else {
            0.0
        };
        let window = match role {
            ServeRole::Serve => &mut self.serve_window,
            ServeRole::Receive => &mut self.receive_window,
        };
        if window.len() == self.window_size {
            window.pop_front();
        }
        window.push_back(won);
        self.samples.push(LeverageSample { role, won, leverage });
        Ok(())
    }

    /// Smoothed point-win rate over the last `window_size` points played
    /// in the given role: `(wins + smoothing) / window_size`, clamped to
    /// [0, 1]. An empty window reports the smoothing floor, never zero.
    pub fn rolling_point_win_probability(&self, role: ServeRole) -> f64 {
        let window = match role {
            ServeRole::Serve => &self.serve_window,
            ServeRole::Receive => &self.receive_window,
        };
        let wins = window.iter().filter(|&&won| won).count() as f64;
        ((wins + self.smoothing) / self.window_size as f64).clamp(0.0, 1.0)
    }

    /// Leverage-weighted momentum over the full recorded history, newest
    /// point weighted 1 and each older point scaled by `(1 − alpha)`
    /// per step back.
    pub fn current_momentum(&self, alpha: f64) -> Result<f64> {
        ewma_momentum(&self.samples, alpha)
    }

    /// Momentum change contributed by the last `last_n` points: current
    /// momentum minus the momentum as of `last_n` points ago. `None`
    /// until more than `last_n` points exist.
    pub fn momentum_delta(&self, last_n: usize, alpha: f64) -> Result<Option<f64>> {
        if self.samples.len() <= last_n {
            return Ok(None);
        }
        let now = ewma_momentum(&self.samples, alpha)?;
        let before = ewma_momentum(&self.samples[..self.samples.len() - last_n], alpha)?;
        Ok(Some(now - before))
    }

    /// Detect a momentum surge: the gain over the last five points when
    /// it exceeds `threshold`. Only positive surges register.
    pub fn momentum_spike(&self, threshold: f64, alpha: f64) -> Result<Option<f64>> {
        if !(threshold >= 0.0 && threshold.is_finite()) {
            return Err(ForecastError::InvalidConfiguration(
                "spike threshold must be non-negative".to_string(),
            ));
        }
        match self.momentum_delta(SPIKE_LOOKBACK, alpha)? {
            Some(delta) if delta > threshold => Ok(Some(delta)),
            _ => Ok(None),
        }
    }

    pub fn points_recorded(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[LeverageSample] {
        &self.samples
    }

    /// Drop all recorded points, keeping the configuration.
    pub fn reset(&mut self) {
        self.serve_window.clear();
        self.receive_window.clear();
        self.samples.clear();
    }
}

fn ewma_momentum(samples: &[LeverageSample], alpha: f64) -> Result<f64> {
    if samples.is_empty() {
        return Ok(0.0);
    }
    let decay = 1.0 - alpha;
    let mut weight = 1.0;
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for sample in samples.iter().rev() {
        numerator += weight * sample.leverage;
        denominator += weight;
        weight *= decay;
    }
    let momentum = numerator / denominator;
    if !momentum.is_finite() {
        return Err(ForecastError::NumericInstability(format!(
            "momentum diverged with alpha = {alpha}"
        )));
    }
    Ok(momentum)
}
