//! Prior blending and uncertainty on observed serve rates.
//!
//! Early in a match the live serve sample is tiny, so the point model
//! mixes the observed rate with a tour-average prior. The same concern
//! drives the credible interval: a Beta prior updated by the raw
//! serve-point counts, summarized by a normal approximation of the
//! posterior.

use crate::error::{check_probability, ForecastError, Result};

/// Default weight on the live rate when blending against the prior.
pub const DEFAULT_LIVE_WEIGHT: f64 = 0.70;

/// Tour-average serve-point win rate used as the default prior.
pub const DEFAULT_PRIOR_RATE: f64 = 0.62;

/// Two-sided 95% normal quantile.
const Z_95: f64 = 1.96;

/// Convex blend `w·live + (1−w)·prior`.
///
/// The weight must lie in [0, 1]; both rates must be probabilities.
pub fn blend(live_rate: f64, prior_rate: f64, live_weight: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&live_weight) {
        return Err(ForecastError::InvalidWeight { value: live_weight });
    }
    check_probability("live_rate", live_rate)?;
    check_probability("prior_rate", prior_rate)?;
    Ok(live_weight * live_rate + (1.0 - live_weight) * prior_rate)
}

/// 95% credible interval for a serve-point win rate observed as
/// `successes` of `trials`, under a Beta(`prior_alpha`, `prior_beta`)
/// prior.
///
/// The posterior is Beta(α+s, β+n−s); its mean and variance feed a
/// normal approximation whose bounds are clamped to [0, 1].
pub fn credible_interval(
    successes: u32,
    trials: u32,
    prior_alpha: f64,
    prior_beta: f64,
) -> Result<(f64, f64)> {
    if successes > trials {
        return Err(ForecastError::InvalidConfiguration(format!(
            "successes {successes} exceed trials {trials}"
        )));
    }
    if !(prior_alpha > 0.0 && prior_alpha.is_finite())
        || !(prior_beta > 0.0 && prior_beta.is_finite())
    {
        return Err(ForecastError::InvalidConfiguration(
            "beta prior parameters must be positive".to_string(),
        ));
    }
    let a = prior_alpha + f64::from(successes);
    let b = prior_beta + f64::from(trials - successes);
    let total = a + b;
    let mean = a / total;
    let variance = a * b / (total * total * (total + 1.0));
    let sd = variance.sqrt();
    Ok(((mean - Z_95 * sd).max(0.0), (mean + Z_95 * sd).min(1.0)))
}
