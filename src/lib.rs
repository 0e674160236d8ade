//! Live tennis win-probability engine.
//!
//! Takes a point-in-time match snapshot (serve statistics plus the full
//! score) and produces exact Markov-chain forecasts at every level:
//!
//! - Game: hold probability, ending distribution, deuce odds, with the
//!   closed-form deuce solution anchoring the chain
//! - Set: alternating-serve chain with the tiebreak as its own
//!   first-to-seven race
//! - Match: best-of-3/5 over per-set probabilities
//! - Point model: live serve rates blended against a tour prior, with
//!   optional leverage-weighted momentum from a point log
//!
//! [`engine::forecast`] is the front door; the per-level chains are
//! usable on their own for anything narrower.

pub mod engine;
pub mod error;
pub mod snapshot;

pub use engine::forecast::{
    forecast, forecast_with_momentum, ForecastBundle, ForecastOptions, ProjectedSetScore,
    ServeRateInterval, UpcomingGame,
};
pub use engine::game::{GameOutcome, GameOutcomes, OutcomeDistribution};
pub use engine::momentum::{LeverageSample, MomentumTracker};
pub use error::{ForecastError, Result};
pub use snapshot::{MatchSnapshot, Player, PlayerServeStats, PointRecord, ScoreState, ServeRole};
