//! Probability engine: exact game/set/match chains, prior blending,
//! and momentum tracking.

pub mod blend;
pub mod forecast;
pub mod game;
pub mod match_win;
pub mod momentum;
pub mod set;

pub use forecast::{forecast, forecast_with_momentum, ForecastBundle, ForecastOptions};
pub use game::{GameOutcome, GameOutcomes, OutcomeDistribution};
pub use momentum::MomentumTracker;
