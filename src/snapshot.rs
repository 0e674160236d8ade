//! Input data model: per-player serve statistics and the live score state.
//!
//! Collaborators (UI, paste parsers, scrapers) populate these structures;
//! the engine validates them identically regardless of source. The score
//! spine is structurally required, while per-player stat components are
//! optional and raise [`ForecastError::MissingField`] only when a
//! computation actually needs them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{check_probability, ForecastError, Result};

/// Player identity within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

/// Whether a recorded point was played on the tracked player's serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServeRole {
    Serve,
    Receive,
}

/// Serve statistics for one player.
///
/// Rates are match or season aggregates in [0, 1]. The raw counts are
/// optional; when both are present they unlock a credible interval on the
/// serve-point win rate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerServeStats {
    /// Fraction of service points where the first serve landed in.
    pub first_serve_in_rate: Option<f64>,
    /// Fraction of first-serve points won.
    pub first_serve_win_rate: Option<f64>,
    /// Fraction of second-serve points won.
    pub second_serve_win_rate: Option<f64>,
    /// Service points won so far.
    pub serve_points_won: Option<u32>,
    /// Service points played so far.
    pub serve_points_played: Option<u32>,
}

impl PlayerServeStats {
    /// Build stats from the three core rates, with no raw counts.
    pub fn from_rates(first_serve_in: f64, first_serve_win: f64, second_serve_win: f64) -> Self {
        PlayerServeStats {
            first_serve_in_rate: Some(first_serve_in),
            first_serve_win_rate: Some(first_serve_win),
            second_serve_win_rate: Some(second_serve_win),
            serve_points_won: None,
            serve_points_played: None,
        }
    }

    /// Overall probability of winning a point on serve:
    /// `fsi·fspw + (1−fsi)·sspw`.
    ///
    /// A convex combination of in-range rates, so the result is itself a
    /// probability. Absent components fail with the field's name.
    pub fn serve_point_win_rate(&self) -> Result<f64> {
        let fsi = self
            .first_serve_in_rate
            .ok_or(ForecastError::MissingField("first_serve_in_rate"))?;
        let fspw = self
            .first_serve_win_rate
            .ok_or(ForecastError::MissingField("first_serve_win_rate"))?;
        let sspw = self
            .second_serve_win_rate
            .ok_or(ForecastError::MissingField("second_serve_win_rate"))?;
        check_probability("first_serve_in_rate", fsi)?;
        check_probability("first_serve_win_rate", fspw)?;
        check_probability("second_serve_win_rate", sspw)?;
        Ok(fsi * fspw + (1.0 - fsi) * sspw)
    }
}

/// Immutable score snapshot, framed from the current server's side.
///
/// Points are game-local counts (0, 1, 2, 3, ...), not the 0/15/30/40
/// call; [`ScoreState::display_points`] renders the presentation form.
/// At six games all the in-progress unit is the tiebreak and the point
/// fields carry tiebreak points instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub points_server: i32,
    pub points_receiver: i32,
    pub games_server: i32,
    pub games_receiver: i32,
    pub sets_server: i32,
    pub sets_receiver: i32,
    /// 3 or 5.
    pub best_of_sets: i32,
    /// Who is serving the point in progress.
    pub server: Player,
}

impl ScoreState {
    /// Fresh match at love-all.
    pub fn new_match(best_of_sets: i32, server: Player) -> Self {
        ScoreState {
            points_server: 0,
            points_receiver: 0,
            games_server: 0,
            games_receiver: 0,
            sets_server: 0,
            sets_receiver: 0,
            best_of_sets,
            server,
        }
    }

    /// Sets required to win the match.
    pub fn sets_to_win(&self) -> i32 {
        self.best_of_sets / 2 + 1
    }

    /// A set at six games all is decided by a tiebreak.
    pub fn is_tiebreak(&self) -> bool {
        self.games_server == 6 && self.games_receiver == 6
    }

    /// Validate every level of the score: ranges, and no already-decided
    /// game, set, or match. Forecasts must never be requested on a
    /// finished unit.
    pub fn validate(&self) -> Result<()> {
        if self.best_of_sets != 3 && self.best_of_sets != 5 {
            return Err(ForecastError::InvalidConfiguration(format!(
                "best_of_sets must be 3 or 5, got {}",
                self.best_of_sets
            )));
        }

        let (gs, gr) = (self.games_server, self.games_receiver);
        if gs < 0 || gr < 0 {
            return Err(ForecastError::InvalidScoreState(format!(
                "negative game count {gs}-{gr}"
            )));
        }
        if gs > 7 || gr > 7 {
            return Err(ForecastError::InvalidScoreState(format!(
                "game count out of range {gs}-{gr}"
            )));
        }
        if crate::engine::set::set_decided(gs, gr) || crate::engine::set::set_decided(gr, gs) {
            return Err(ForecastError::InvalidScoreState(format!(
                "set already decided at {gs}-{gr}"
            )));
        }

        let (ss, sr) = (self.sets_server, self.sets_receiver);
        if ss < 0 || sr < 0 {
            return Err(ForecastError::InvalidScoreState(format!(
                "negative set count {ss}-{sr}"
            )));
        }
        if ss >= self.sets_to_win() || sr >= self.sets_to_win() {
            return Err(ForecastError::InvalidScoreState(format!(
                "match already decided at {ss}-{sr}"
            )));
        }

        if self.is_tiebreak() {
            crate::engine::set::validate_tiebreak_points(self.points_server, self.points_receiver)?;
        } else {
            crate::engine::game::canonical_points(self.points_server, self.points_receiver)?;
        }
        Ok(())
    }

    /// Render the in-progress game as the traditional tennis call
    /// ("40-15", "Deuce", "Ad-40"). Tiebreak points print as plain numbers.
    pub fn display_points(&self) -> String {
        let (s, r) = (self.points_server, self.points_receiver);
        if self.is_tiebreak() {
            return format!("{s}-{r}");
        }
        if s >= 3 && r >= 3 {
            return match s - r {
                0 => "Deuce".to_string(),
                d if d > 0 => "Ad-40".to_string(),
                _ => "40-Ad".to_string(),
            };
        }
        format!("{}-{}", point_call(s), point_call(r))
    }
}

fn point_call(n: i32) -> &'static str {
    match n {
        i32::MIN..=0 => "0",
        1 => "15",
        2 => "30",
        _ => "40",
    }
}

/// Everything the forecaster needs about one match at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub player_a: PlayerServeStats,
    pub player_b: PlayerServeStats,
    pub score: ScoreState,
    /// When the collaborator captured this snapshot; passed through
    /// untouched, never written by the engine.
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl MatchSnapshot {
    pub fn stats_for(&self, player: Player) -> &PlayerServeStats {
        match player {
            Player::A => &self.player_a,
            Player::B => &self.player_b,
        }
    }

    /// Stats of the player serving the point in progress.
    pub fn server_stats(&self) -> &PlayerServeStats {
        self.stats_for(self.score.server)
    }

    pub fn receiver_stats(&self) -> &PlayerServeStats {
        self.stats_for(self.score.server.opponent())
    }

    /// Check the score and both players' core rates in one pass.
    pub fn validate(&self) -> Result<()> {
        self.score.validate()?;
        self.player_a.serve_point_win_rate()?;
        self.player_b.serve_point_win_rate()?;
        Ok(())
    }
}

/// One entry of a collaborator-supplied point log, replayed through the
/// momentum tracker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointRecord {
    pub role: ServeRole,
    pub won: bool,
    /// Counterfactual win probability had the point been won.
    pub p_if_won: f64,
    /// Counterfactual win probability had the point been lost.
    pub p_if_lost: f64,
}
