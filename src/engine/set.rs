//! Set-level chain over alternating service games, plus the tiebreak.
//!
//! The set is a Markov chain on (games won, games lost, whose serve is
//! next). Service alternates every game, so each transition uses either
//! the perspective player's hold probability or the complement of the
//! opponent's. Six games all hands over to the tiebreak, which is its
//! own first-to-seven chain on points with serve-neutral rates.

use std::collections::HashMap;

use crate::engine::game::deuce_closed_form;
use crate::error::{check_probability, ForecastError, Result};

// ── Game-score bookkeeping ──────────────────────────────────────────────────

/// True when `own` games already won the set against `opp`.
pub(crate) fn set_decided(own: i32, opp: i32) -> bool {
    own == 7 || (own >= 6 && own - opp >= 2)
}

fn validate_games(g1: i32, g2: i32) -> Result<()> {
    if g1 < 0 || g2 < 0 {
        return Err(ForecastError::InvalidScoreState(format!(
            "negative game count {g1}-{g2}"
        )));
    }
    if g1 > 7 || g2 > 7 {
        return Err(ForecastError::InvalidScoreState(format!(
            "game count out of range {g1}-{g2}"
        )));
    }
    if set_decided(g1, g2) || set_decided(g2, g1) {
        return Err(ForecastError::InvalidScoreState(format!(
            "set already decided at {g1}-{g2}"
        )));
    }
    Ok(())
}

// ── Set win probability ─────────────────────────────────────────────────────

/// Probability that the player serving the next game wins the set.
///
/// `hold_server` is that player's hold probability per service game,
/// `hold_receiver` the opponent's, and the game score is from the same
/// player's side. `tiebreak_win` is consulted only if a reachable path
/// arrives at six games all; states that cannot reach 6-6 (including
/// decisive hold rates) never require it.
pub fn set_win_probability(
    hold_server: f64,
    hold_receiver: f64,
    games_server: i32,
    games_receiver: i32,
    tiebreak_win: Option<f64>,
) -> Result<f64> {
    check_probability("hold_server", hold_server)?;
    check_probability("hold_receiver", hold_receiver)?;
    if let Some(tb) = tiebreak_win {
        check_probability("tiebreak_win", tb)?;
    }
    validate_games(games_server, games_receiver)?;
    let mut memo = HashMap::new();
    set_rec(
        games_server,
        games_receiver,
        true,
        hold_server,
        hold_receiver,
        tiebreak_win,
        &mut memo,
    )
}

fn set_rec(
    g1: i32,
    g2: i32,
    server_turn: bool,
    hold_server: f64,
    hold_receiver: f64,
    tiebreak_win: Option<f64>,
    memo: &mut HashMap<(i32, i32, bool), f64>,
) -> Result<f64> {
    if (g1 >= 6 && g1 - g2 >= 2) || g1 == 7 {
        return Ok(1.0);
    }
    if (g2 >= 6 && g2 - g1 >= 2) || g2 == 7 {
        return Ok(0.0);
    }
    if g1 == 6 && g2 == 6 {
        return tiebreak_win.ok_or(ForecastError::MissingParameter("tiebreak_win_probability"));
    }
    if let Some(&cached) = memo.get(&(g1, g2, server_turn)) {
        return Ok(cached);
    }
    let p_game = if server_turn {
        hold_server
    } else {
        1.0 - hold_receiver
    };
    // Zero-probability branches are skipped so the tiebreak parameter is
    // only demanded on paths that can actually occur.
    let up = if p_game > 0.0 {
        set_rec(g1 + 1, g2, !server_turn, hold_server, hold_receiver, tiebreak_win, memo)?
    } else {
        0.0
    };
    let down = if p_game < 1.0 {
        set_rec(g1, g2 + 1, !server_turn, hold_server, hold_receiver, tiebreak_win, memo)?
    } else {
        0.0
    };
    let value = p_game * up + (1.0 - p_game) * down;
    memo.insert((g1, g2, server_turn), value);
    Ok(value)
}

// ── Tiebreak ────────────────────────────────────────────────────────────────

pub(crate) fn validate_tiebreak_points(a: i32, b: i32) -> Result<()> {
    if a < 0 || b < 0 {
        return Err(ForecastError::InvalidScoreState(format!(
            "negative tiebreak point count {a}-{b}"
        )));
    }
    if (a >= 7 && a - b >= 2) || (b >= 7 && b - a >= 2) {
        return Err(ForecastError::InvalidScoreState(format!(
            "tiebreak already decided at {a}-{b}"
        )));
    }
    Ok(())
}

/// Probability of winning a tiebreak from 0-0 with serve-neutral
/// per-point rate `p`.
pub fn tiebreak_win_probability(p: f64) -> Result<f64> {
    tiebreak_win_probability_from(0, 0, p)
}

/// Probability of winning a tiebreak already at points (`a`, `b`).
///
/// First to seven, two clear; from six-all the margin race has the same
/// closed form as the deuce loop.
pub fn tiebreak_win_probability_from(a: i32, b: i32, p: f64) -> Result<f64> {
    check_probability("tiebreak_point_rate", p)?;
    validate_tiebreak_points(a, b)?;
    let mut memo = HashMap::new();
    Ok(tiebreak_rec(a, b, p, &mut memo))
}

fn tiebreak_rec(a: i32, b: i32, p: f64, memo: &mut HashMap<(i32, i32), f64>) -> f64 {
    if a >= 7 && a - b >= 2 {
        return 1.0;
    }
    if b >= 7 && b - a >= 2 {
        return 0.0;
    }
    if a >= 6 && b >= 6 {
        let d = deuce_closed_form(p);
        return match a - b {
            1 => p + (1.0 - p) * d,
            -1 => p * d,
            _ => d,
        };
    }
    if let Some(&cached) = memo.get(&(a, b)) {
        return cached;
    }
    let value = p * tiebreak_rec(a + 1, b, p, memo) + (1.0 - p) * tiebreak_rec(a, b + 1, p, memo);
    memo.insert((a, b), value);
    value
}

/// Serve-neutral tiebreak point rate: serve alternates, so weight own
/// serve points and return points equally.
pub fn tiebreak_point_rate(own_serve_rate: f64, opp_serve_rate: f64) -> Result<f64> {
    check_probability("own_serve_rate", own_serve_rate)?;
    check_probability("opp_serve_rate", opp_serve_rate)?;
    Ok(0.5 * own_serve_rate + 0.5 * (1.0 - opp_serve_rate))
}
