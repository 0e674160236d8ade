//! Forecast orchestration: one snapshot in, one probability bundle out.
//!
//! The layering rule: the in-progress game runs on the blended,
//! momentum-adjusted point rate, while every projection beyond it
//! (upcoming games, set scores, set and match odds) uses the players'
//! raw serve rates. Blending corrects for a thin live sample on the
//! point about to be played; the projections average over enough future
//! games that the season-quality rates are the better input.
//!
//! Set and match probabilities fold the in-progress unit into the
//! chains: win or lose the current game, then evaluate the set from the
//! resulting score with the opponent serving first. A set at six games
//! all swaps the game layer out for the tiebreak chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::blend::{blend, credible_interval, DEFAULT_LIVE_WEIGHT, DEFAULT_PRIOR_RATE};
use crate::engine::game::{game_outcomes, hold_probability, GameOutcomes};
use crate::engine::match_win::match_win_probability;
use crate::engine::momentum::{
    MomentumTracker, DEFAULT_MOMENTUM_ALPHA, DEFAULT_SMOOTHING, DEFAULT_SPIKE_THRESHOLD,
    DEFAULT_WINDOW_SIZE,
};
use crate::engine::set::{
    set_decided, set_win_probability, tiebreak_point_rate, tiebreak_win_probability,
    tiebreak_win_probability_from,
};
use crate::error::{check_probability, ForecastError, Result};
use crate::snapshot::{MatchSnapshot, Player};

/// Flat Beta(1, 1) prior behind the serve-rate credible intervals.
const INTERVAL_PRIOR: (f64, f64) = (1.0, 1.0);

/// Default horizon, in games, for upcoming-game and set-score
/// projections.
pub const DEFAULT_GAMES_AHEAD: usize = 3;

/// Tunable knobs for a forecast run. [`Default`] gives the standard
/// configuration; construct-and-override for anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastOptions {
    /// Weight on the live serve rate when blending against the prior.
    pub live_weight: f64,
    /// Prior serve-point win rate blended in early.
    pub prior_rate: f64,
    /// Momentum decay parameter. Deliberately unvalidated: values above
    /// 1 oscillate, and the evaluation itself reports instability.
    pub momentum_alpha: f64,
    /// Rolling-window length for the momentum tracker.
    pub window_size: usize,
    /// Additive smoothing for the rolling point-win rates.
    pub smoothing: f64,
    /// Projection horizon in games.
    pub games_ahead: usize,
    /// Override for the server's tiebreak win probability. When absent
    /// it is derived from both players' serve rates.
    pub tiebreak_win_probability: Option<f64>,
    /// Minimum recent momentum gain reported as a spike.
    pub spike_threshold: f64,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        ForecastOptions {
            live_weight: DEFAULT_LIVE_WEIGHT,
            prior_rate: DEFAULT_PRIOR_RATE,
            momentum_alpha: DEFAULT_MOMENTUM_ALPHA,
            window_size: DEFAULT_WINDOW_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            games_ahead: DEFAULT_GAMES_AHEAD,
            tiebreak_win_probability: None,
            spike_threshold: DEFAULT_SPIKE_THRESHOLD,
        }
    }
}

impl ForecastOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.live_weight) {
            return Err(ForecastError::InvalidWeight {
                value: self.live_weight,
            });
        }
        check_probability("prior_rate", self.prior_rate)?;
        if let Some(tb) = self.tiebreak_win_probability {
            check_probability("tiebreak_win_probability", tb)?;
        }
        if self.window_size == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "window_size must be at least 1".to_string(),
            ));
        }
        if !(self.smoothing > 0.0 && self.smoothing.is_finite()) {
            return Err(ForecastError::InvalidConfiguration(
                "smoothing must be positive".to_string(),
            ));
        }
        if self.games_ahead == 0 {
            return Err(ForecastError::InvalidConfiguration(
                "games_ahead must be at least 1".to_string(),
            ));
        }
        if !(self.spike_threshold >= 0.0 && self.spike_threshold.is_finite()) {
            return Err(ForecastError::InvalidConfiguration(
                "spike_threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Bundle ──────────────────────────────────────────────────────────────────

/// Hold/break outlook for one future game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpcomingGame {
    pub server: Player,
    pub hold_probability: f64,
    pub break_probability: f64,
}

/// One possible set score after the projection horizon, with its mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedSetScore {
    pub games_server: i32,
    pub games_receiver: i32,
    pub probability: f64,
}

/// 95% credible interval on one player's serve-point win rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServeRateInterval {
    pub player: Player,
    pub low: f64,
    pub high: f64,
}

/// Complete forecast for one snapshot, framed from the current server's
/// side throughout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastBundle {
    /// Who all the probabilities are for.
    pub server: Player,
    /// Blended, momentum-adjusted per-point win rate driving the
    /// current game.
    pub point_win_probability: f64,
    /// Signed shift momentum applied on top of the blended rate
    /// (zero without a tracker, and reflects clamping).
    pub momentum_adjustment: f64,
    /// Probability of winning the in-progress game, or the in-progress
    /// tiebreak at six games all.
    pub hold_probability: f64,
    /// Ending distribution for the in-progress game. Absent during a
    /// tiebreak.
    pub game: Option<GameOutcomes>,
    /// Hold/break outlook for the next games, alternating serve.
    pub upcoming_games: Vec<UpcomingGame>,
    /// Set-score distribution at the projection horizon.
    pub projected_set_scores: Vec<ProjectedSetScore>,
    /// Probability of winning the current set.
    pub set_win_probability: f64,
    /// Probability of winning the match.
    pub match_win_probability: f64,
    /// Credible intervals for players whose raw serve counts were
    /// supplied.
    pub serve_rate_intervals: Vec<ServeRateInterval>,
    /// Echo of the snapshot's capture timestamp.
    pub captured_at: Option<chrono::DateTime<chrono::Utc>>,
}

// ── Entry points ────────────────────────────────────────────────────────────

/// Forecast a snapshot with no momentum input.
pub fn forecast(snapshot: &MatchSnapshot, options: &ForecastOptions) -> Result<ForecastBundle> {
    forecast_inner(snapshot, options, None)
}

/// Forecast a snapshot with the tracked player's momentum folded into
/// the current game's point rate.
pub fn forecast_with_momentum(
    snapshot: &MatchSnapshot,
    options: &ForecastOptions,
    tracker: &MomentumTracker,
) -> Result<ForecastBundle> {
    forecast_inner(snapshot, options, Some(tracker))
}

fn forecast_inner(
    snapshot: &MatchSnapshot,
    options: &ForecastOptions,
    tracker: Option<&MomentumTracker>,
) -> Result<ForecastBundle> {
    options.validate()?;
    snapshot.score.validate()?;
    let score = snapshot.score;

    let raw_server = snapshot.server_stats().serve_point_win_rate()?;
    let raw_receiver = snapshot.receiver_stats().serve_point_win_rate()?;
    let blended = blend(raw_server, options.prior_rate, options.live_weight)?;
    let momentum = match tracker {
        Some(t) => t.current_momentum(options.momentum_alpha)?,
        None => 0.0,
    };
    let point_win = (blended + momentum).clamp(0.0, 1.0);
    let momentum_adjustment = point_win - blended;
    debug!(
        "point model: raw {:.3}, blended {:.3}, momentum {:+.3} -> {:.3}",
        raw_server, blended, momentum_adjustment, point_win
    );

    let hold_server = hold_probability(0, 0, raw_server)?;
    let hold_receiver = hold_probability(0, 0, raw_receiver)?;
    let tiebreak_server = match options.tiebreak_win_probability {
        Some(tb) => tb,
        None => tiebreak_win_probability(tiebreak_point_rate(raw_server, raw_receiver)?)?,
    };

    let (game, hold_now, upcoming_games, projected_set_scores, set_now) = if score.is_tiebreak() {
        // The override is a from-scratch probability; once points are on
        // the board the chain runs from the live score instead.
        let tb_now = match options.tiebreak_win_probability {
            Some(tb) if score.points_server == 0 && score.points_receiver == 0 => tb,
            _ => tiebreak_win_probability_from(
                score.points_server,
                score.points_receiver,
                tiebreak_point_rate(raw_server, raw_receiver)?,
            )?,
        };
        let projected = vec![
            ProjectedSetScore {
                games_server: 7,
                games_receiver: 6,
                probability: tb_now,
            },
            ProjectedSetScore {
                games_server: 6,
                games_receiver: 7,
                probability: 1.0 - tb_now,
            },
        ];
        (None, tb_now, Vec::new(), projected, tb_now)
    } else {
        let outcomes = game_outcomes(score.points_server, score.points_receiver, point_win)?;
        let hold_now = hold_probability(score.points_server, score.points_receiver, point_win)?;
        let upcoming = upcoming_outlook(score.server, hold_server, hold_receiver, options.games_ahead);
        let set_now = set_after_current_game(
            score.games_server,
            score.games_receiver,
            hold_now,
            hold_server,
            hold_receiver,
            tiebreak_server,
        )?;
        let projected = project_set_scores(
            score.games_server,
            score.games_receiver,
            hold_now,
            hold_server,
            hold_receiver,
            options.games_ahead,
        );
        (Some(outcomes), hold_now, upcoming, projected, set_now)
    };

    let fresh_set = fresh_set_probability(hold_server, hold_receiver, tiebreak_server)?;
    let match_now = match_after_current_set(
        set_now,
        score.sets_server,
        score.sets_receiver,
        fresh_set,
        score.best_of_sets,
    )?;
    let serve_rate_intervals = serve_rate_intervals(snapshot)?;
    debug!(
        "chains: hold {:.3}, set {:.3}, match {:.3} from {}-{} games, {}-{} sets",
        hold_now,
        set_now,
        match_now,
        score.games_server,
        score.games_receiver,
        score.sets_server,
        score.sets_receiver
    );

    Ok(ForecastBundle {
        server: score.server,
        point_win_probability: point_win,
        momentum_adjustment,
        hold_probability: hold_now,
        game,
        upcoming_games,
        projected_set_scores,
        set_win_probability: set_now,
        match_win_probability: match_now,
        serve_rate_intervals,
        captured_at: snapshot.captured_at,
    })
}

// ── Folding helpers ─────────────────────────────────────────────────────────

fn upcoming_outlook(
    server: Player,
    hold_server: f64,
    hold_receiver: f64,
    count: usize,
) -> Vec<UpcomingGame> {
    (0..count)
        .map(|k| {
            // Serve alternates: the game after the current one belongs
            // to the receiver.
            let (who, hold) = if k % 2 == 0 {
                (server.opponent(), hold_receiver)
            } else {
                (server, hold_server)
            };
            UpcomingGame {
                server: who,
                hold_probability: hold,
                break_probability: 1.0 - hold,
            }
        })
        .collect()
}

/// Set probability folding the current game: branch on its outcome,
/// then evaluate the set with the opponent serving first.
fn set_after_current_game(
    games_server: i32,
    games_receiver: i32,
    hold_now: f64,
    hold_server: f64,
    hold_receiver: f64,
    tiebreak_server: f64,
) -> Result<f64> {
    let held = set_from_next_opponent_serve(
        games_server + 1,
        games_receiver,
        hold_server,
        hold_receiver,
        tiebreak_server,
    )?;
    let broken = set_from_next_opponent_serve(
        games_server,
        games_receiver + 1,
        hold_server,
        hold_receiver,
        tiebreak_server,
    )?;
    Ok(hold_now * held + (1.0 - hold_now) * broken)
}

fn set_from_next_opponent_serve(
    games_server: i32,
    games_receiver: i32,
    hold_server: f64,
    hold_receiver: f64,
    tiebreak_server: f64,
) -> Result<f64> {
    if set_decided(games_server, games_receiver) {
        return Ok(1.0);
    }
    if set_decided(games_receiver, games_server) {
        return Ok(0.0);
    }
    // The set chain is framed for whoever serves next, which is the
    // opponent here; complement back to the tracked player's side.
    let opponent = set_win_probability(
        hold_receiver,
        hold_server,
        games_receiver,
        games_server,
        Some(1.0 - tiebreak_server),
    )?;
    Ok(1.0 - opponent)
}

/// Chance of winning a future fresh set, averaged over who serves it
/// first.
fn fresh_set_probability(
    hold_server: f64,
    hold_receiver: f64,
    tiebreak_server: f64,
) -> Result<f64> {
    let serving = set_win_probability(hold_server, hold_receiver, 0, 0, Some(tiebreak_server))?;
    let receiving = 1.0
        - set_win_probability(
            hold_receiver,
            hold_server,
            0,
            0,
            Some(1.0 - tiebreak_server),
        )?;
    Ok(0.5 * (serving + receiving))
}

fn match_after_current_set(
    set_now: f64,
    sets_server: i32,
    sets_receiver: i32,
    fresh_set: f64,
    best_of_sets: i32,
) -> Result<f64> {
    let needed = best_of_sets / 2 + 1;
    let won = match_branch(sets_server + 1, sets_receiver, needed, fresh_set, best_of_sets)?;
    let lost = match_branch(sets_server, sets_receiver + 1, needed, fresh_set, best_of_sets)?;
    Ok(set_now * won + (1.0 - set_now) * lost)
}

fn match_branch(
    sets_server: i32,
    sets_receiver: i32,
    needed: i32,
    fresh_set: f64,
    best_of_sets: i32,
) -> Result<f64> {
    if sets_server >= needed {
        return Ok(1.0);
    }
    if sets_receiver >= needed {
        return Ok(0.0);
    }
    match_win_probability(fresh_set, sets_server, sets_receiver, best_of_sets)
}

/// Distribution of set scores exactly `games_ahead` games from now,
/// counting the in-progress game as the first. Decided sets and a
/// pending tiebreak absorb their mass.
fn project_set_scores(
    games_server: i32,
    games_receiver: i32,
    hold_now: f64,
    hold_server: f64,
    hold_receiver: f64,
    games_ahead: usize,
) -> Vec<ProjectedSetScore> {
    let mut states: BTreeMap<(i32, i32, bool), f64> = BTreeMap::new();
    states.insert((games_server + 1, games_receiver, false), hold_now);
    states.insert((games_server, games_receiver + 1, false), 1.0 - hold_now);

    for _ in 1..games_ahead {
        let mut next: BTreeMap<(i32, i32, bool), f64> = BTreeMap::new();
        for (&(a, b, server_turn), &mass) in &states {
            if absorbed(a, b) {
                *next.entry((a, b, server_turn)).or_insert(0.0) += mass;
                continue;
            }
            let p_hold = if server_turn { hold_server } else { hold_receiver };
            let (held, broken) = if server_turn {
                ((a + 1, b), (a, b + 1))
            } else {
                ((a, b + 1), (a + 1, b))
            };
            *next.entry((held.0, held.1, !server_turn)).or_insert(0.0) += mass * p_hold;
            *next.entry((broken.0, broken.1, !server_turn)).or_insert(0.0) +=
                mass * (1.0 - p_hold);
        }
        states = next;
    }

    let mut collapsed: BTreeMap<(i32, i32), f64> = BTreeMap::new();
    for (&(a, b, _), &mass) in &states {
        *collapsed.entry((a, b)).or_insert(0.0) += mass;
    }
    collapsed
        .into_iter()
        .filter(|&(_, mass)| mass > 0.0)
        .map(|((a, b), probability)| ProjectedSetScore {
            games_server: a,
            games_receiver: b,
            probability,
        })
        .collect()
}

fn absorbed(games_a: i32, games_b: i32) -> bool {
    set_decided(games_a, games_b) || set_decided(games_b, games_a) || (games_a == 6 && games_b == 6)
}

fn serve_rate_intervals(snapshot: &MatchSnapshot) -> Result<Vec<ServeRateInterval>> {
    let mut intervals = Vec::new();
    for player in [Player::A, Player::B] {
        let stats = snapshot.stats_for(player);
        if let (Some(won), Some(played)) = (stats.serve_points_won, stats.serve_points_played) {
            let (low, high) = credible_interval(won, played, INTERVAL_PRIOR.0, INTERVAL_PRIOR.1)?;
            intervals.push(ServeRateInterval { player, low, high });
        }
    }
    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{PlayerServeStats, ScoreState, ServeRole};
    use approx::assert_relative_eq;

    /// A serves at 0.743 raw (0.65·0.82 + 0.35·0.60), B at 0.737
    /// (0.65·0.80 + 0.35·0.62).
    fn make_snapshot(server: Player) -> MatchSnapshot {
        MatchSnapshot {
            player_a: PlayerServeStats::from_rates(0.65, 0.82, 0.60),
            player_b: PlayerServeStats::from_rates(0.65, 0.80, 0.62),
            score: ScoreState::new_match(3, server),
            captured_at: None,
        }
    }

    #[test]
    fn test_blended_outlook_at_game_start() {
        let snapshot = make_snapshot(Player::A);
        let bundle = forecast(&snapshot, &ForecastOptions::default()).unwrap();

        // 0.7·0.743 + 0.3·0.62 = 0.7061, with no tracker attached.
        assert_relative_eq!(bundle.point_win_probability, 0.7061, epsilon = 1e-9);
        assert_eq!(bundle.momentum_adjustment, 0.0);

        // Reaching deuce from love-all at that rate: 20p³q³ ≈ 0.179.
        let game = bundle.game.expect("game layer present outside tiebreaks");
        assert!((game.deuce_probability - 0.179).abs() < 1e-3);
    }

    #[test]
    fn test_upcoming_game_hold_for_the_new_server() {
        // Best-of-5 at sets 1-0, games 3-2. The next game belongs to
        // the receiver, whose raw 0.737 rate holds about 94% of the
        // time regardless of any blending on the current game.
        let snapshot = MatchSnapshot {
            player_a: PlayerServeStats::from_rates(0.70, 0.85, 0.65),
            player_b: PlayerServeStats::from_rates(0.65, 0.80, 0.62),
            score: ScoreState {
                points_server: 0,
                points_receiver: 0,
                games_server: 3,
                games_receiver: 2,
                sets_server: 1,
                sets_receiver: 0,
                best_of_sets: 5,
                server: Player::A,
            },
            captured_at: None,
        };
        let bundle = forecast(&snapshot, &ForecastOptions::default()).unwrap();

        let next = &bundle.upcoming_games[0];
        assert_eq!(next.server, Player::B);
        assert!((next.hold_probability - 0.94).abs() < 1e-2);
        assert!((next.break_probability - 0.06).abs() < 1e-2);
        assert_relative_eq!(
            next.hold_probability + next.break_probability,
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_bundle_internal_consistency() {
        let mut snapshot = make_snapshot(Player::A);
        snapshot.score.points_server = 2;
        snapshot.score.points_receiver = 1;
        snapshot.score.games_server = 3;
        snapshot.score.games_receiver = 2;
        snapshot.score.sets_server = 1;
        let bundle = forecast(&snapshot, &ForecastOptions::default()).unwrap();

        let game = bundle.game.as_ref().expect("game layer present");
        assert_relative_eq!(
            bundle.hold_probability,
            game.distribution.hold_mass(),
            epsilon = 1e-9
        );

        let servers: Vec<Player> = bundle.upcoming_games.iter().map(|g| g.server).collect();
        assert_eq!(servers, vec![Player::B, Player::A, Player::B]);

        let projected_total: f64 = bundle
            .projected_set_scores
            .iter()
            .map(|s| s.probability)
            .sum();
        assert_relative_eq!(projected_total, 1.0, epsilon = 1e-9);

        for value in [
            bundle.point_win_probability,
            bundle.hold_probability,
            bundle.set_win_probability,
            bundle.match_win_probability,
        ] {
            assert!((0.0..=1.0).contains(&value), "out of range: {value}");
        }
    }

    #[test]
    fn test_momentum_shifts_only_the_current_game() {
        let snapshot = make_snapshot(Player::A);
        let options = ForecastOptions::default();
        let plain = forecast(&snapshot, &options).unwrap();

        // Uniform 0.1 leverages average to 0.1 under any weighting.
        let mut tracker = MomentumTracker::new(options.window_size).unwrap();
        for _ in 0..6 {
            tracker.record_point(ServeRole::Serve, true, 0.7, 0.6).unwrap();
        }
        let adjusted = forecast_with_momentum(&snapshot, &options, &tracker).unwrap();

        assert_relative_eq!(adjusted.momentum_adjustment, 0.1, epsilon = 1e-9);
        assert_relative_eq!(
            adjusted.point_win_probability,
            plain.point_win_probability + 0.1,
            epsilon = 1e-9
        );
        assert!(adjusted.hold_probability > plain.hold_probability);

        // Projections stay on raw rates: identical with or without
        // momentum.
        assert_relative_eq!(
            adjusted.upcoming_games[0].hold_probability,
            plain.upcoming_games[0].hold_probability,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_empty_tracker_matches_plain_forecast() {
        let snapshot = make_snapshot(Player::B);
        let options = ForecastOptions::default();
        let tracker = MomentumTracker::new(options.window_size).unwrap();
        let plain = forecast(&snapshot, &options).unwrap();
        let tracked = forecast_with_momentum(&snapshot, &options, &tracker).unwrap();

        assert_eq!(tracked.momentum_adjustment, 0.0);
        assert_relative_eq!(
            tracked.point_win_probability,
            plain.point_win_probability,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            tracked.match_win_probability,
            plain.match_win_probability,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_stat_component_propagates() {
        let mut snapshot = make_snapshot(Player::A);
        snapshot.player_b.second_serve_win_rate = None;
        assert!(matches!(
            forecast(&snapshot, &ForecastOptions::default()),
            Err(ForecastError::MissingField("second_serve_win_rate"))
        ));
    }

    #[test]
    fn test_rejects_decided_set_score() {
        let mut snapshot = make_snapshot(Player::A);
        snapshot.score.games_server = 6;
        snapshot.score.games_receiver = 4;
        assert!(matches!(
            forecast(&snapshot, &ForecastOptions::default()),
            Err(ForecastError::InvalidScoreState(_))
        ));
    }

    #[test]
    fn test_stronger_serve_lifts_match_odds() {
        let base = make_snapshot(Player::A);
        let mut boosted = make_snapshot(Player::A);
        boosted.player_a = PlayerServeStats::from_rates(0.70, 0.85, 0.65);

        let options = ForecastOptions::default();
        let weak = forecast(&base, &options).unwrap();
        let strong = forecast(&boosted, &options).unwrap();
        assert!(strong.match_win_probability > weak.match_win_probability);
    }

    #[test]
    fn test_intervals_only_for_players_with_counts() {
        let mut snapshot = make_snapshot(Player::A);
        snapshot.player_a.serve_points_won = Some(48);
        snapshot.player_a.serve_points_played = Some(70);
        let bundle = forecast(&snapshot, &ForecastOptions::default()).unwrap();

        assert_eq!(bundle.serve_rate_intervals.len(), 1);
        let interval = &bundle.serve_rate_intervals[0];
        assert_eq!(interval.player, Player::A);
        assert!(0.0 < interval.low && interval.low < interval.high && interval.high < 1.0);
    }

    #[test]
    fn test_tiebreak_in_progress() {
        let mut snapshot = make_snapshot(Player::A);
        snapshot.score.games_server = 6;
        snapshot.score.games_receiver = 6;
        snapshot.score.points_server = 5;
        snapshot.score.points_receiver = 4;
        let bundle = forecast(&snapshot, &ForecastOptions::default()).unwrap();

        assert!(bundle.game.is_none());
        assert!(bundle.upcoming_games.is_empty());
        assert_relative_eq!(
            bundle.hold_probability,
            bundle.set_win_probability,
            epsilon = 1e-12
        );

        // 0.5·0.743 + 0.5·(1 − 0.737) = 0.503 per point, from 5-4 up.
        let rate = tiebreak_point_rate(0.743, 0.737).unwrap();
        let expected = tiebreak_win_probability_from(5, 4, rate).unwrap();
        assert_relative_eq!(bundle.set_win_probability, expected, epsilon = 1e-9);

        assert_eq!(bundle.projected_set_scores.len(), 2);
        let total: f64 = bundle
            .projected_set_scores
            .iter()
            .map(|s| s.probability)
            .sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
        assert_eq!(bundle.projected_set_scores[0].games_server, 7);
        assert_relative_eq!(
            bundle.projected_set_scores[0].probability,
            bundle.set_win_probability,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tiebreak_override_applies_from_scratch() {
        let mut snapshot = make_snapshot(Player::A);
        snapshot.score.games_server = 6;
        snapshot.score.games_receiver = 6;
        let options = ForecastOptions {
            tiebreak_win_probability: Some(0.75),
            ..ForecastOptions::default()
        };
        let bundle = forecast(&snapshot, &options).unwrap();
        assert_relative_eq!(bundle.set_win_probability, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_options_validation() {
        assert!(ForecastOptions::default().validate().is_ok());

        let options = ForecastOptions {
            live_weight: 1.4,
            ..ForecastOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ForecastError::InvalidWeight { .. })
        ));

        let options = ForecastOptions {
            games_ahead: 0,
            ..ForecastOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ForecastError::InvalidConfiguration(_))
        ));

        let options = ForecastOptions {
            spike_threshold: -0.2,
            ..ForecastOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
