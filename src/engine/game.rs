//! Single-game win probability on serve.
//!
//! The game is a Markov chain on point scores (s, r) with an absorbing
//! win at 4+ points and a two-point margin. Past 3-3 the chain has a
//! two-state loop (deuce/advantage) whose absorption probability has the
//! closed form
//!
//! ```text
//! P(hold | deuce) = p² / (1 − 2p(1 − p))
//! ```
//!
//! obtained by summing the geometric series of deuce returns. The
//! denominator is 1 minus the probability of trading points back to
//! deuce, and never drops below 0.5, so the division is always stable.
//! All pre-deuce states are evaluated by memoized recursion on top of
//! that anchor; the memo is per-call because it is specific to one `p`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{check_probability, ForecastError, Result};

// ── Score canonicalization ──────────────────────────────────────────────────

/// Map a raw point score onto the canonical chain states.
///
/// Scores deep in the deuce loop (5-4, 7-6, ...) collapse onto the three
/// representative states deuce (3,3), server advantage (4,3) and receiver
/// advantage (3,4), since only the point differential matters there.
/// Decided games and negative counts are rejected.
pub(crate) fn canonical_points(s: i32, r: i32) -> Result<(i32, i32)> {
    if s < 0 || r < 0 {
        return Err(ForecastError::InvalidScoreState(format!(
            "negative point count {s}-{r}"
        )));
    }
    if s >= 3 && r >= 3 {
        return match s - r {
            0 => Ok((3, 3)),
            1 => Ok((4, 3)),
            -1 => Ok((3, 4)),
            _ => Err(ForecastError::InvalidScoreState(format!(
                "game already decided at {s}-{r}"
            ))),
        };
    }
    if s >= 4 || r >= 4 {
        return Err(ForecastError::InvalidScoreState(format!(
            "game already decided at {s}-{r}"
        )));
    }
    Ok((s, r))
}

// ── Deuce closed form ───────────────────────────────────────────────────────

pub(crate) fn deuce_closed_form(p: f64) -> f64 {
    p * p / (1.0 - 2.0 * p * (1.0 - p))
}

/// Probability that the server wins a game from deuce, given per-point
/// win probability `p`.
pub fn deuce_win_probability(p: f64) -> Result<f64> {
    check_probability("point_win_probability", p)?;
    Ok(deuce_closed_form(p))
}

// ── Hold probability ────────────────────────────────────────────────────────

/// Probability that the server holds from point score
/// (`points_server`, `points_receiver`), given per-point win probability
/// `p` on serve.
pub fn hold_probability(points_server: i32, points_receiver: i32, p: f64) -> Result<f64> {
    check_probability("point_win_probability", p)?;
    let (s, r) = canonical_points(points_server, points_receiver)?;
    let mut memo = HashMap::new();
    Ok(hold_rec(s, r, p, &mut memo))
}

fn hold_rec(s: i32, r: i32, p: f64, memo: &mut HashMap<(i32, i32), f64>) -> f64 {
    if s >= 4 && s - r >= 2 {
        return 1.0;
    }
    if r >= 4 && r - s >= 2 {
        return 0.0;
    }
    // Deuce loop: resolve through the closed form instead of recursing
    // into an infinite alternation.
    if s >= 3 && r >= 3 {
        let d = deuce_closed_form(p);
        return match s - r {
            1 => p + (1.0 - p) * d,
            -1 => p * d,
            _ => d,
        };
    }
    if let Some(&cached) = memo.get(&(s, r)) {
        return cached;
    }
    let value = p * hold_rec(s + 1, r, p, memo) + (1.0 - p) * hold_rec(s, r + 1, p, memo);
    memo.insert((s, r), value);
    value
}

// ── Outcome distribution ────────────────────────────────────────────────────

/// How a game ends, labeled from the server's side.
///
/// "To love/15/30" is the loser's point count at the final point;
/// anything that passes through deuce lands in the deuce buckets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum GameOutcome {
    HoldToLove,
    HoldTo15,
    HoldTo30,
    HoldViaDeuce,
    BreakToLove,
    BreakTo15,
    BreakTo30,
    BreakViaDeuce,
}

impl GameOutcome {
    pub const ALL: [GameOutcome; 8] = [
        GameOutcome::HoldToLove,
        GameOutcome::HoldTo15,
        GameOutcome::HoldTo30,
        GameOutcome::HoldViaDeuce,
        GameOutcome::BreakToLove,
        GameOutcome::BreakTo15,
        GameOutcome::BreakTo30,
        GameOutcome::BreakViaDeuce,
    ];

    pub fn is_hold(self) -> bool {
        matches!(
            self,
            GameOutcome::HoldToLove
                | GameOutcome::HoldTo15
                | GameOutcome::HoldTo30
                | GameOutcome::HoldViaDeuce
        )
    }
}

/// Probability mass over the eight game endings. Every label is always
/// present (possibly at 0.0) and the total is 1 up to rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDistribution {
    map: BTreeMap<GameOutcome, f64>,
}

impl OutcomeDistribution {
    fn zeroed() -> Self {
        let mut map = BTreeMap::new();
        for outcome in GameOutcome::ALL {
            map.insert(outcome, 0.0);
        }
        OutcomeDistribution { map }
    }

    fn add(&mut self, outcome: GameOutcome, mass: f64) {
        if let Some(slot) = self.map.get_mut(&outcome) {
            *slot += mass;
        }
    }

    pub fn probability(&self, outcome: GameOutcome) -> f64 {
        self.map.get(&outcome).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GameOutcome, f64)> + '_ {
        self.map.iter().map(|(&outcome, &mass)| (outcome, mass))
    }

    pub fn total(&self) -> f64 {
        self.map.values().sum()
    }

    /// Combined mass of the four hold endings. Equals the hold
    /// probability from the same state.
    pub fn hold_mass(&self) -> f64 {
        self.iter()
            .filter(|(outcome, _)| outcome.is_hold())
            .map(|(_, mass)| mass)
            .sum()
    }
}

/// Full game forecast: ending distribution plus the chance the game
/// reaches deuce at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcomes {
    pub distribution: OutcomeDistribution,
    /// Probability the game visits deuce from the given state (1.0 when
    /// the score is already in the deuce loop).
    pub deuce_probability: f64,
}

/// Distribution over the eight game endings from point score
/// (`points_server`, `points_receiver`).
pub fn game_outcomes(points_server: i32, points_receiver: i32, p: f64) -> Result<GameOutcomes> {
    check_probability("point_win_probability", p)?;
    let (s, r) = canonical_points(points_server, points_receiver)?;
    let mut distribution = OutcomeDistribution::zeroed();
    accumulate_outcomes(s, r, 1.0, p, &mut distribution);
    let deuce_probability = deuce_reach(s, r, p);
    Ok(GameOutcomes {
        distribution,
        deuce_probability,
    })
}

fn accumulate_outcomes(s: i32, r: i32, mass: f64, p: f64, dist: &mut OutcomeDistribution) {
    if s >= 3 && r >= 3 {
        // Everything that reaches the deuce loop ends via deuce; split
        // the mass by the loop's absorption probability from this state.
        let d = deuce_closed_form(p);
        let hold = match s - r {
            1 => p + (1.0 - p) * d,
            -1 => p * d,
            _ => d,
        };
        dist.add(GameOutcome::HoldViaDeuce, mass * hold);
        dist.add(GameOutcome::BreakViaDeuce, mass * (1.0 - hold));
        return;
    }
    if s == 4 {
        dist.add(hold_label(r), mass);
        return;
    }
    if r == 4 {
        dist.add(break_label(s), mass);
        return;
    }
    accumulate_outcomes(s + 1, r, mass * p, p, dist);
    accumulate_outcomes(s, r + 1, mass * (1.0 - p), p, dist);
}

fn hold_label(receiver_points: i32) -> GameOutcome {
    match receiver_points {
        0 => GameOutcome::HoldToLove,
        1 => GameOutcome::HoldTo15,
        _ => GameOutcome::HoldTo30,
    }
}

fn break_label(server_points: i32) -> GameOutcome {
    match server_points {
        0 => GameOutcome::BreakToLove,
        1 => GameOutcome::BreakTo15,
        _ => GameOutcome::BreakTo30,
    }
}

fn deuce_reach(s: i32, r: i32, p: f64) -> f64 {
    if s >= 3 && r >= 3 {
        return 1.0;
    }
    if s >= 4 || r >= 4 {
        return 0.0;
    }
    p * deuce_reach(s + 1, r, p) + (1.0 - p) * deuce_reach(s, r + 1, p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Reference chain evaluated by depth-limited recursion straight off
    /// the recurrence, without the closed form.
    fn hold_naive(s: i32, r: i32, p: f64, depth: u32) -> f64 {
        if s >= 4 && s - r >= 2 {
            return 1.0;
        }
        if r >= 4 && r - s >= 2 {
            return 0.0;
        }
        if depth == 0 {
            return 0.5;
        }
        p * hold_naive(s + 1, r, p, depth - 1) + (1.0 - p) * hold_naive(s, r + 1, p, depth - 1)
    }

    #[test]
    fn test_hold_degenerate_rates() {
        assert_relative_eq!(hold_probability(0, 0, 1.0).unwrap(), 1.0);
        assert_relative_eq!(hold_probability(0, 0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_hold_even_rate_is_even() {
        // Symmetric chain: p = 0.5 from love-all must give exactly one half.
        let even = hold_probability(0, 0, 0.5).unwrap();
        assert_relative_eq!(even, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_hold_monotonic_in_point_rate() {
        let mut last = 0.0;
        for p in [0.3, 0.4, 0.5, 0.6, 0.7, 0.8] {
            let hold = hold_probability(0, 0, p).unwrap();
            assert!(hold > last, "hold must rise with p: {hold} at p={p}");
            last = hold;
        }
    }

    #[test]
    fn test_closed_form_matches_truncated_chain() {
        // Survival past the deuce loop decays as (2pq)^(depth/2), so
        // depth 40 leaves residual mass under 1e-6 for every rate here
        // and the truncation base value cannot matter.
        for p in [0.5, 0.65, 0.82] {
            let exact = hold_probability(3, 3, p).unwrap();
            let naive = hold_naive(3, 3, p, 40);
            assert_relative_eq!(exact, naive, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_hold_from_forty_fifteen() {
        // From 40-15: win now (p), or lose one then win (q·p), or fall to
        // deuce and take the loop (q²·D).
        let p = 0.82;
        let q = 1.0 - p;
        let d = deuce_closed_form(p);
        let expected = p + q * (p + q * d);
        let hold = hold_probability(3, 1, p).unwrap();
        assert_relative_eq!(hold, expected, epsilon = 1e-12);
        assert!(hold > p, "a 40-15 lead must beat the single-point rate");
    }

    #[test]
    fn test_deuce_closed_form_values() {
        assert_relative_eq!(deuce_win_probability(0.5).unwrap(), 0.5, epsilon = 1e-12);
        // p = 0.82: 0.6724 / (1 − 0.2952) = 0.954029...
        assert_relative_eq!(
            deuce_win_probability(0.82).unwrap(),
            0.6724 / 0.7048,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_advantage_states() {
        let p = 0.65;
        let d = deuce_closed_form(p);
        assert_relative_eq!(
            hold_probability(4, 3, p).unwrap(),
            p + (1.0 - p) * d,
            epsilon = 1e-12
        );
        assert_relative_eq!(hold_probability(3, 4, p).unwrap(), p * d, epsilon = 1e-12);
    }

    #[test]
    fn test_deep_deuce_collapses() {
        let p = 0.71;
        assert_relative_eq!(
            hold_probability(4, 4, p).unwrap(),
            hold_probability(3, 3, p).unwrap(),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            hold_probability(7, 6, p).unwrap(),
            hold_probability(4, 3, p).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert!(hold_probability(0, 0, 1.5).is_err());
        assert!(hold_probability(0, 0, f64::NAN).is_err());
        assert!(hold_probability(-1, 0, 0.6).is_err());
        assert!(matches!(
            hold_probability(4, 1, 0.6),
            Err(ForecastError::InvalidScoreState(_))
        ));
        assert!(hold_probability(5, 3, 0.6).is_err());
        assert!(hold_probability(5, 2, 0.6).is_err());
    }

    #[test]
    fn test_distribution_sums_to_one() {
        for p in [0.35, 0.5, 0.62, 0.8] {
            for (s, r) in [(0, 0), (2, 1), (0, 3), (3, 3), (4, 3)] {
                let outcomes = game_outcomes(s, r, p).unwrap();
                assert_relative_eq!(outcomes.distribution.total(), 1.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_distribution_hold_mass_matches_hold_probability() {
        for (s, r) in [(0, 0), (1, 2), (3, 0), (3, 4)] {
            let p = 0.67;
            let outcomes = game_outcomes(s, r, p).unwrap();
            assert_relative_eq!(
                outcomes.distribution.hold_mass(),
                hold_probability(s, r, p).unwrap(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_hold_to_love_is_four_straight_points() {
        let p = 0.7;
        let outcomes = game_outcomes(0, 0, p).unwrap();
        assert_relative_eq!(
            outcomes.distribution.probability(GameOutcome::HoldToLove),
            p.powi(4),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            outcomes.distribution.probability(GameOutcome::BreakToLove),
            (1.0 - p).powi(4),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_unreachable_labels_carry_zero_mass() {
        // From 0-30 the server can no longer hold to love or to 15.
        let outcomes = game_outcomes(0, 2, 0.6).unwrap();
        assert_eq!(outcomes.distribution.probability(GameOutcome::HoldToLove), 0.0);
        assert_eq!(outcomes.distribution.probability(GameOutcome::HoldTo15), 0.0);
        assert!(outcomes.distribution.probability(GameOutcome::HoldTo30) > 0.0);
    }

    #[test]
    fn test_deuce_probability_from_love_all() {
        // Reaching 3-3 takes exactly C(6,3) = 20 orderings of p³q³.
        let p: f64 = 0.5;
        let outcomes = game_outcomes(0, 0, p).unwrap();
        assert_relative_eq!(outcomes.deuce_probability, 0.3125, epsilon = 1e-12);

        let p: f64 = 0.7061;
        let q = 1.0 - p;
        let outcomes = game_outcomes(0, 0, p).unwrap();
        assert_relative_eq!(
            outcomes.deuce_probability,
            20.0 * p.powi(3) * q.powi(3),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_deuce_probability_inside_the_loop() {
        assert_relative_eq!(game_outcomes(3, 3, 0.6).unwrap().deuce_probability, 1.0);
        assert_relative_eq!(game_outcomes(4, 3, 0.6).unwrap().deuce_probability, 1.0);
    }
}
