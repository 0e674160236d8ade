//! Match-level chain over sets.
//!
//! Sets are treated as independent trials with a single per-set win
//! probability. Serve order inside future sets depends on how earlier
//! sets end, so no per-set asymmetry is modeled here; the caller folds
//! the in-progress set separately and passes a fresh-set probability.

use std::collections::HashMap;

use crate::error::{check_probability, ForecastError, Result};

/// Probability of winning the match from set score
/// (`sets_server`, `sets_receiver`), given the probability of winning
/// each remaining set.
pub fn match_win_probability(
    set_win: f64,
    sets_server: i32,
    sets_receiver: i32,
    best_of_sets: i32,
) -> Result<f64> {
    check_probability("set_win_probability", set_win)?;
    if best_of_sets != 3 && best_of_sets != 5 {
        return Err(ForecastError::InvalidConfiguration(format!(
            "best_of_sets must be 3 or 5, got {best_of_sets}"
        )));
    }
    let needed = best_of_sets / 2 + 1;
    if sets_server < 0 || sets_receiver < 0 {
        return Err(ForecastError::InvalidScoreState(format!(
            "negative set count {sets_server}-{sets_receiver}"
        )));
    }
    if sets_server >= needed || sets_receiver >= needed {
        return Err(ForecastError::InvalidScoreState(format!(
            "match already decided at {sets_server}-{sets_receiver}"
        )));
    }
    let mut memo = HashMap::new();
    Ok(match_rec(sets_server, sets_receiver, needed, set_win, &mut memo))
}

fn match_rec(
    s1: i32,
    s2: i32,
    needed: i32,
    set_win: f64,
    memo: &mut HashMap<(i32, i32), f64>,
) -> f64 {
    if s1 >= needed {
        return 1.0;
    }
    if s2 >= needed {
        return 0.0;
    }
    if let Some(&cached) = memo.get(&(s1, s2)) {
        return cached;
    }
    let value = set_win * match_rec(s1 + 1, s2, needed, set_win, memo)
        + (1.0 - set_win) * match_rec(s1, s2 + 1, needed, set_win, memo);
    memo.insert((s1, s2), value);
    value
}
