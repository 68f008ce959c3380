// Fixture difficulty adjustment.
//
// Two views of the schedule are supported: a discrete multiplier for the next
// single match, and a continuous multiplier over the average difficulty of the
// next k opponents, scaled by how sensitive the player's position is to
// opponent strength.

use std::collections::HashMap;

use crate::player::{Player, Position};

/// Difficulty assumed when none is known or the rating is out of range.
pub const NEUTRAL_DIFFICULTY: u8 = 3;

/// Map a possibly missing or out-of-range rating onto 1..=5.
pub fn resolve_difficulty(difficulty: Option<u8>) -> u8 {
    match difficulty {
        Some(d) if (1..=5).contains(&d) => d,
        _ => NEUTRAL_DIFFICULTY,
    }
}

/// Single-match multiplier: 1 -> 1.3, 2 -> 1.15, 3 -> 1.0, 4 -> 0.85, 5 -> 0.7.
pub fn single_match_multiplier(difficulty: u8) -> f64 {
    match difficulty {
        1 => 1.3,
        2 => 1.15,
        3 => 1.0,
        4 => 0.85,
        5 => 0.7,
        _ => 1.0,
    }
}

/// Continuous multiplier for an average difficulty over several matches,
/// with the deviation from neutral scaled by positional sensitivity.
pub fn horizon_multiplier(average_difficulty: f64, position: Position) -> f64 {
    let raw = 1.45 - 0.15 * average_difficulty;
    1.0 + (raw - 1.0) * position.fixture_sensitivity()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureAdjuster {
    /// Opponent team name -> difficulty (1-5).
    ratings: HashMap<String, u8>,
}

impl FixtureAdjuster {
    pub fn new(ratings: HashMap<String, u8>) -> Self {
        FixtureAdjuster { ratings }
    }

    /// Scale `points` by the single-match multiplier for `difficulty`.
    pub fn adjust(&self, points: f64, difficulty: Option<u8>) -> f64 {
        points * single_match_multiplier(resolve_difficulty(difficulty))
    }

    /// Difficulty of playing `opponent`; unknown teams are neutral.
    pub fn opponent_difficulty(&self, opponent: &str) -> u8 {
        resolve_difficulty(self.ratings.get(opponent).copied())
    }

    /// Mean difficulty over `opponents`, or neutral when the list is empty.
    pub fn average_difficulty(&self, opponents: &[String]) -> f64 {
        if opponents.is_empty() {
            return NEUTRAL_DIFFICULTY as f64;
        }
        let total: u32 = opponents
            .iter()
            .map(|o| self.opponent_difficulty(o) as u32)
            .sum();
        total as f64 / opponents.len() as f64
    }

    /// Average difficulty the player faces over the next `k` matches.
    ///
    /// Uses named opponents when present, then the stored scalar rating.
    /// Returns `None` when the player has neither.
    pub fn horizon_difficulty(&self, player: &Player, k: usize) -> Option<f64> {
        let upcoming: Vec<String> = player.next_opponents.iter().take(k).cloned().collect();
        if !upcoming.is_empty() {
            return Some(self.average_difficulty(&upcoming));
        }
        player
            .fixture_difficulty
            .map(|d| resolve_difficulty(Some(d)) as f64)
    }

    /// Scale per-game points by the horizon multiplier. Players with no
    /// schedule information are left unchanged.
    pub fn adjust_horizon(&self, points_per_game: f64, player: &Player, k: usize) -> f64 {
        match self.horizon_difficulty(player, k) {
            Some(avg) => points_per_game * horizon_multiplier(avg, player.position),
            None => points_per_game,
        }
    }
}
