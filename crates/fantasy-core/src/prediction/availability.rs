// Availability and starter-probability scoring.
//
// Two formulas exist for "will this player be on the pitch": a multiplicative
// availability score (status x playing time) and an additive starter
// heuristic (form, status, price). Both are exposed as named strategies; the
// prediction engine uses whichever the config selects.

use serde::{Deserialize, Serialize};

use crate::player::{Player, PlayerStatus};
use crate::stats::{mean, round_to};

/// Playing-time factor assumed before a player's first appearance.
const UNKNOWN_PLAYING_TIME: f64 = 0.5;

const STARTER_BASE: f64 = 0.8;

/// How the prediction engine turns a player snapshot into the probability
/// that scales fixture-adjusted points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarterProbabilityStrategy {
    /// Base 0.8 with additive form, status and price adjustments.
    #[default]
    Heuristic,
    /// `status_score x (0.7 + 0.3 x playing_time_factor)`.
    Availability,
}

impl StarterProbabilityStrategy {
    pub fn probability(&self, player: &Player) -> f64 {
        match self {
            StarterProbabilityStrategy::Heuristic => heuristic_starter_probability(player),
            StarterProbabilityStrategy::Availability => availability_score(player),
        }
    }
}

fn status_score(status: PlayerStatus) -> f64 {
    match status {
        PlayerStatus::Available => 1.0,
        PlayerStatus::Doubtful => 0.3,
        PlayerStatus::Injured | PlayerStatus::Suspended => 0.0,
    }
}

/// Minutes per game over 90, clamped to [0, 1]. Unknown (no games) is 0.5.
pub fn playing_time_factor(player: &Player) -> f64 {
    match player.minutes_per_game() {
        Some(mpg) => (mpg / 90.0).clamp(0.0, 1.0),
        None => UNKNOWN_PLAYING_TIME,
    }
}

/// Probability in [0, 1] that the player is available and plays meaningful minutes.
pub fn availability_score(player: &Player) -> f64 {
    status_score(player.status) * (0.7 + 0.3 * playing_time_factor(player))
}

/// Additive starter estimate, rounded to 2 decimals and clamped to [0, 1].
pub fn heuristic_starter_probability(player: &Player) -> f64 {
    let mut prob = STARTER_BASE;

    let recent = player.latest_points(3);
    if !recent.is_empty() {
        let recent_avg = mean(recent);
        let season = player.season_average_points;
        if recent_avg > season {
            prob += 0.1;
        } else if recent_avg < season * 0.5 {
            prob -= 0.2;
        }
    }

    prob += match player.status {
        PlayerStatus::Available => 0.0,
        PlayerStatus::Doubtful => -0.3,
        PlayerStatus::Injured => -0.8,
        PlayerStatus::Suspended => -1.0,
    };

    if player.price > 8.0 {
        prob += 0.1;
    } else if player.price < 4.0 {
        prob -= 0.1;
    }

    round_to(prob, 2).clamp(0.0, 1.0)
}
