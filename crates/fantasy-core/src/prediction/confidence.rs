// Prediction reliability from sample size and scoring variance.

use crate::player::PlayerStatus;
use crate::stats::{population_variance, round_to};

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

/// Confidence in [0.1, 1.0], rounded to 2 decimals.
///
/// Starts at 0.5, adds up to 0.3 for sample size and up to 0.2 for low
/// variance (only with 3+ matches), and subtracts 0.2 for a fitness doubt.
pub fn confidence(points: &[f64], status: PlayerStatus) -> f64 {
    let n = points.len();
    let mut score = 0.5;

    score += match n {
        0 => 0.0,
        1..=2 => 0.1,
        3..=4 => 0.2,
        _ => 0.3,
    };

    if n >= 3 {
        let variance = population_variance(points);
        if variance <= 2.0 {
            score += 0.2;
        } else if variance <= 5.0 {
            score += 0.1;
        }
    }

    if status.has_fitness_doubt() {
        score -= 0.2;
    }

    round_to(score, 2).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
