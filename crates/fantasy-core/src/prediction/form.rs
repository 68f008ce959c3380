// Recent-form estimation: exponential smoothing over match points.
//
// All inputs are chronological (oldest first), so the fold runs left to right
// and the final element carries the largest weight.

use crate::stats::{mean, population_std_dev, round_to, slope};

pub const DEFAULT_ALPHA: f64 = 0.3;

/// Points per match that map to a full 10.0 form score.
const FORM_SCALE_CEILING: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormEstimator {
    alpha: f64,
}

impl FormEstimator {
    /// `alpha` must lie in (0, 1); config validation enforces this.
    pub fn new(alpha: f64) -> Self {
        FormEstimator { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    fn fold(&self, seed: f64, points: &[f64]) -> f64 {
        points
            .iter()
            .fold(seed, |ema, &p| self.alpha * p + (1.0 - self.alpha) * ema)
    }

    /// EMA of `points` seeded with `season_average`, rounded to 2 decimals.
    ///
    /// An empty history returns the season average unchanged.
    pub fn ema(&self, points: &[f64], season_average: f64) -> f64 {
        if points.is_empty() {
            return season_average;
        }
        round_to(self.fold(season_average, points), 2)
    }

    /// Form on a 0-10 scale: EMA seeded with the oldest match, scaled so that
    /// 15 points per match saturates the score. A single match is taken as-is
    /// (capped at 10); empty history scores 0.
    pub fn form_score(&self, points: &[f64]) -> f64 {
        match points {
            [] => 0.0,
            [only] => (*only).clamp(0.0, 10.0),
            [first, rest @ ..] => {
                let ema = self.fold(*first, rest);
                (ema * (10.0 / FORM_SCALE_CEILING)).clamp(0.0, 10.0)
            }
        }
    }
}

impl Default for FormEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

/// Trend of recent scoring in [-1, 1]: `tanh(slope / 3)` of the least-squares
/// line through the points. Fewer than three matches gives 0.
pub fn momentum(points: &[f64]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    (slope(points) / 3.0).tanh()
}

/// Consistency in [0, 1] as `exp(-cv)` where cv is the coefficient of
/// variation. Fewer than two matches gives a neutral 0.5.
pub fn consistency_score(points: &[f64]) -> f64 {
    if points.len() < 2 {
        return 0.5;
    }
    let m = mean(points);
    if m == 0.0 {
        return 0.0;
    }
    let cv = population_std_dev(points) / m;
    (-cv).exp().clamp(0.0, 1.0)
}
