// Multi-gameweek forecasts used by valuation and recommendations.
//
// Where `predict` answers "how many points next match", these answer "how
// many points over the next k matches", combining a baseline-blended rate,
// form and momentum, the opponent schedule and availability.

use serde::{Deserialize, Serialize};

use crate::player::Player;
use crate::prediction::availability::availability_score;
use crate::prediction::engine::PredictionEngine;
use crate::prediction::form::momentum;
use crate::stats::{population_variance, round_to};

/// Games after which the season average dominates the positional baseline.
const ESTABLISHED_GAMES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "80")]
    Eighty,
    #[serde(rename = "90")]
    Ninety,
    #[default]
    #[serde(rename = "95")]
    NinetyFive,
    #[serde(rename = "99")]
    NinetyNine,
}

impl ConfidenceLevel {
    /// Two-sided normal critical value.
    pub fn z_score(&self) -> f64 {
        match self {
            ConfidenceLevel::Eighty => 1.28,
            ConfidenceLevel::Ninety => 1.645,
            ConfidenceLevel::NinetyFive => 1.96,
            ConfidenceLevel::NinetyNine => 2.576,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastInterval {
    pub lower: f64,
    pub expected: f64,
    pub upper: f64,
}

impl PredictionEngine {
    /// Per-game scoring rate before form, fixtures and availability.
    ///
    /// Blends the season average with the positional baseline: 80/20 once a
    /// player has five appearances, 50/50 below that, baseline only with none.
    pub fn base_points_per_game(&self, player: &Player) -> f64 {
        let games = (player.games_played as usize).max(player.recent_points.len());
        let baseline = player.position.baseline_points_per_game();
        if games == 0 {
            return baseline;
        }
        let weight = if games >= ESTABLISHED_GAMES { 0.8 } else { 0.5 };
        weight * player.season_average_points + (1.0 - weight) * baseline
    }

    fn form_multiplier(&self, player: &Player) -> f64 {
        if player.recent_points.is_empty() {
            return 1.0;
        }
        let form = 0.5 + self.form.form_score(&player.recent_points) / 10.0;
        let trend = 1.0 + 0.2 * momentum(&player.recent_points);
        form * trend
    }

    /// Expected points over the next `k` gameweeks, floored at 0 and rounded
    /// to 2 decimals. `k == 0` yields 0.
    pub fn expected_points_next_k(&self, player: &Player, k: usize) -> f64 {
        if k == 0 {
            return 0.0;
        }
        let rate = self.base_points_per_game(player) * self.form_multiplier(player);
        let rate = self.fixtures.adjust_horizon(rate, player, k);
        let rate = rate * availability_score(player);
        round_to((rate * k as f64).max(0.0), 2)
    }

    /// Normal-approximation interval around the k-gameweek forecast.
    ///
    /// Uses the variance of recent points, or the positional default with
    /// fewer than two matches. The lower bound never drops below 0.
    pub fn confidence_interval(
        &self,
        player: &Player,
        k: usize,
        level: ConfidenceLevel,
    ) -> ForecastInterval {
        let expected = self.expected_points_next_k(player, k);
        let per_game_variance = if player.recent_points.len() >= 2 {
            population_variance(&player.recent_points)
        } else {
            player.position.default_points_variance()
        };
        let margin = level.z_score() * (per_game_variance * k as f64).sqrt();
        ForecastInterval {
            lower: round_to((expected - margin).max(0.0), 2),
            expected,
            upper: round_to(expected + margin, 2),
        }
    }

    /// Horizon points per million of price; 0 for a non-positive price.
    pub fn points_per_million(&self, player: &Player, k: usize) -> f64 {
        if player.price <= 0.0 {
            return 0.0;
        }
        round_to(self.expected_points_next_k(player, k) / player.price, 3)
    }

    /// Horizon points above a freely available replacement, floored at 0.
    pub fn value_over_replacement(&self, player: &Player, k: usize) -> f64 {
        let replacement = player.position.replacement_points_per_game() * k as f64;
        round_to((self.expected_points_next_k(player, k) - replacement).max(0.0), 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerStatus, Position};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn make_player(position: Position, season_avg: f64, points: Vec<f64>) -> Player {
        let mut p = Player::new(1, "P", "Valencia", position, 7.0);
        p.season_average_points = season_avg;
        p.games_played = points.len() as u32;
        p.minutes_played = 90 * points.len() as u32;
        p.recent_points = points;
        p
    }

    #[test]
    fn base_rate_blends_with_position_baseline() {
        let engine = PredictionEngine::default();
        let fresh = make_player(Position::Forward, 0.0, vec![]);
        assert_eq!(engine.base_points_per_game(&fresh), 5.1);

        let short = make_player(Position::Midfielder, 6.0, vec![6.0, 6.0]);
        assert!(approx_eq(engine.base_points_per_game(&short), 5.4, 1e-9));

        let established = make_player(Position::Defender, 6.0, vec![6.0; 6]);
        assert!(approx_eq(engine.base_points_per_game(&established), 0.8 * 6.0 + 0.2 * 4.2, 1e-9));
    }

    #[test]
    fn zero_horizon_is_zero() {
        let engine = PredictionEngine::default();
        let p = make_player(Position::Midfielder, 6.0, vec![6.0; 5]);
        assert_eq!(engine.expected_points_next_k(&p, 0), 0.0);
    }

    #[test]
    fn horizon_scales_roughly_with_k() {
        let engine = PredictionEngine::default();
        let p = make_player(Position::Midfielder, 6.0, vec![6.0; 5]);
        let one = engine.expected_points_next_k(&p, 1);
        let three = engine.expected_points_next_k(&p, 3);
        assert!(one > 0.0);
        assert!(approx_eq(three, one * 3.0, 0.03));
    }

    #[test]
    fn unavailable_player_expects_nothing() {
        let engine = PredictionEngine::default();
        let mut p = make_player(Position::Forward, 8.0, vec![9.0; 5]);
        p.status = PlayerStatus::Suspended;
        assert_eq!(engine.expected_points_next_k(&p, 3), 0.0);
        assert_eq!(engine.value_over_replacement(&p, 3), 0.0);
    }

    #[test]
    fn easy_schedule_beats_hard_schedule() {
        let engine = PredictionEngine::default();
        let mut easy = make_player(Position::Forward, 6.0, vec![6.0; 5]);
        easy.next_opponents = vec!["Getafe".into(), "Alaves".into(), "Girona".into()];
        let mut hard = easy.clone();
        hard.next_opponents = vec!["Real Madrid".into(), "Barcelona".into(), "Real Sociedad".into()];
        assert!(engine.expected_points_next_k(&easy, 3) > engine.expected_points_next_k(&hard, 3));
    }

    #[test]
    fn interval_brackets_expectation() {
        let engine = PredictionEngine::default();
        let p = make_player(Position::Midfielder, 6.0, vec![2.0, 10.0, 4.0, 8.0]);
        let narrow = engine.confidence_interval(&p, 3, ConfidenceLevel::Eighty);
        let wide = engine.confidence_interval(&p, 3, ConfidenceLevel::NinetyNine);
        assert!(narrow.lower <= narrow.expected && narrow.expected <= narrow.upper);
        assert!(wide.upper > narrow.upper);
        assert!(wide.lower >= 0.0);
    }

    #[test]
    fn interval_uses_positional_variance_without_history() {
        let engine = PredictionEngine::default();
        let p = make_player(Position::Goalkeeper, 0.0, vec![]);
        let ci = engine.confidence_interval(&p, 1, ConfidenceLevel::NinetyFive);
        // sqrt(4.0) * 1.96
        assert!(approx_eq(ci.upper - ci.expected, 3.92, 0.011));
    }

    #[test]
    fn points_per_million_guards_price() {
        let engine = PredictionEngine::default();
        let mut p = make_player(Position::Midfielder, 6.0, vec![6.0; 5]);
        p.price = 0.0;
        assert_eq!(engine.points_per_million(&p, 3), 0.0);
    }
}
