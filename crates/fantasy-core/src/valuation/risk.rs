// Risk scoring.
//
// A player's risk is a weighted sum of independent sub-scores, each in
// [0, 1]. Two weighting schemes are supported; both sum to 1.0 so the total
// stays in [0, 1].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::player::{MarketData, Player, PlayerStatus};
use crate::prediction::availability::availability_score;
use crate::prediction::fixture::resolve_difficulty;
use crate::stats::{population_std_dev, population_variance, round_to};

/// Volatility assumed when nothing is known about price movement.
const DEFAULT_PRICE_VOLATILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    PriceVolatility,
    FormConsistency,
    Injury,
    Rotation,
    Fixture,
    Availability,
    PlayingTime,
    Form,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskWeightingStrategy {
    /// volatility 0.30, consistency 0.25, injury 0.20, rotation 0.15, fixture 0.10
    #[default]
    Component,
    /// availability 0.35, playing time 0.35, volatility 0.20, form 0.10
    Availability,
}

impl RiskWeightingStrategy {
    pub fn weights(&self) -> &'static [(RiskFactor, f64)] {
        match self {
            RiskWeightingStrategy::Component => &[
                (RiskFactor::PriceVolatility, 0.30),
                (RiskFactor::FormConsistency, 0.25),
                (RiskFactor::Injury, 0.20),
                (RiskFactor::Rotation, 0.15),
                (RiskFactor::Fixture, 0.10),
            ],
            RiskWeightingStrategy::Availability => &[
                (RiskFactor::Availability, 0.35),
                (RiskFactor::PlayingTime, 0.35),
                (RiskFactor::PriceVolatility, 0.20),
                (RiskFactor::Form, 0.10),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBreakdown {
    pub scores: BTreeMap<RiskFactor, f64>,
    /// Weighted total in [0, 1], rounded to 3 decimals.
    pub total: f64,
}

impl RiskBreakdown {
    pub fn get(&self, factor: RiskFactor) -> Option<f64> {
        self.scores.get(&factor).copied()
    }
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

/// Bucketed magnitude of the latest price change.
pub fn market_volatility_risk(market: Option<&MarketData>) -> f64 {
    let Some(m) = market else {
        return DEFAULT_PRICE_VOLATILITY;
    };
    let change = m.price_change.abs();
    if change > 0.5 {
        0.8
    } else if change > 0.2 {
        0.5
    } else {
        0.2
    }
}

/// Std-dev of absolute relative price changes, x10, capped at 1.
/// Fewer than two prices gives 0.
pub fn price_volatility(history: &[f64]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let changes: Vec<f64> = history
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| ((w[1] - w[0]) / w[0]).abs())
        .collect();
    if changes.is_empty() {
        return 0.0;
    }
    (population_std_dev(&changes) * 10.0).min(1.0)
}

pub fn form_consistency_risk(points: &[f64]) -> f64 {
    if points.len() < 3 {
        return 0.5;
    }
    let variance = population_variance(points);
    if variance <= 2.0 {
        0.1
    } else if variance <= 5.0 {
        0.3
    } else if variance <= 10.0 {
        0.6
    } else {
        0.9
    }
}

pub fn injury_risk(status: PlayerStatus) -> f64 {
    match status {
        PlayerStatus::Available => 0.1,
        PlayerStatus::Doubtful => 0.6,
        PlayerStatus::Injured => 0.9,
        PlayerStatus::Suspended => 0.3,
    }
}

/// `1 - starter_probability` when supplied, else a price-tiered guess:
/// expensive players rotate less.
pub fn rotation_risk(player: &Player) -> f64 {
    if let Some(prob) = player.starter_probability {
        return (1.0 - prob).clamp(0.0, 1.0);
    }
    if player.price > 8.0 {
        0.1
    } else if player.price > 5.0 {
        0.3
    } else {
        0.6
    }
}

pub fn fixture_risk(difficulty: Option<u8>) -> f64 {
    (resolve_difficulty(difficulty) as f64 - 1.0) / 4.0
}

fn playing_time_risk(player: &Player) -> f64 {
    match player.minutes_per_game() {
        Some(mpg) => (1.0 - mpg / 90.0).max(0.0),
        None => 0.8,
    }
}

/// Variance of recent points over 25, capped at 1. Fewer than two matches
/// gives 0.
fn form_variance_risk(points: &[f64]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    (population_variance(points) / 25.0).min(1.0)
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskScorer {
    strategy: RiskWeightingStrategy,
}

impl RiskScorer {
    pub fn new(strategy: RiskWeightingStrategy) -> Self {
        RiskScorer { strategy }
    }

    pub fn strategy(&self) -> RiskWeightingStrategy {
        self.strategy
    }

    fn sub_score(&self, factor: RiskFactor, player: &Player, market: Option<&MarketData>) -> f64 {
        match factor {
            RiskFactor::PriceVolatility => match self.strategy {
                RiskWeightingStrategy::Component => market_volatility_risk(market),
                // Observed price path only; no history means no volatility.
                RiskWeightingStrategy::Availability => price_volatility(&player.price_history),
            },
            RiskFactor::FormConsistency => form_consistency_risk(&player.recent_points),
            RiskFactor::Injury => injury_risk(player.status),
            RiskFactor::Rotation => rotation_risk(player),
            RiskFactor::Fixture => fixture_risk(player.fixture_difficulty),
            RiskFactor::Availability => 1.0 - availability_score(player),
            RiskFactor::PlayingTime => playing_time_risk(player),
            RiskFactor::Form => form_variance_risk(&player.recent_points),
        }
    }

    pub fn score(&self, player: &Player, market: Option<&MarketData>) -> RiskBreakdown {
        let mut scores = BTreeMap::new();
        let mut total = 0.0;
        for &(factor, weight) in self.strategy.weights() {
            let s = self.sub_score(factor, player, market).clamp(0.0, 1.0);
            total += weight * s;
            scores.insert(factor, s);
        }
        RiskBreakdown {
            scores,
            total: round_to(total, 3).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn make_player(status: PlayerStatus, price: f64, points: Vec<f64>) -> Player {
        let mut p = Player::new(1, "P", "T", Position::Midfielder, price);
        p.status = status;
        p.recent_points = points;
        p
    }

    fn market(change: f64) -> MarketData {
        MarketData {
            player_id: 1,
            current_price: 6.0,
            price_change: change,
            predicted_price: 6.0,
            demand: 0.5,
            supply: 0.5,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        for strategy in [RiskWeightingStrategy::Component, RiskWeightingStrategy::Availability] {
            let sum: f64 = strategy.weights().iter().map(|(_, w)| w).sum();
            assert!(approx_eq(sum, 1.0, 1e-9));
        }
    }

    #[test]
    fn injured_player_injury_subscore_is_exact() {
        let p = make_player(PlayerStatus::Injured, 6.0, vec![]);
        let r = RiskScorer::default().score(&p, None);
        assert_eq!(r.get(RiskFactor::Injury), Some(0.9));
    }

    #[test]
    fn component_total_matches_hand_calculation() {
        // vol 0.2, consistency 0.1, injury 0.1, rotation 0.1, fixture 0.0
        let mut p = make_player(PlayerStatus::Available, 9.0, vec![5.0, 6.0, 5.0]);
        p.fixture_difficulty = Some(1);
        let r = RiskScorer::default().score(&p, Some(&market(0.1)));
        assert_eq!(r.total, 0.12);
        assert_eq!(r.scores.len(), 5);
    }

    #[test]
    fn market_change_buckets() {
        assert_eq!(market_volatility_risk(None), 0.3);
        assert_eq!(market_volatility_risk(Some(&market(-0.6))), 0.8);
        assert_eq!(market_volatility_risk(Some(&market(0.3))), 0.5);
        assert_eq!(market_volatility_risk(Some(&market(0.2))), 0.2);
    }

    #[test]
    fn rotation_prefers_supplied_probability() {
        let mut p = make_player(PlayerStatus::Available, 4.0, vec![]);
        assert_eq!(rotation_risk(&p), 0.6);
        p.starter_probability = Some(0.75);
        assert_eq!(rotation_risk(&p), 0.25);
    }

    #[test]
    fn fixture_risk_spans_unit_interval() {
        assert_eq!(fixture_risk(Some(1)), 0.0);
        assert_eq!(fixture_risk(Some(5)), 1.0);
        assert_eq!(fixture_risk(None), 0.5);
    }

    #[test]
    fn price_volatility_of_flat_and_noisy_paths() {
        assert_eq!(price_volatility(&[5.0]), 0.0);
        assert_eq!(price_volatility(&[5.0, 5.0, 5.0]), 0.0);
        let noisy = price_volatility(&[5.0, 6.0, 5.0, 7.0, 4.0]);
        assert!(noisy > 0.0 && noisy <= 1.0);
    }

    #[test]
    fn totals_stay_in_unit_interval() {
        let statuses = [
            PlayerStatus::Available,
            PlayerStatus::Doubtful,
            PlayerStatus::Injured,
            PlayerStatus::Suspended,
        ];
        for strategy in [RiskWeightingStrategy::Component, RiskWeightingStrategy::Availability] {
            let scorer = RiskScorer::new(strategy);
            for status in statuses {
                for points in [vec![], vec![0.0, 25.0, 0.0, 30.0], vec![5.0; 6]] {
                    let mut p = make_player(status, 3.0, points);
                    p.price_history = vec![3.0, 9.0, 1.0];
                    let r = scorer.score(&p, Some(&market(2.0)));
                    assert!((0.0..=1.0).contains(&r.total), "{strategy:?} {status:?}: {}", r.total);
                }
            }
        }
    }

    #[test]
    fn availability_scheme_penalises_bench_players() {
        let scorer = RiskScorer::new(RiskWeightingStrategy::Availability);
        let mut starter = make_player(PlayerStatus::Available, 6.0, vec![5.0, 6.0]);
        starter.games_played = 5;
        starter.minutes_played = 450;
        let mut bench = starter.clone();
        bench.minutes_played = 100;
        assert!(scorer.score(&bench, None).total > scorer.score(&starter, None).total);
    }

    #[test]
    fn availability_scheme_without_history_is_riskless() {
        let scorer = RiskScorer::new(RiskWeightingStrategy::Availability);
        let mut p = make_player(PlayerStatus::Available, 6.0, vec![]);
        p.games_played = 5;
        p.minutes_played = 450;
        let r = scorer.score(&p, None);
        assert_eq!(r.get(RiskFactor::PriceVolatility), Some(0.0));
        assert_eq!(r.get(RiskFactor::Form), Some(0.0));
        assert_eq!(r.get(RiskFactor::Availability), Some(0.0));
        assert_eq!(r.get(RiskFactor::PlayingTime), Some(0.0));
        assert_eq!(r.total, 0.0);

        // A single match or a single price still carries no signal.
        p.recent_points = vec![7.0];
        p.price_history = vec![6.0];
        assert_eq!(scorer.score(&p, Some(&market(0.9))).total, 0.0);
    }

    #[test]
    fn availability_scheme_uses_price_path_not_last_move() {
        let scorer = RiskScorer::new(RiskWeightingStrategy::Availability);
        let mut p = make_player(PlayerStatus::Available, 6.0, vec![5.0, 5.0]);
        p.games_played = 5;
        p.minutes_played = 450;
        p.price_history = vec![5.0, 5.0, 5.0];
        let r = scorer.score(&p, Some(&market(0.9)));
        assert_eq!(r.get(RiskFactor::PriceVolatility), Some(0.0));
        assert_eq!(r.total, 0.0);
    }
}
