// Value scoring, fair value and bid sizing.
//
// Turns a player snapshot plus its prediction into money: a unitless value
// score (points per million, adjusted), a discounted fair price, and a bid
// range sized by one of two strategies.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ValuationConfig};
use crate::player::{MarketData, Player, PlayerId};
use crate::prediction::{Prediction, PredictionEngine};
use crate::stats::{mean, population_variance, round_to};
use crate::valuation::risk::RiskScorer;

/// Share of bankroll the conservative strategy will put on one player.
const CONSERVATIVE_BANKROLL_CAP: f64 = 0.3;
/// Share of bankroll the Kelly strategy will put on one player.
const KELLY_BANKROLL_CAP: f64 = 0.5;
const KELLY_FRACTION_CAP: f64 = 0.25;
/// Bankroll share used when the Kelly formula has no edge to size.
const KELLY_FALLBACK: f64 = 0.1;

// ---------------------------------------------------------------------------
// Strategy enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidSizingStrategy {
    /// `price x value x tolerance x confidence`, capped at 30% of bankroll,
    /// then floored at `price x 1.05`.
    #[default]
    Conservative,
    /// Risk- and pressure-adjusted fair value, capped by the Kelly fraction
    /// of bankroll (max 25%) and by 50% of bankroll, floored at `price x 0.9`.
    Kelly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskTolerance {
    /// Multiplier on the conservative aggressive bid.
    pub fn bid_multiplier(&self) -> f64 {
        match self {
            RiskTolerance::Low => 0.7,
            RiskTolerance::Medium => 0.85,
            RiskTolerance::High => 1.0,
        }
    }

    /// Tolerance in [0, 1] used to soften the risk haircut in Kelly sizing.
    pub fn fraction(&self) -> f64 {
        match self {
            RiskTolerance::Low => 0.25,
            RiskTolerance::Medium => 0.5,
            RiskTolerance::High => 0.75,
        }
    }
}

// ---------------------------------------------------------------------------
// Output records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueAnalysis {
    pub fair_value: f64,
    pub value_score: f64,
    pub min_bid: f64,
    pub max_bid: f64,
    pub conservative_bid: f64,
    pub aggressive_bid: f64,
    pub risk_score: f64,
    pub confidence: f64,
}

impl ValueAnalysis {
    pub fn bid_range(&self) -> BidRange {
        BidRange {
            min: self.min_bid,
            fair: self.fair_value.clamp(self.min_bid, self.max_bid),
            max: self.max_bid,
        }
    }
}

/// `min <= fair <= max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BidRange {
    pub min: f64,
    pub fair: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    StrongBuy,
    Buy,
    Consider,
    Avoid,
    NotRecommended,
}

impl Verdict {
    fn classify(composite: f64, risk: f64) -> Self {
        if composite > 0.8 && risk < 0.3 {
            Verdict::StrongBuy
        } else if composite > 0.6 && risk < 0.5 {
            Verdict::Buy
        } else if composite > 0.4 {
            Verdict::Consider
        } else if risk > 0.7 {
            Verdict::Avoid
        } else {
            Verdict::NotRecommended
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerComparison {
    pub player_id: PlayerId,
    pub name: String,
    pub value_score: f64,
    pub risk_score: f64,
    /// `value_score x (1 - risk_score)`.
    pub composite_score: f64,
    pub verdict: Verdict,
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

/// Kelly fraction `(b*p - q) / b` with `b = gain / loss`, clamped to [0, 0.25].
pub fn kelly_fraction(win_probability: f64, gain: f64, loss: f64) -> f64 {
    if loss <= 0.0 || win_probability <= 0.0 {
        return 0.0;
    }
    let b = gain / loss;
    if b <= 0.0 {
        return 0.0;
    }
    let q = 1.0 - win_probability;
    ((b * win_probability - q) / b).clamp(0.0, KELLY_FRACTION_CAP)
}

/// Recent scoring relative to the season average, clamped to [0.5, 1.5].
fn form_factor(player: &Player) -> f64 {
    if player.recent_points.len() < 2 {
        return 1.0;
    }
    let recent = mean(player.latest_points(3));
    let season = if player.season_average_points > 0.0 {
        player.season_average_points
    } else {
        mean(&player.recent_points)
    };
    if season <= 0.0 {
        return 1.0;
    }
    (recent / season).clamp(0.5, 1.5)
}

fn consistency_factor(points: &[f64]) -> f64 {
    if points.len() < 3 {
        return 1.0;
    }
    let variance = population_variance(points);
    if variance <= 1.0 {
        1.2
    } else if variance <= 3.0 {
        1.1
    } else if variance <= 6.0 {
        1.0
    } else {
        0.9
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ValueCalculator {
    pub(crate) engine: PredictionEngine,
    pub(crate) risk: RiskScorer,
    pub(crate) valuation: ValuationConfig,
    bid_sizing: BidSizingStrategy,
    pub(crate) horizon: usize,
    default_market_pressure: f64,
}

impl ValueCalculator {
    pub fn new(config: &ModelConfig) -> Self {
        ValueCalculator {
            engine: PredictionEngine::new(config),
            risk: RiskScorer::new(config.strategies.risk_weighting),
            valuation: config.valuation.clone(),
            bid_sizing: config.strategies.bid_sizing,
            horizon: config.forecast.horizon,
            default_market_pressure: config.bids.default_market_pressure,
        }
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub fn risk_scorer(&self) -> &RiskScorer {
        &self.risk
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn bid_sizing(&self) -> BidSizingStrategy {
        self.bid_sizing
    }

    /// Adjusted points per million, rounded to 3 decimals. A non-positive
    /// price scores 0.
    pub fn value_score(&self, player: &Player, prediction: &Prediction) -> f64 {
        if player.price <= 0.0 {
            return 0.0;
        }
        let base = prediction.predicted_points / player.price;
        let ownership = (1.0 - player.ownership_percent / 100.0).max(0.5);
        let score =
            base * ownership * form_factor(player) * consistency_factor(&player.recent_points);
        round_to(score, 3)
    }

    /// Discounted, scarcity-scaled horizon value blended with the market
    /// price and clamped to the configured price bounds.
    pub fn fair_value(&self, player: &Player) -> f64 {
        let v = &self.valuation;
        let k = self.horizon;
        let expected = self.engine.expected_points_next_k(player, k);
        let discount = (1.0 / (1.0 + v.discount_rate)).powf(k as f64 / v.season_length as f64);
        let intrinsic =
            expected * v.money_per_point * discount * player.position.scarcity_multiplier();
        let blended =
            v.market_efficiency * player.price + (1.0 - v.market_efficiency) * intrinsic;
        round_to(blended.clamp(v.min_price, v.max_price), 2)
    }

    /// Full bid analysis for buying `player` with `bankroll` available.
    pub fn analyze_bid(
        &self,
        player: &Player,
        prediction: &Prediction,
        market: Option<&MarketData>,
        bankroll: f64,
        tolerance: RiskTolerance,
    ) -> ValueAnalysis {
        let price = player.price;
        let fair_value = self.fair_value(player);
        let value_score = self.value_score(player, prediction);
        let risk_score = self.risk.score(player, market).total;
        let confidence = prediction.confidence;

        let (raw_max, aggressive) = match self.bid_sizing {
            BidSizingStrategy::Conservative => {
                let aggressive = price * value_score * tolerance.bid_multiplier() * confidence;
                let capped = aggressive.min(CONSERVATIVE_BANKROLL_CAP * bankroll);
                (capped.max(price * 1.05), aggressive)
            }
            BidSizingStrategy::Kelly => {
                let max = self.kelly_max_bid(price, fair_value, risk_score, market, bankroll, tolerance);
                (max, max)
            }
        };

        let min_bid = (0.95 * price)
            .min(0.85 * fair_value)
            .max(self.valuation.min_price);
        let max_bid = raw_max.max(min_bid);

        ValueAnalysis {
            fair_value,
            value_score,
            min_bid: round_to(min_bid, 2),
            max_bid: round_to(max_bid, 2),
            conservative_bid: round_to((price * 1.05).min(max_bid), 2),
            aggressive_bid: round_to(aggressive, 2),
            risk_score,
            confidence,
        }
    }

    fn kelly_max_bid(
        &self,
        price: f64,
        fair_value: f64,
        risk: f64,
        market: Option<&MarketData>,
        bankroll: f64,
        tolerance: RiskTolerance,
    ) -> f64 {
        let risk_adjusted = fair_value * (1.0 - risk * (1.0 - tolerance.fraction()));
        let pressure = market
            .map(|m| m.demand)
            .unwrap_or(self.default_market_pressure)
            .clamp(0.0, 1.0);
        let market_adjusted = risk_adjusted * (0.8 + 0.4 * pressure);

        let win_probability = (1.0 - risk).clamp(0.1, 0.9);
        let gain = (fair_value - price).max(0.0);
        let loss = (price * 0.3).min(bankroll * 0.1);
        let fraction = if gain > 0.0 && loss > 0.0 {
            kelly_fraction(win_probability, gain, loss)
        } else {
            KELLY_FALLBACK
        };

        market_adjusted
            .min(fraction * bankroll)
            .min(KELLY_BANKROLL_CAP * bankroll)
            .max(price * 0.9)
    }

    /// `(min, fair, max)` bid triple for one player.
    pub fn bid_range(
        &self,
        player: &Player,
        prediction: &Prediction,
        market: Option<&MarketData>,
        bankroll: f64,
        tolerance: RiskTolerance,
    ) -> BidRange {
        self.analyze_bid(player, prediction, market, bankroll, tolerance)
            .bid_range()
    }

    /// Rank players by `value x (1 - risk)`, best first. `predictions` must be
    /// index-aligned with `players`.
    pub fn compare(&self, players: &[Player], predictions: &[Prediction]) -> Vec<PlayerComparison> {
        let mut out: Vec<PlayerComparison> = players
            .iter()
            .zip(predictions)
            .map(|(player, prediction)| {
                let value_score = self.value_score(player, prediction);
                let risk_score = self.risk.score(player, None).total;
                let composite = round_to(value_score * (1.0 - risk_score), 3);
                PlayerComparison {
                    player_id: player.id,
                    name: player.name.clone(),
                    value_score,
                    risk_score,
                    composite_score: composite,
                    verdict: Verdict::classify(composite, risk_score),
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(Ordering::Equal)
        });
        out
    }
}

impl Default for ValueCalculator {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerStatus, Position};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn make_player(id: PlayerId, price: f64, points: Vec<f64>) -> Player {
        let mut p = Player::new(id, format!("P{id}"), "Valencia", Position::Midfielder, price);
        p.season_average_points = mean(&points);
        p.games_played = points.len() as u32;
        p.minutes_played = 85 * points.len() as u32;
        p.recent_points = points;
        p
    }

    fn prediction(id: PlayerId, points: f64, confidence: f64) -> Prediction {
        Prediction {
            player_id: id,
            predicted_points: points,
            confidence,
            ema_points: points,
            fixture_adjusted_points: points,
            starter_probability: 1.0,
            fixture_difficulty: 3,
        }
    }

    #[test]
    fn zero_or_negative_price_has_no_value() {
        let calc = ValueCalculator::default();
        for price in [0.0, -3.0] {
            let p = make_player(1, price, vec![6.0; 5]);
            assert_eq!(calc.value_score(&p, &prediction(1, 9.0, 1.0)), 0.0);
        }
    }

    #[test]
    fn value_increases_with_predicted_points() {
        let calc = ValueCalculator::default();
        let p = make_player(1, 6.0, vec![5.0, 6.0, 7.0]);
        let mut prev = -1.0;
        for pts in [0.0, 2.0, 4.5, 8.0, 12.0] {
            let v = calc.value_score(&p, &prediction(1, pts, 0.9));
            assert!(v > prev);
            prev = v;
        }
    }

    #[test]
    fn value_score_factors() {
        let calc = ValueCalculator::default();
        let mut p = make_player(1, 5.0, vec![6.0, 6.0, 6.0]);
        // base 2.0, ownership 1.0, form 1.0, consistency 1.2
        assert_eq!(calc.value_score(&p, &prediction(1, 10.0, 1.0)), 2.4);
        p.ownership_percent = 80.0;
        // ownership floored at 0.5
        assert_eq!(calc.value_score(&p, &prediction(1, 10.0, 1.0)), 1.2);
    }

    #[test]
    fn fair_value_respects_bounds() {
        let calc = ValueCalculator::default();
        let cheap = make_player(1, 0.0, vec![]);
        assert!(calc.fair_value(&cheap) >= 0.5);
        let mut star = make_player(2, 40.0, vec![20.0; 6]);
        star.position = Position::Forward;
        assert_eq!(calc.fair_value(&star), 15.0);
    }

    #[test]
    fn fair_value_blends_towards_market_price() {
        let calc = ValueCalculator::default();
        let p = make_player(1, 6.0, vec![6.0; 5]);
        let fair = calc.fair_value(&p);
        let intrinsic_share = (fair - 0.8 * 6.0) / 0.2;
        assert!(intrinsic_share > 0.0);
        assert!(fair > 4.8 && fair < 6.0 + 0.2 * 15.0);
    }

    #[test]
    fn conservative_floor_wins_over_bankroll_cap() {
        let calc = ValueCalculator::default();
        let p = make_player(1, 10.0, vec![6.0; 5]);
        // 30% of a 5.0 bankroll is 1.5, but the floor is price * 1.05
        let a = calc.analyze_bid(&p, &prediction(1, 7.0, 0.9), None, 5.0, RiskTolerance::High);
        assert_eq!(a.max_bid, 10.5);
        assert_eq!(a.conservative_bid, 10.5);
    }

    #[test]
    fn conservative_bankroll_cap_binds_above_floor() {
        let calc = ValueCalculator::default();
        let p = make_player(1, 5.0, vec![6.0, 6.0, 6.0]);
        // value 2.4: aggressive 5 * 2.4 * 1.0 * 1.0 = 12, cap 0.3 * 20 = 6, floor 5.25
        let a = calc.analyze_bid(&p, &prediction(1, 10.0, 1.0), None, 20.0, RiskTolerance::High);
        assert_eq!(a.value_score, 2.4);
        assert_eq!(a.aggressive_bid, 12.0);
        assert_eq!(a.max_bid, 6.0);
        assert_eq!(a.conservative_bid, 5.25);

        // With room in the bankroll the aggressive bid passes through.
        let a = calc.analyze_bid(&p, &prediction(1, 10.0, 1.0), None, 100.0, RiskTolerance::High);
        assert_eq!(a.max_bid, 12.0);
        // Medium tolerance scales by 0.85.
        let a = calc.analyze_bid(&p, &prediction(1, 10.0, 1.0), None, 100.0, RiskTolerance::Medium);
        assert_eq!(a.max_bid, 10.2);
    }

    fn demand(level: f64) -> MarketData {
        MarketData {
            player_id: 1,
            current_price: 5.0,
            price_change: 0.0,
            predicted_price: 5.0,
            demand: level,
            supply: 0.5,
        }
    }

    #[test]
    fn kelly_fraction_of_bankroll_binds() {
        let mut config = ModelConfig::default();
        config.strategies.bid_sizing = BidSizingStrategy::Kelly;
        let calc = ValueCalculator::new(&config);
        // gain 0.5, loss min(1.5, 2.5) = 1.5, p = 0.8: f = 0.8 - 0.2 * 3 = 0.2
        // market-adjusted 5.5 * 0.9 * 1.2 = 5.94, Kelly 0.2 * 25 = 5.0, cap 12.5
        let max = calc.kelly_max_bid(5.0, 5.5, 0.2, Some(&demand(1.0)), 25.0, RiskTolerance::Medium);
        assert!(approx_eq(max, 5.0, 1e-9));
    }

    #[test]
    fn kelly_market_adjusted_value_binds() {
        let calc = ValueCalculator::default();
        // risk-adjusted 6 * (1 - 0.2 * 0.5) = 5.4, default pressure 0.5 keeps it at 5.4;
        // Kelly fraction caps at 0.25 of 100 = 25, half bankroll 50.
        let max = calc.kelly_max_bid(5.0, 6.0, 0.2, None, 100.0, RiskTolerance::Medium);
        assert!(approx_eq(max, 5.4, 1e-9));
        // No edge: fallback fraction 0.1 of 30 = 3.0, floored at 0.9 * price.
        let max = calc.kelly_max_bid(5.0, 4.0, 0.2, None, 30.0, RiskTolerance::Medium);
        assert!(approx_eq(max, 4.5, 1e-9));
    }

    #[test]
    fn kelly_fraction_normal_path() {
        assert!(approx_eq(kelly_fraction(0.8, 0.5, 1.5), 0.2, 1e-9));
        // b = 0.5: f = (0.35 - 0.3) / 0.5 = 0.1
        assert!(approx_eq(kelly_fraction(0.7, 1.0, 2.0), 0.1, 1e-9));
    }

    #[test]
    fn bid_range_is_ordered() {
        for strategy in [BidSizingStrategy::Conservative, BidSizingStrategy::Kelly] {
            let mut config = ModelConfig::default();
            config.strategies.bid_sizing = strategy;
            let calc = ValueCalculator::new(&config);
            for price in [0.0, 2.0, 6.0, 14.0] {
                let p = make_player(1, price, vec![3.0, 9.0, 6.0, 7.0]);
                for tol in [RiskTolerance::Low, RiskTolerance::Medium, RiskTolerance::High] {
                    let r = calc.bid_range(&p, &prediction(1, 7.0, 0.8), None, 50.0, tol);
                    assert!(r.min <= r.fair && r.fair <= r.max, "{strategy:?} {price} {r:?}");
                    assert!(r.min >= 0.5);
                }
            }
        }
    }

    #[test]
    fn kelly_caps_at_half_bankroll() {
        let mut config = ModelConfig::default();
        config.strategies.bid_sizing = BidSizingStrategy::Kelly;
        let calc = ValueCalculator::new(&config);
        let p = make_player(1, 1.0, vec![12.0; 6]);
        let a = calc.analyze_bid(&p, &prediction(1, 12.0, 1.0), None, 2.0, RiskTolerance::High);
        assert!(a.max_bid <= 1.0 + 1e-9);
    }

    #[test]
    fn kelly_fraction_edges() {
        assert_eq!(kelly_fraction(0.6, 0.0, 1.0), 0.0);
        assert_eq!(kelly_fraction(0.6, 1.0, 0.0), 0.0);
        // b = 1: f = 0.6 - 0.4 = 0.2
        assert!(approx_eq(kelly_fraction(0.6, 1.0, 1.0), 0.2, 1e-9));
        assert_eq!(kelly_fraction(0.9, 10.0, 1.0), 0.25);
    }

    #[test]
    fn compare_sorts_by_composite_and_labels() {
        let calc = ValueCalculator::default();
        let strong = make_player(1, 4.0, vec![8.0; 5]);
        let mut hurt = make_player(2, 4.0, vec![2.0, 14.0, 0.0]);
        hurt.status = PlayerStatus::Injured;
        let players = vec![hurt, strong];
        let preds = vec![prediction(2, 1.0, 0.3), prediction(1, 9.0, 1.0)];
        let ranked = calc.compare(&players, &preds);
        assert_eq!(ranked[0].player_id, 1);
        assert_eq!(ranked[0].verdict, Verdict::StrongBuy);
        assert_eq!(ranked[1].player_id, 2);
        assert!(ranked[1].composite_score < ranked[0].composite_score);
    }
}
