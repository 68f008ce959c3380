// Market segmentation into best buys, overpriced players and bargains.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::player::Market;
use crate::recommend::{PlayerAnalysis, RecommendationEngine};
use crate::stats::{mean, round_to};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketTrends {
    pub total_players: usize,
    pub average_price: f64,
    pub average_expected_points: f64,
    pub average_value_ratio: f64,
    pub average_risk: f64,
    /// Players with a value ratio above 3.0.
    pub high_value_count: usize,
    pub bargain_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    pub best_buys: Vec<PlayerAnalysis>,
    pub overpriced: Vec<PlayerAnalysis>,
    pub bargains: Vec<PlayerAnalysis>,
    pub trends: MarketTrends,
}

impl MarketAnalysis {
    /// Best buys followed by bargains, without repeating a player.
    pub fn targets(&self) -> Vec<&PlayerAnalysis> {
        let mut out: Vec<&PlayerAnalysis> = Vec::new();
        for a in self.best_buys.iter().chain(&self.bargains) {
            if !out.iter().any(|o| o.player_id == a.player_id) {
                out.push(a);
            }
        }
        out
    }
}

fn is_best_buy(a: &PlayerAnalysis) -> bool {
    a.value_ratio > 2.0 && a.expected_points > 8.0 && a.risk_score < 0.5
}

fn is_overpriced(a: &PlayerAnalysis) -> bool {
    a.fair_value_ratio() < 0.8 && a.value_ratio < 1.5
}

fn is_bargain(a: &PlayerAnalysis) -> bool {
    a.fair_value_ratio() > 1.2 && a.expected_points > 6.0 && a.form_score > 4.0
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

impl RecommendationEngine {
    pub fn analyze_market(&self, market: &Market) -> MarketAnalysis {
        let top_n = self.config.top_n;
        let all = self.analyze_market_players(market);

        // Best buys: filter the top 2N by value ratio, keep N.
        let mut by_value: Vec<&PlayerAnalysis> = all.iter().collect();
        by_value.sort_by(|a, b| desc(a.value_ratio, b.value_ratio));
        let best_buys: Vec<PlayerAnalysis> = by_value
            .into_iter()
            .take(top_n * 2)
            .filter(|a| is_best_buy(a))
            .take(top_n)
            .cloned()
            .collect();

        let mut overpriced: Vec<PlayerAnalysis> =
            all.iter().filter(|a| is_overpriced(a)).cloned().collect();
        overpriced.sort_by(|a, b| {
            a.value_ratio
                .partial_cmp(&b.value_ratio)
                .unwrap_or(Ordering::Equal)
        });
        overpriced.truncate(top_n);

        let mut bargains: Vec<PlayerAnalysis> =
            all.iter().filter(|a| is_bargain(a)).cloned().collect();
        bargains.sort_by(|a, b| desc(a.fair_value_ratio(), b.fair_value_ratio()));
        bargains.truncate(top_n);

        let prices: Vec<f64> = all.iter().map(|a| a.price).collect();
        let expected: Vec<f64> = all.iter().map(|a| a.expected_points).collect();
        let ratios: Vec<f64> = all.iter().map(|a| a.value_ratio).collect();
        let risks: Vec<f64> = all.iter().map(|a| a.risk_score).collect();

        let trends = MarketTrends {
            total_players: all.len(),
            average_price: round_to(mean(&prices), 2),
            average_expected_points: round_to(mean(&expected), 2),
            average_value_ratio: round_to(mean(&ratios), 3),
            average_risk: round_to(mean(&risks), 3),
            high_value_count: ratios.iter().filter(|&&r| r > 3.0).count(),
            bargain_count: bargains.len(),
        };

        debug!(
            "market: {} players, {} best buys, {} overpriced, {} bargains",
            all.len(),
            best_buys.len(),
            overpriced.len(),
            bargains.len()
        );

        MarketAnalysis {
            best_buys,
            overpriced,
            bargains,
            trends,
        }
    }
}
