// Bid ranges for transfer targets, with a greedy affordability pass.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::player::{Market, PlayerId, Position, TeamState};
use crate::recommend::market::MarketAnalysis;
use crate::recommend::RecommendationEngine;
use crate::stats::round_to;
use crate::valuation::value::RiskTolerance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(risk: f64) -> Self {
        if risk < 0.3 {
            RiskLevel::Low
        } else if risk < 0.6 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidRecommendation {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub price: f64,
    pub min_bid: f64,
    pub fair_bid: f64,
    pub max_bid: f64,
    pub expected_points: f64,
    /// Expected points per million of max bid.
    pub value_per_cost: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub market_pressure: f64,
    /// Buy timing in [0, 1] from price trend, range position and fair value.
    pub market_timing_score: f64,
    /// Percent return from buying at the fair bid and holding over the horizon.
    pub expected_roi: f64,
    /// Whether the max bid fits in the budget left after better-value bids.
    pub affordable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidPlan {
    /// Sorted by value per cost, best first.
    pub bids: Vec<BidRecommendation>,
    pub total_budget: f64,
    /// Sum of max bids marked affordable.
    pub committed: f64,
    pub remaining: f64,
}

impl RecommendationEngine {
    /// Bid ranges for `targets`, or for the market's best buys and bargains
    /// when no targets are given. Unknown ids are skipped with a warning.
    pub fn recommend_bids(
        &self,
        team: &TeamState,
        market: &Market,
        targets: Option<&[PlayerId]>,
    ) -> BidPlan {
        let ids = match targets {
            Some(ids) => ids.to_vec(),
            None => default_targets(team, &self.analyze_market(market)),
        };
        self.bids_for(team, market, &ids)
    }

    pub(crate) fn bids_for(&self, team: &TeamState, market: &Market, ids: &[PlayerId]) -> BidPlan {
        let tolerance: RiskTolerance = self.bids.risk_tolerance;
        let mut bids = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(player) = market.player(id) else {
                warn!("bid target {} is not in the market; skipping", id);
                continue;
            };
            let market_data = market.market_data_for(id);
            let engine = self.value.engine();
            let prediction = engine.predict(player, None);
            let analysis =
                self.value
                    .analyze_bid(player, &prediction, market_data, team.bankroll, tolerance);
            let range = analysis.bid_range();
            let horizon = self.value.horizon();
            let expected = engine.expected_points_next_k(player, horizon);
            let pressure = market_data
                .map(|m| m.demand)
                .unwrap_or(self.bids.default_market_pressure);

            bids.push(BidRecommendation {
                player_id: player.id,
                name: player.name.clone(),
                position: player.position,
                price: player.price,
                min_bid: range.min,
                fair_bid: range.fair,
                max_bid: range.max,
                expected_points: expected,
                value_per_cost: round_to(expected / range.max.max(0.1), 3),
                risk_score: analysis.risk_score,
                risk_level: RiskLevel::from_score(analysis.risk_score),
                market_pressure: pressure,
                market_timing_score: self.value.market_timing_score(player),
                expected_roi: self.value.expected_roi(player, range.fair, horizon),
                affordable: false,
            });
        }

        bids.sort_by(|a, b| {
            b.value_per_cost
                .partial_cmp(&a.value_per_cost)
                .unwrap_or(Ordering::Equal)
        });

        let mut committed = 0.0;
        for bid in &mut bids {
            if committed + bid.max_bid <= team.bankroll {
                committed += bid.max_bid;
                bid.affordable = true;
            }
        }

        debug!(
            "bids: {} targets, {} affordable, {:.2} of {:.2} committed",
            bids.len(),
            bids.iter().filter(|b| b.affordable).count(),
            committed,
            team.bankroll
        );

        BidPlan {
            bids,
            total_budget: team.bankroll,
            committed: round_to(committed, 2),
            remaining: round_to(team.bankroll - committed, 2),
        }
    }
}

/// Best buys then bargains, minus players already in the squad.
pub(crate) fn default_targets(team: &TeamState, analysis: &MarketAnalysis) -> Vec<PlayerId> {
    let owned: HashSet<PlayerId> = team.players.iter().map(|p| p.id).collect();
    analysis
        .targets()
        .into_iter()
        .map(|a| a.player_id)
        .filter(|id| !owned.contains(id))
        .collect()
}
