// Sell/buy pairings for squad players flagged by team triage.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::player::{Market, PlayerId, Position, TeamState};
use crate::recommend::team::TeamAnalysis;
use crate::recommend::{PlayerAnalysis, RecommendationEngine};
use crate::stats::round_to;

/// Risk delta beyond which a swap counts as changing risk.
const RISK_CHANGE_BAND: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskChange {
    Lower,
    Higher,
    Similar,
}

impl RiskChange {
    fn from_improvement(improvement: f64) -> Self {
        if improvement > RISK_CHANGE_BAND {
            RiskChange::Lower
        } else if improvement < -RISK_CHANGE_BAND {
            RiskChange::Higher
        } else {
            RiskChange::Similar
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapRecommendation {
    pub sell_player_id: PlayerId,
    pub sell_name: String,
    pub buy_player_id: PlayerId,
    pub buy_name: String,
    pub position: Position,
    pub expected_points_gain: f64,
    /// Buy price minus sell price; negative frees money.
    pub cost_difference: f64,
    /// Sell risk minus buy risk; positive means safer.
    pub risk_improvement: f64,
    pub risk_change: RiskChange,
    pub confidence: f64,
}

impl SwapRecommendation {
    fn rank_key(&self) -> f64 {
        self.expected_points_gain * self.confidence
    }
}

fn swap_confidence(gain: f64, buy: &PlayerAnalysis, risk_improvement: f64) -> f64 {
    let c = 0.4 * (gain / 10.0)
        + 0.3 * (buy.value_ratio / 4.0)
        + 0.2 * risk_improvement
        + 0.1 * (buy.form_score / 10.0);
    round_to(c.clamp(0.0, 1.0), 3)
}

impl RecommendationEngine {
    /// Propose swaps for every sell candidate, best first.
    pub fn recommend_swaps(&self, team: &TeamState, market: &Market) -> Vec<SwapRecommendation> {
        let team_analysis = self.analyze_team(team);
        self.swaps_from(team, &team_analysis, market)
    }

    pub(crate) fn swaps_from(
        &self,
        team: &TeamState,
        team_analysis: &TeamAnalysis,
        market: &Market,
    ) -> Vec<SwapRecommendation> {
        if team_analysis.sell_candidates.is_empty() {
            return Vec::new();
        }

        let owned: HashSet<PlayerId> = team.players.iter().map(|p| p.id).collect();
        let pool: Vec<PlayerAnalysis> = self
            .analyze_market_players(market)
            .into_iter()
            .filter(|a| !owned.contains(&a.player_id))
            .collect();
        let budget = self.config.swap_budget;

        let mut swaps = Vec::new();
        for candidate in &team_analysis.sell_candidates {
            let sell = &candidate.analysis;
            let mut options: Vec<SwapRecommendation> = pool
                .iter()
                .filter(|buy| buy.position == sell.position)
                .filter(|buy| budget.allows(sell.price, buy.price))
                .filter(|buy| buy.expected_points > sell.expected_points)
                .filter(|buy| buy.price - sell.price <= team.bankroll)
                .filter_map(|buy| {
                    let gain = buy.expected_points - sell.expected_points;
                    let risk_improvement = sell.risk_score - buy.risk_score;
                    if !(gain > 2.0 || (gain > 0.0 && risk_improvement > 0.1)) {
                        return None;
                    }
                    Some(SwapRecommendation {
                        sell_player_id: sell.player_id,
                        sell_name: sell.name.clone(),
                        buy_player_id: buy.player_id,
                        buy_name: buy.name.clone(),
                        position: sell.position,
                        expected_points_gain: round_to(gain, 2),
                        cost_difference: round_to(buy.price - sell.price, 2),
                        risk_improvement: round_to(risk_improvement, 3),
                        risk_change: RiskChange::from_improvement(risk_improvement),
                        confidence: swap_confidence(gain, buy, risk_improvement),
                    })
                })
                .collect();

            options.sort_by(|a, b| {
                b.expected_points_gain
                    .partial_cmp(&a.expected_points_gain)
                    .unwrap_or(Ordering::Equal)
            });
            options.truncate(self.config.candidates_per_sell);
            swaps.extend(options);
        }

        swaps.sort_by(|a, b| {
            b.rank_key()
                .partial_cmp(&a.rank_key())
                .unwrap_or(Ordering::Equal)
        });
        swaps.truncate(self.config.max_swaps);

        debug!(
            "swaps: {} sell candidates, {} market options, {} recommended",
            team_analysis.sell_candidates.len(),
            pool.len(),
            swaps.len()
        );
        swaps
    }
}
