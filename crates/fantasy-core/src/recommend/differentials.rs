// Differentials: strong market options that few rivals own.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::player::{Market, PlayerId, Position, RivalTeam, TeamState};
use crate::recommend::market::MarketAnalysis;
use crate::recommend::RecommendationEngine;
use crate::stats::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferentialAction {
    /// Already in our squad: keep the edge.
    Hold,
    Buy,
    /// Upside is there but risk is high.
    Watch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Differential {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    /// Share of rivals owning the player, 0-100.
    pub ownership_percentage: f64,
    pub expected_points: f64,
    pub differential_score: f64,
    /// Expected points over `max(risk, 0.1)`.
    pub risk_reward: f64,
    pub action: DifferentialAction,
    pub recommendation: String,
}

/// Fraction of `rivals` whose roster includes `id`.
pub fn rival_ownership(id: PlayerId, rivals: &[RivalTeam]) -> f64 {
    if rivals.is_empty() {
        return 0.0;
    }
    let owners = rivals.iter().filter(|r| r.players.contains(&id)).count();
    owners as f64 / rivals.len() as f64
}

/// `expected x (1 - rival_share) x clamp(value_ratio / 2, 0, 2)`.
pub fn differential_score(expected_points: f64, rival_share: f64, value_ratio: f64) -> f64 {
    expected_points * (1.0 - rival_share) * (value_ratio / 2.0).clamp(0.0, 2.0)
}

/// Expected points per unit of risk, with risk floored at 0.1.
pub fn risk_reward(expected_points: f64, risk: f64) -> f64 {
    expected_points / risk.max(0.1)
}

impl RecommendationEngine {
    /// Market targets owned by at most `threshold` (0-1) of `rivals`, best
    /// first. No rivals means nothing to differentiate from.
    pub fn find_differentials(
        &self,
        team: &TeamState,
        market: &Market,
        rivals: &[RivalTeam],
        threshold: f64,
    ) -> Vec<Differential> {
        if rivals.is_empty() {
            return Vec::new();
        }
        let analysis = self.analyze_market(market);
        self.differentials_from(team, &analysis, rivals, threshold)
    }

    pub(crate) fn differentials_from(
        &self,
        team: &TeamState,
        market_analysis: &MarketAnalysis,
        rivals: &[RivalTeam],
        threshold: f64,
    ) -> Vec<Differential> {
        if rivals.is_empty() {
            return Vec::new();
        }
        let owned: HashSet<PlayerId> = team.players.iter().map(|p| p.id).collect();

        let mut out: Vec<Differential> = market_analysis
            .targets()
            .into_iter()
            .filter_map(|a| {
                let fraction = rival_ownership(a.player_id, rivals);
                if fraction > threshold {
                    return None;
                }
                let score = differential_score(a.expected_points, fraction, a.value_ratio);
                let reward = risk_reward(a.expected_points, a.risk_score);
                let action = if owned.contains(&a.player_id) {
                    DifferentialAction::Hold
                } else if a.risk_score < 0.5 {
                    DifferentialAction::Buy
                } else {
                    DifferentialAction::Watch
                };
                let recommendation = match action {
                    DifferentialAction::Hold => format!(
                        "Keep {}: only {:.0}% of rivals own this player.",
                        a.name,
                        fraction * 100.0
                    ),
                    DifferentialAction::Buy => format!(
                        "Buy {} for {:.1} expected points that {:.0}% of rivals have.",
                        a.name,
                        a.expected_points,
                        fraction * 100.0
                    ),
                    DifferentialAction::Watch => format!(
                        "Watch {}: low ownership but risk {:.2}.",
                        a.name, a.risk_score
                    ),
                };
                Some(Differential {
                    player_id: a.player_id,
                    name: a.name.clone(),
                    position: a.position,
                    ownership_percentage: round_to(fraction * 100.0, 1),
                    expected_points: a.expected_points,
                    differential_score: round_to(score, 3),
                    risk_reward: round_to(reward, 2),
                    action,
                    recommendation,
                })
            })
            .collect();

        out.sort_by(|a, b| {
            b.differential_score
                .partial_cmp(&a.differential_score)
                .unwrap_or(Ordering::Equal)
        });
        out.truncate(self.config.max_differentials);

        debug!(
            "differentials: {} rivals, threshold {:.2}, {} found",
            rivals.len(),
            threshold,
            out.len()
        );
        out
    }
}
