// Squad triage: who to sell, which positions are short, overall balance.

use serde::Serialize;

use crate::player::{Position, TeamState};
use crate::recommend::{PlayerAnalysis, RecommendationEngine};
use crate::stats::{mean, round_to};

const SELL_RISK: f64 = 0.7;
const SELL_FORM: f64 = 3.0;
const SELL_VALUE_RATIO: f64 = 1.5;
const SELL_EXPECTED_POINTS: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SellReason {
    HighRisk,
    PoorForm,
    LowValue,
    LowExpectedPoints,
}

impl SellReason {
    /// Every rule the player trips; empty means keep.
    fn collect(a: &PlayerAnalysis) -> Vec<SellReason> {
        let mut reasons = Vec::new();
        if a.risk_score > SELL_RISK {
            reasons.push(SellReason::HighRisk);
        }
        if a.form_score < SELL_FORM {
            reasons.push(SellReason::PoorForm);
        }
        if a.value_ratio < SELL_VALUE_RATIO {
            reasons.push(SellReason::LowValue);
        }
        if a.expected_points < SELL_EXPECTED_POINTS {
            reasons.push(SellReason::LowExpectedPoints);
        }
        reasons
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellCandidate {
    pub analysis: PlayerAnalysis,
    pub reasons: Vec<SellReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionCount {
    pub position: Position,
    pub count: usize,
    pub target: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAnalysis {
    pub sell_candidates: Vec<SellCandidate>,
    pub keep: Vec<PlayerAnalysis>,
    pub position_counts: Vec<PositionCount>,
    pub weak_positions: Vec<Position>,
    pub total_expected_points: f64,
    pub average_risk: f64,
    /// `clamp(1 - gaps/4 - 0.3 * average_risk, 0, 1)`.
    pub balance_score: f64,
}

impl RecommendationEngine {
    pub fn analyze_team(&self, team: &TeamState) -> TeamAnalysis {
        let mut sell_candidates = Vec::new();
        let mut keep = Vec::new();
        let mut risks = Vec::with_capacity(team.players.len());
        let mut total_expected = 0.0;

        for player in &team.players {
            let analysis = self.analyze_player(player, None);
            risks.push(analysis.risk_score);
            total_expected += analysis.expected_points;
            let reasons = SellReason::collect(&analysis);
            if reasons.is_empty() {
                keep.push(analysis);
            } else {
                sell_candidates.push(SellCandidate { analysis, reasons });
            }
        }

        let position_counts: Vec<PositionCount> = Position::ALL
            .iter()
            .map(|&position| PositionCount {
                position,
                count: team.players.iter().filter(|p| p.position == position).count(),
                target: position.squad_target(),
            })
            .collect();
        let weak_positions: Vec<Position> = position_counts
            .iter()
            .filter(|c| c.count < c.target)
            .map(|c| c.position)
            .collect();

        let average_risk = mean(&risks);
        let gap_fraction = weak_positions.len() as f64 / Position::ALL.len() as f64;
        let balance = (1.0 - gap_fraction - 0.3 * average_risk).clamp(0.0, 1.0);

        TeamAnalysis {
            sell_candidates,
            keep,
            position_counts,
            weak_positions,
            total_expected_points: round_to(total_expected, 2),
            average_risk: round_to(average_risk, 3),
            balance_score: round_to(balance, 3),
        }
    }
}
