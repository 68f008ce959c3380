// Recommendation engine: team triage, market segmentation, swaps, bids,
// differentials, and a combined report.
//
// Everything here ranks `PlayerAnalysis` records built from the prediction
// and valuation layers. Sorting is stable throughout, so ties keep input order.

pub mod bids;
pub mod differentials;
pub mod market;
pub mod swaps;
pub mod team;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BidConfig, ModelConfig, RecommendationConfig};
use crate::player::{Market, MarketData, Player, PlayerId, Position, RivalTeam, TeamState};
use crate::prediction::availability::availability_score;
use crate::prediction::fixture::NEUTRAL_DIFFICULTY;
use crate::prediction::forecast::{ConfidenceLevel, ForecastInterval};
use crate::prediction::Prediction;
use crate::stats::round_to;
use crate::valuation::risk::RiskBreakdown;
use crate::valuation::value::PlayerComparison;
use crate::valuation::ValueCalculator;

pub use bids::{BidPlan, BidRecommendation, RiskLevel};
pub use differentials::{Differential, DifferentialAction};
pub use market::{MarketAnalysis, MarketTrends};
pub use swaps::{RiskChange, SwapRecommendation};
pub use team::{SellCandidate, SellReason, TeamAnalysis};

// ---------------------------------------------------------------------------
// Swap budget rule
// ---------------------------------------------------------------------------

/// How much more than the outgoing player an incoming one may cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum SwapBudget {
    /// `buy_price <= sell_price * ratio`
    PriceRatio(f64),
    /// `buy_price <= sell_price + amount`
    Additional(f64),
}

impl SwapBudget {
    pub fn value(&self) -> f64 {
        match self {
            SwapBudget::PriceRatio(v) | SwapBudget::Additional(v) => *v,
        }
    }

    /// Highest price a replacement for a player priced `sell_price` may have.
    pub fn limit(&self, sell_price: f64) -> f64 {
        match self {
            SwapBudget::PriceRatio(ratio) => sell_price * ratio,
            SwapBudget::Additional(amount) => sell_price + amount,
        }
    }

    pub fn allows(&self, sell_price: f64, buy_price: f64) -> bool {
        buy_price <= self.limit(sell_price)
    }
}

impl Default for SwapBudget {
    fn default() -> Self {
        SwapBudget::PriceRatio(1.2)
    }
}

// ---------------------------------------------------------------------------
// Per-player analysis
// ---------------------------------------------------------------------------

/// Everything the ranking rules look at for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAnalysis {
    pub player_id: PlayerId,
    pub name: String,
    pub team: String,
    pub position: Position,
    pub price: f64,
    pub ownership_percent: f64,
    pub prediction: Prediction,
    /// Forecast over the configured horizon.
    pub expected_points: f64,
    /// 95% interval around `expected_points`.
    pub points_interval: ForecastInterval,
    /// Horizon points above a freely available player at the same position.
    pub value_over_replacement: f64,
    pub form_score: f64,
    /// Average difficulty over the horizon (neutral when unknown).
    pub fixture_difficulty: f64,
    pub availability_score: f64,
    pub risk: RiskBreakdown,
    pub risk_score: f64,
    pub fair_value: f64,
    /// Horizon points per million; 0 for a non-positive price.
    pub value_ratio: f64,
    pub value_score: f64,
}

impl PlayerAnalysis {
    /// Fair value over price; 0 for a non-positive price.
    pub fn fair_value_ratio(&self) -> f64 {
        if self.price > 0.0 {
            self.fair_value / self.price
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Combined report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationReport {
    pub team_analysis: TeamAnalysis,
    pub market_analysis: MarketAnalysis,
    pub swaps: Vec<SwapRecommendation>,
    pub bids: BidPlan,
    pub differentials: Vec<Differential>,
    /// Market players ranked by value adjusted for risk.
    pub market_comparison: Vec<PlayerComparison>,
    pub summary: Vec<String>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    value: ValueCalculator,
    bids: BidConfig,
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(config: &ModelConfig) -> Self {
        RecommendationEngine {
            value: ValueCalculator::new(config),
            bids: config.bids.clone(),
            config: config.recommendations.clone(),
        }
    }

    pub fn value_calculator(&self) -> &ValueCalculator {
        &self.value
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    pub fn analyze_player(&self, player: &Player, market: Option<&MarketData>) -> PlayerAnalysis {
        let engine = self.value.engine();
        let horizon = self.value.horizon();

        let prediction = engine.predict(player, None);
        let expected_points = engine.expected_points_next_k(player, horizon);
        let risk = self.value.risk_scorer().score(player, market);
        let risk_score = risk.total;
        let value_ratio = if player.price > 0.0 {
            round_to(expected_points / player.price, 3)
        } else {
            0.0
        };

        PlayerAnalysis {
            player_id: player.id,
            name: player.name.clone(),
            team: player.team.clone(),
            position: player.position,
            price: player.price,
            ownership_percent: player.ownership_percent,
            expected_points,
            points_interval: engine.confidence_interval(
                player,
                horizon,
                ConfidenceLevel::NinetyFive,
            ),
            value_over_replacement: engine.value_over_replacement(player, horizon),
            form_score: round_to(engine.form().form_score(&player.recent_points), 2),
            fixture_difficulty: engine
                .fixtures()
                .horizon_difficulty(player, horizon)
                .unwrap_or(NEUTRAL_DIFFICULTY as f64),
            availability_score: availability_score(player),
            risk,
            risk_score,
            fair_value: self.value.fair_value(player),
            value_ratio,
            value_score: self.value.value_score(player, &prediction),
            prediction,
        }
    }

    /// Analyze every available player, attaching market data where present.
    pub(crate) fn analyze_market_players(&self, market: &Market) -> Vec<PlayerAnalysis> {
        market
            .available_players
            .iter()
            .map(|p| self.analyze_player(p, market.market_data_for(p.id)))
            .collect()
    }

    /// Run every analysis and summarise the headline actions.
    pub fn generate_report(
        &self,
        team: &TeamState,
        market: &Market,
        rivals: &[RivalTeam],
    ) -> RecommendationReport {
        let team_analysis = self.analyze_team(team);
        let market_analysis = self.analyze_market(market);
        let swaps = self.swaps_from(team, &team_analysis, market);
        let bids = self.bids_for(team, market, &bids::default_targets(team, &market_analysis));
        let differentials = self.differentials_from(
            team,
            &market_analysis,
            rivals,
            self.config.differential_threshold,
        );
        let market_comparison = self.compare_market(market);

        let mut summary = Vec::new();
        if !team_analysis.sell_candidates.is_empty() {
            summary.push(format!(
                "Consider selling {} players.",
                team_analysis.sell_candidates.len()
            ));
        }
        if let Some(top) = market_analysis.best_buys.first() {
            summary.push(format!(
                "Top target: {} (value ratio: {:.1}).",
                top.name, top.value_ratio
            ));
        }
        if let Some(top) = swaps.first() {
            summary.push(format!(
                "Best swap gains {:.1} points.",
                top.expected_points_gain
            ));
        }
        if !differentials.is_empty() {
            summary.push(format!(
                "Found {} differential opportunities.",
                differentials.len()
            ));
        }
        if summary.is_empty() {
            summary.push("No major changes recommended.".to_string());
        }

        debug!(
            "report: {} sell candidates, {} swaps, {} bids, {} differentials",
            team_analysis.sell_candidates.len(),
            swaps.len(),
            bids.bids.len(),
            differentials.len()
        );

        RecommendationReport {
            team_analysis,
            market_analysis,
            swaps,
            bids,
            differentials,
            market_comparison,
            summary,
        }
    }

    /// Every available player ranked by `value x (1 - risk)`, best first.
    pub fn compare_market(&self, market: &Market) -> Vec<PlayerComparison> {
        let engine = self.value.engine();
        let predictions: Vec<Prediction> = market
            .available_players
            .iter()
            .map(|p| engine.predict(p, None))
            .collect();
        self.value.compare(&market.available_players, &predictions)
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Shared test fixtures
// ---------------------------------------------------------------------------
