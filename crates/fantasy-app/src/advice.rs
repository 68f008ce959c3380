// One full advisory pass over a loaded snapshot.

use chrono::{DateTime, Utc};
use fantasy_core::config::ModelConfig;
use fantasy_core::player::{Fixture, Player};
use fantasy_core::prediction::Prediction;
use fantasy_core::recommend::{RecommendationEngine, RecommendationReport};
use serde::Serialize;
use tracing::info;

use crate::snapshot::Snapshot;

/// The JSON document printed by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct Advice {
    pub generated_at: DateTime<Utc>,
    pub horizon: usize,
    /// Next-match predictions for the squad, using the supplied fixtures.
    pub squad_predictions: Vec<Prediction>,
    pub report: RecommendationReport,
}

/// Predict the squad's next match and build the full recommendation report.
/// `extra_fixtures` are appended to the snapshot's own fixtures.
pub fn advise(config: &ModelConfig, snapshot: &Snapshot, extra_fixtures: &[Fixture]) -> Advice {
    let engine = RecommendationEngine::new(config);
    let fixtures: Vec<Fixture> = snapshot
        .fixtures
        .iter()
        .chain(extra_fixtures)
        .cloned()
        .collect();

    let squad: &[Player] = &snapshot.team.players;
    let squad_predictions = engine
        .value_calculator()
        .engine()
        .predict_many(squad, &fixtures);

    let report = engine.generate_report(&snapshot.team, &snapshot.market, &snapshot.rivals);
    info!(
        "advice ready: {} squad players, {} market players, {} swaps, {} bids",
        squad.len(),
        snapshot.market.available_players.len(),
        report.swaps.len(),
        report.bids.bids.len()
    );

    Advice {
        generated_at: Utc::now(),
        horizon: config.forecast.horizon,
        squad_predictions,
        report,
    }
}
