// Point prediction: form -> fixture -> availability -> confidence.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::config::ModelConfig;
use crate::player::{Fixture, Player, PlayerId};
use crate::prediction::availability::StarterProbabilityStrategy;
use crate::prediction::confidence::confidence;
use crate::prediction::fixture::{resolve_difficulty, FixtureAdjuster};
use crate::prediction::form::FormEstimator;
use crate::stats::round_to;

/// Single-match point estimate for one player.
///
/// `predicted_points == round(fixture_adjusted_points * starter_probability, 2)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub player_id: PlayerId,
    pub predicted_points: f64,
    pub confidence: f64,
    pub ema_points: f64,
    pub fixture_adjusted_points: f64,
    pub starter_probability: f64,
    /// Difficulty actually applied (1-5).
    pub fixture_difficulty: u8,
}

#[derive(Debug, Clone)]
pub struct PredictionEngine {
    pub(crate) form: FormEstimator,
    pub(crate) fixtures: FixtureAdjuster,
    pub(crate) starter: StarterProbabilityStrategy,
}

impl PredictionEngine {
    pub fn new(config: &ModelConfig) -> Self {
        PredictionEngine {
            form: FormEstimator::new(config.form.alpha),
            fixtures: FixtureAdjuster::new(config.fixtures.ratings.clone()),
            starter: config.strategies.starter_probability,
        }
    }

    pub fn form(&self) -> &FormEstimator {
        &self.form
    }

    pub fn fixtures(&self) -> &FixtureAdjuster {
        &self.fixtures
    }

    pub fn starter_strategy(&self) -> StarterProbabilityStrategy {
        self.starter
    }

    /// Predict points for the player's next match.
    ///
    /// An explicit fixture wins over the player's stored difficulty when the
    /// player's team takes part in it; otherwise the stored rating is used,
    /// defaulting to neutral.
    pub fn predict(&self, player: &Player, fixture: Option<&Fixture>) -> Prediction {
        let ema = self
            .form
            .ema(&player.recent_points, player.season_average_points);

        let difficulty = resolve_difficulty(
            fixture
                .and_then(|f| f.difficulty_for(&player.team))
                .or(player.fixture_difficulty),
        );

        let fixture_adjusted = round_to(self.fixtures.adjust(ema, Some(difficulty)), 2);
        let probability = self.starter.probability(player);
        let predicted = round_to(fixture_adjusted * probability, 2);

        Prediction {
            player_id: player.id,
            predicted_points: predicted,
            confidence: confidence(&player.recent_points, player.status),
            ema_points: ema,
            fixture_adjusted_points: fixture_adjusted,
            starter_probability: probability,
            fixture_difficulty: difficulty,
        }
    }

    /// Predict every player, matching each to the earliest fixture its team
    /// plays in `fixtures`. Output order follows `players`.
    pub fn predict_many(&self, players: &[Player], fixtures: &[Fixture]) -> Vec<Prediction> {
        let mut by_team: HashMap<&str, &Fixture> = HashMap::new();
        for fx in fixtures {
            for team in [fx.team_home.as_str(), fx.team_away.as_str()] {
                by_team
                    .entry(team)
                    .and_modify(|current| {
                        if fx.gameweek < current.gameweek {
                            *current = fx;
                        }
                    })
                    .or_insert(fx);
            }
        }

        let predictions: Vec<Prediction> = players
            .iter()
            .map(|p| self.predict(p, by_team.get(p.team.as_str()).copied()))
            .collect();

        debug!(
            "predicted {} players against {} fixtures ({} teams scheduled)",
            predictions.len(),
            fixtures.len(),
            by_team.len()
        );
        predictions
    }
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}
