// Model configuration loading and validation (config/model.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::prediction::availability::StarterProbabilityStrategy;
use crate::recommend::SwapBudget;
use crate::valuation::risk::RiskWeightingStrategy;
use crate::valuation::value::{BidSizingStrategy, RiskTolerance};

pub const CONFIG_FILE: &str = "model.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// model.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelConfig {
    pub form: FormConfig,
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub fixtures: FixtureConfig,
    pub strategies: StrategyConfig,
    pub valuation: ValuationConfig,
    pub bids: BidConfig,
    pub recommendations: RecommendationConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormConfig {
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForecastConfig {
    pub horizon: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FixtureConfig {
    /// Opponent team name -> difficulty (1-5).
    #[serde(default)]
    pub ratings: HashMap<String, u8>,
}

/// Which of the parallel pipeline variants to run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StrategyConfig {
    pub starter_probability: StarterProbabilityStrategy,
    pub risk_weighting: RiskWeightingStrategy,
    pub bid_sizing: BidSizingStrategy,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValuationConfig {
    /// Millions per expected point.
    pub money_per_point: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Weight given to the current market price when blending fair value.
    pub market_efficiency: f64,
    pub discount_rate: f64,
    /// Gameweeks in a season, used to normalize discounting.
    pub season_length: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BidConfig {
    pub risk_tolerance: RiskTolerance,
    pub default_market_pressure: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationConfig {
    pub top_n: usize,
    pub max_swaps: usize,
    pub candidates_per_sell: usize,
    pub max_differentials: usize,
    pub differential_threshold: f64,
    pub swap_budget: SwapBudget,
}

impl Default for ModelConfig {
    /// Mirrors `defaults/model.toml`.
    fn default() -> Self {
        let ratings: HashMap<String, u8> = [
            ("Real Madrid", 5),
            ("Barcelona", 5),
            ("Atletico Madrid", 4),
            ("Athletic Bilbao", 4),
            ("Real Sociedad", 4),
            ("Real Betis", 3),
            ("Villarreal", 3),
            ("Valencia", 3),
            ("Sevilla", 3),
            ("Celta Vigo", 3),
            ("Osasuna", 3),
            ("Rayo Vallecano", 3),
            ("Las Palmas", 2),
            ("Getafe", 2),
            ("Girona", 2),
            ("Mallorca", 2),
            ("Leganes", 2),
            ("Valladolid", 2),
            ("Espanyol", 2),
            ("Alaves", 2),
        ]
        .into_iter()
        .map(|(team, rating)| (team.to_string(), rating))
        .collect();

        ModelConfig {
            form: FormConfig { alpha: 0.3 },
            forecast: ForecastConfig { horizon: 3 },
            fixtures: FixtureConfig { ratings },
            strategies: StrategyConfig {
                starter_probability: StarterProbabilityStrategy::Heuristic,
                risk_weighting: RiskWeightingStrategy::Component,
                bid_sizing: BidSizingStrategy::Conservative,
            },
            valuation: ValuationConfig {
                money_per_point: 0.5,
                min_price: 0.5,
                max_price: 15.0,
                market_efficiency: 0.8,
                discount_rate: 0.05,
                season_length: 38,
            },
            bids: BidConfig {
                risk_tolerance: RiskTolerance::Medium,
                default_market_pressure: 0.5,
            },
            recommendations: RecommendationConfig {
                top_n: 20,
                max_swaps: 10,
                candidates_per_sell: 3,
                max_differentials: 15,
                differential_threshold: 0.3,
                swap_budget: SwapBudget::PriceRatio(1.2),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/model.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for application startup.
pub fn load_config_from(base_dir: &Path) -> Result<ModelConfig, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text, &path)?;
    validate(&config)?;
    Ok(config)
}

fn parse_config(text: &str, path: &Path) -> Result<ModelConfig, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults
/// first if needed.
pub fn load_config() -> Result<ModelConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message,
    }
}

pub fn validate(config: &ModelConfig) -> Result<(), ConfigError> {
    let alpha = config.form.alpha;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(invalid(
            "form.alpha",
            format!("must be strictly between 0.0 and 1.0, got {alpha}"),
        ));
    }

    if config.forecast.horizon == 0 {
        return Err(invalid("forecast.horizon", "must be greater than 0".into()));
    }

    // Sorted so the reported team is deterministic.
    let mut ratings: Vec<(&String, &u8)> = config.fixtures.ratings.iter().collect();
    ratings.sort();
    for (team, &rating) in ratings {
        if !(1..=5).contains(&rating) {
            return Err(invalid(
                &format!("fixtures.ratings.{team}"),
                format!("must be between 1 and 5, got {rating}"),
            ));
        }
    }

    let v = &config.valuation;
    if v.min_price <= 0.0 {
        return Err(invalid(
            "valuation.min_price",
            format!("must be > 0, got {}", v.min_price),
        ));
    }
    if v.max_price <= v.min_price {
        return Err(invalid(
            "valuation.max_price",
            format!("must exceed min_price ({}), got {}", v.min_price, v.max_price),
        ));
    }
    if !(0.0..=1.0).contains(&v.market_efficiency) {
        return Err(invalid(
            "valuation.market_efficiency",
            format!("must be between 0.0 and 1.0 inclusive, got {}", v.market_efficiency),
        ));
    }
    if v.money_per_point <= 0.0 {
        return Err(invalid(
            "valuation.money_per_point",
            format!("must be > 0, got {}", v.money_per_point),
        ));
    }
    if v.discount_rate < 0.0 {
        return Err(invalid(
            "valuation.discount_rate",
            format!("must be >= 0, got {}", v.discount_rate),
        ));
    }
    if v.season_length == 0 {
        return Err(invalid("valuation.season_length", "must be greater than 0".into()));
    }

    let pressure = config.bids.default_market_pressure;
    if !(0.0..=1.0).contains(&pressure) {
        return Err(invalid(
            "bids.default_market_pressure",
            format!("must be between 0.0 and 1.0 inclusive, got {pressure}"),
        ));
    }

    let r = &config.recommendations;
    if r.top_n == 0 {
        return Err(invalid("recommendations.top_n", "must be greater than 0".into()));
    }
    if !(0.0..=1.0).contains(&r.differential_threshold) {
        return Err(invalid(
            "recommendations.differential_threshold",
            format!(
                "must be between 0.0 and 1.0 inclusive, got {}",
                r.differential_threshold
            ),
        ));
    }
    let budget_value = r.swap_budget.value();
    if budget_value < 0.0 || !budget_value.is_finite() {
        return Err(invalid(
            "recommendations.swap_budget.value",
            format!("must be a finite value >= 0, got {budget_value}"),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
