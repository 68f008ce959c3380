// Transfer-market timing: price trend, buy timing and expected return.

use serde::Serialize;

use crate::player::Player;
use crate::stats::{round_to, slope};
use crate::valuation::value::ValueCalculator;

/// Prices inspected when judging trend and recent range.
const TREND_WINDOW: usize = 5;
/// Per-gameweek price slope (millions) that counts as movement.
const TREND_THRESHOLD: f64 = 0.05;
/// Longest holding period the forecast is trusted for.
const MAX_HOLDING_PERIOD: usize = 10;
/// Points per game treated as par when projecting resale price.
const PAR_POINTS_PER_GAME: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Rising,
    Falling,
    Stable,
    Unknown,
}

impl PriceTrend {
    /// Buy-side attractiveness: falling prices are the best time to buy.
    fn timing_score(&self) -> f64 {
        match self {
            PriceTrend::Falling => 1.0,
            PriceTrend::Stable => 0.7,
            PriceTrend::Rising => 0.3,
            PriceTrend::Unknown => 0.5,
        }
    }
}

/// Slope of the most recent prices, bucketed at +/-0.05 per gameweek.
pub fn price_trend(player: &Player) -> PriceTrend {
    let recent = player.latest_prices(TREND_WINDOW);
    if recent.len() < 2 {
        return PriceTrend::Unknown;
    }
    let s = slope(recent);
    if s > TREND_THRESHOLD {
        PriceTrend::Rising
    } else if s < -TREND_THRESHOLD {
        PriceTrend::Falling
    } else {
        PriceTrend::Stable
    }
}

/// Where the current price sits in the recent range; 1.0 at the low.
fn price_position_score(player: &Player) -> f64 {
    let recent = player.latest_prices(TREND_WINDOW);
    if recent.len() < TREND_WINDOW {
        return 0.5;
    }
    let high = recent.iter().copied().fold(f64::MIN, f64::max);
    let low = recent.iter().copied().fold(f64::MAX, f64::min);
    if high <= low {
        return 0.5;
    }
    let position = ((player.price - low) / (high - low)).clamp(0.0, 1.0);
    1.0 - position
}

impl ValueCalculator {
    /// Buy timing in [0, 1]: 0.4 trend + 0.3 range position + 0.3 fair/price.
    pub fn market_timing_score(&self, player: &Player) -> f64 {
        let trend = price_trend(player).timing_score();
        let position = price_position_score(player);
        let value = if player.price > 0.0 {
            (self.fair_value(player) / player.price).min(1.0)
        } else {
            0.5
        };
        round_to((0.4 * trend + 0.3 * position + 0.3 * value).clamp(0.0, 1.0), 3)
    }

    /// Expected return (percent) from buying at `purchase_price` and holding
    /// for `holding_period` gameweeks: resale movement plus points value.
    pub fn expected_roi(&self, player: &Player, purchase_price: f64, holding_period: usize) -> f64 {
        if purchase_price <= 0.0 || holding_period == 0 {
            return 0.0;
        }
        let expected = self
            .engine
            .expected_points_next_k(player, holding_period.min(MAX_HOLDING_PERIOD));
        let performance =
            (expected / (holding_period as f64 * PAR_POINTS_PER_GAME)).clamp(0.8, 1.3);
        let resale = purchase_price * performance;
        let points_value = expected * self.valuation.money_per_point;
        round_to((resale - purchase_price + points_value) / purchase_price * 100.0, 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Position;

    fn make_player(price: f64, history: Vec<f64>) -> Player {
        let mut p = Player::new(1, "P", "Sevilla", Position::Forward, price);
        p.price_history = history;
        p
    }

    #[test]
    fn trend_classification() {
        assert_eq!(price_trend(&make_player(5.0, vec![])), PriceTrend::Unknown);
        assert_eq!(price_trend(&make_player(5.0, vec![5.0])), PriceTrend::Unknown);
        assert_eq!(price_trend(&make_player(5.4, vec![5.0, 5.1, 5.2, 5.3, 5.4])), PriceTrend::Rising);
        assert_eq!(price_trend(&make_player(4.6, vec![5.0, 4.9, 4.8, 4.7, 4.6])), PriceTrend::Falling);
        assert_eq!(price_trend(&make_player(5.0, vec![5.0, 5.02, 5.0, 5.01])), PriceTrend::Stable);
    }

    #[test]
    fn trend_only_looks_at_latest_window() {
        // An old crash followed by five rising prices.
        let p = make_player(6.0, vec![12.0, 9.0, 5.6, 5.7, 5.8, 5.9, 6.0]);
        assert_eq!(price_trend(&p), PriceTrend::Rising);
    }

    #[test]
    fn falling_price_at_range_low_times_well() {
        let calc = ValueCalculator::default();
        let falling = make_player(4.6, vec![5.0, 4.9, 4.8, 4.7, 4.6]);
        let rising = make_player(5.4, vec![5.0, 5.1, 5.2, 5.3, 5.4]);
        let good = calc.market_timing_score(&falling);
        let bad = calc.market_timing_score(&rising);
        assert!(good > bad);
        assert!((0.0..=1.0).contains(&good));
    }

    #[test]
    fn roi_guards_degenerate_inputs() {
        let calc = ValueCalculator::default();
        let p = make_player(5.0, vec![]);
        assert_eq!(calc.expected_roi(&p, 0.0, 5), 0.0);
        assert_eq!(calc.expected_roi(&p, 5.0, 0), 0.0);
    }

    #[test]
    fn roi_rewards_high_scorers() {
        let calc = ValueCalculator::default();
        let mut star = make_player(8.0, vec![]);
        star.recent_points = vec![10.0; 6];
        star.season_average_points = 10.0;
        star.games_played = 6;
        star.minutes_played = 540;
        let bench = make_player(8.0, vec![]);
        assert!(calc.expected_roi(&star, 8.0, 5) > calc.expected_roi(&bench, 8.0, 5));
    }
}
