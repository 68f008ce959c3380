// Valuation: risk, value/fair price/bids, and market timing.

pub mod market;
pub mod risk;
pub mod value;

pub use risk::{RiskBreakdown, RiskScorer};
pub use value::{BidRange, ValueAnalysis, ValueCalculator};
