// Library root: prediction, valuation and recommendation for fantasy
// football squads. Pure computation over caller-supplied snapshots.

pub mod config;
pub mod player;
pub mod prediction;
pub mod recommend;
pub mod stats;
pub mod valuation;
