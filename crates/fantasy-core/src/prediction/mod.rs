pub mod availability;
pub mod confidence;
pub mod engine;
pub mod fixture;
pub mod forecast;
pub mod form;

pub use engine::{Prediction, PredictionEngine};
