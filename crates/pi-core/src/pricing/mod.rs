//! Per-material pricing: best price, confidence and trend.

pub mod best_price;
pub mod confidence;
pub mod trend;

pub use best_price::{best_price, BestPrice};
pub use confidence::{band_for, compute_confidence, ConfidenceBand};
pub use trend::Trend;
