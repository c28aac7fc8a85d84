//! Price Intelligence Core Library
//!
//! This library provides the price intelligence engine:
//! - Quote catalog with supersession and rolling baselines
//! - Unit normalization, best-price selection and confidence banding
//! - Anomaly detection over material and labor lines
//! - Labor value scoring, savings aggregation and category forecasts
//! - Quote ingestion, dataset loading and the query facade
//!
//! The binary entry point is in `main.rs`.

pub mod anomaly;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod exit_codes;
pub mod forecast;
pub mod ingest;
pub mod labor;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pricing;
pub mod query;
pub mod savings;
pub mod store;

pub use query::PriceIntel;
pub use store::{InMemoryStore, PriceStore};
