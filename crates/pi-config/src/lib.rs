//! Price Intelligence engine configuration.
//!
//! This crate provides:
//! - Typed Rust structs for engine.json (thresholds, cut points, weights)
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation
//! - Config snapshots so reports can name the calibration that produced them

pub mod engine;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use engine::{
    AnomalyThresholds, BaselineConfig, ConfidenceConfig, EngineConfig, ForecastConfig,
    SavingsConfig, ValueScoreConfig,
};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
