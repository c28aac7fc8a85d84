//! Engine configuration types.
//!
//! Every tunable the engine uses lives here. The shipped values are
//! hand-tuned starting points, not calibrated business rules, so each
//! section deserializes with defaults and a partial engine.json only
//! overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::validate::{ValidationError, ValidationResult};

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub anomaly: AnomalyThresholds,

    #[serde(default)]
    pub confidence: ConfidenceConfig,

    #[serde(default)]
    pub savings: SavingsConfig,

    #[serde(default)]
    pub value_score: ValueScoreConfig,

    #[serde(default)]
    pub baseline: BaselineConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            schema_version: default_schema_version(),
            description: None,
            anomaly: AnomalyThresholds::default(),
            confidence: ConfidenceConfig::default(),
            savings: SavingsConfig::default(),
            value_score: ValueScoreConfig::default(),
            baseline: BaselineConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Canonical JSON of this config, used for hashing defaults.
    pub fn to_canonical_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Deviation thresholds (percent) for anomaly severities.
///
/// Applied as closed lower bounds on the absolute deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// Noise floor: deviations below this are not reported at all.
    pub info_pct: f64,
    pub warning_pct: f64,
    pub critical_pct: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            info_pct: 5.0,
            warning_pct: 12.0,
            critical_pct: 25.0,
        }
    }
}

/// Confidence band cut points and confidence-score shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub strong: f64,
    pub moderate: f64,
    pub weak: f64,

    /// Data points at which count credit reaches ~63%.
    pub count_scale: f64,

    /// Coefficient of variation at which dispersion credit halves.
    pub dispersion_scale: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            strong: 80.0,
            moderate: 50.0,
            weak: 25.0,
            count_scale: 6.0,
            dispersion_scale: 0.15,
        }
    }
}

/// Savings classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavingsConfig {
    /// Per-record savings above this amount count as missed.
    pub materiality_threshold: f64,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            materiality_threshold: 250.0,
        }
    }
}

/// Labor value score weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueScoreConfig {
    pub price_weight: f64,
    pub quality_weight: f64,
    pub schedule_weight: f64,
    pub communication_weight: f64,

    /// Each callback divides the score by `1 + callback_penalty * callbacks`.
    pub callback_penalty: f64,

    pub rating_min: f64,
    pub rating_max: f64,
}

impl Default for ValueScoreConfig {
    fn default() -> Self {
        Self {
            price_weight: 0.35,
            quality_weight: 0.30,
            schedule_weight: 0.20,
            communication_weight: 0.15,
            callback_penalty: 0.08,
            rating_min: 1.0,
            rating_max: 5.0,
        }
    }
}

impl ValueScoreConfig {
    pub fn weight_sum(&self) -> f64 {
        self.price_weight + self.quality_weight + self.schedule_weight + self.communication_weight
    }
}

/// Rolling-average baseline used for anomaly comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Number of superseded quotes the running mean approximates.
    pub window: u32,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self { window: 12 }
    }
}

/// Category forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizon_periods: u32,

    /// Projected changes with magnitude below this are reported as flat.
    pub flat_band_pct: f64,

    pub min_points: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_periods: 3,
            flat_band_pct: 0.5,
            min_points: 3,
        }
    }
}
