//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::engine::{
    AnomalyThresholds, BaselineConfig, ConfidenceConfig, EngineConfig, ForecastConfig,
    SavingsConfig, ValueScoreConfig,
};

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn non_negative(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            field,
            format!("Must be finite and non-negative, got {}", value),
        ));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            field,
            format!("Must be finite and positive, got {}", value),
        ));
    }
    Ok(())
}

/// Validate an engine configuration semantically.
pub fn validate_config(config: &EngineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_anomaly(&config.anomaly)?;
    validate_confidence(&config.confidence)?;
    validate_savings(&config.savings)?;
    validate_value_score(&config.value_score)?;
    validate_baseline(&config.baseline)?;
    validate_forecast(&config.forecast)?;

    Ok(())
}

fn validate_anomaly(t: &AnomalyThresholds) -> ValidationResult<()> {
    non_negative("anomaly.info_pct", t.info_pct)?;
    non_negative("anomaly.warning_pct", t.warning_pct)?;
    non_negative("anomaly.critical_pct", t.critical_pct)?;

    if !(t.info_pct <= t.warning_pct && t.warning_pct <= t.critical_pct) {
        return Err(ValidationError::SemanticError(format!(
            "anomaly thresholds must satisfy info <= warning <= critical, got {} / {} / {}",
            t.info_pct, t.warning_pct, t.critical_pct
        )));
    }
    Ok(())
}

fn validate_confidence(c: &ConfidenceConfig) -> ValidationResult<()> {
    for (field, v) in [
        ("confidence.strong", c.strong),
        ("confidence.moderate", c.moderate),
        ("confidence.weak", c.weak),
    ] {
        if !v.is_finite() || v <= 0.0 || v > 100.0 {
            return Err(invalid(field, format!("Must be in (0, 100], got {}", v)));
        }
    }

    if !(c.strong > c.moderate && c.moderate > c.weak) {
        return Err(ValidationError::SemanticError(format!(
            "confidence cut points must be strictly descending, got {} / {} / {}",
            c.strong, c.moderate, c.weak
        )));
    }

    positive("confidence.count_scale", c.count_scale)?;
    positive("confidence.dispersion_scale", c.dispersion_scale)?;
    Ok(())
}

fn validate_savings(s: &SavingsConfig) -> ValidationResult<()> {
    non_negative("savings.materiality_threshold", s.materiality_threshold)
}

fn validate_value_score(v: &ValueScoreConfig) -> ValidationResult<()> {
    non_negative("value_score.price_weight", v.price_weight)?;
    non_negative("value_score.quality_weight", v.quality_weight)?;
    non_negative("value_score.schedule_weight", v.schedule_weight)?;
    non_negative("value_score.communication_weight", v.communication_weight)?;

    if v.weight_sum() <= 0.0 {
        return Err(invalid(
            "value_score",
            "weights must have positive sum",
        ));
    }

    positive("value_score.callback_penalty", v.callback_penalty)?;

    if !v.rating_min.is_finite() || !v.rating_max.is_finite() || v.rating_min >= v.rating_max {
        return Err(invalid(
            "value_score.rating_min",
            format!(
                "rating_min must be below rating_max, got {} >= {}",
                v.rating_min, v.rating_max
            ),
        ));
    }
    Ok(())
}

fn validate_baseline(b: &BaselineConfig) -> ValidationResult<()> {
    if b.window == 0 {
        return Err(invalid("baseline.window", "must be > 0"));
    }
    Ok(())
}

fn validate_forecast(f: &ForecastConfig) -> ValidationResult<()> {
    if f.horizon_periods == 0 {
        return Err(invalid("forecast.horizon_periods", "must be > 0"));
    }
    non_negative("forecast.flat_band_pct", f.flat_band_pct)?;
    if f.min_points < 2 {
        return Err(invalid(
            "forecast.min_points",
            format!("must be >= 2, got {}", f.min_points),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        validate_config(&EngineConfig::default()).unwrap();
    }

    #[test]
    fn test_thresholds_out_of_order() {
        let mut cfg = EngineConfig::default();
        cfg.anomaly.warning_pct = 30.0;
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::SemanticError(_))
        ));
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.anomaly.critical_pct = f64::NAN;
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_cut_points_must_descend() {
        let mut cfg = EngineConfig::default();
        cfg.confidence.moderate = 80.0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_zero_weights_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.value_score.price_weight = 0.0;
        cfg.value_score.quality_weight = 0.0;
        cfg.value_score.schedule_weight = 0.0;
        cfg.value_score.communication_weight = 0.0;
        let err = validate_config(&cfg).unwrap_err();
        assert_eq!(err.code(), 65);
    }

    #[test]
    fn test_rating_scale_inverted() {
        let mut cfg = EngineConfig::default();
        cfg.value_score.rating_min = 5.0;
        cfg.value_score.rating_max = 1.0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_zero_window_and_min_points() {
        let mut cfg = EngineConfig::default();
        cfg.baseline.window = 0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = EngineConfig::default();
        cfg.forecast.min_points = 1;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_version_mismatch() {
        let cfg = EngineConfig {
            schema_version: "0.9.0".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }
}
