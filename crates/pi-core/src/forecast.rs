//! Category price forecasts.
//!
//! A forecast is a point estimate: a least-squares line through the
//! category's price index, projected `horizon_periods` ahead. Its reported
//! confidence is the fit quality capped by the category's confidence band,
//! so a forecast from a weak band can never claim more trust than that
//! band allows.

use pi_common::{Error, Result};
use pi_config::{ConfidenceConfig, ForecastConfig};
use pi_math::{linear_fit, safe_ratio, LineFit};
use serde::{Deserialize, Serialize};

use crate::model::PricePoint;
use crate::pricing::confidence::ConfidenceBand;

/// Projected direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Flat => write!(f, "flat"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub category: String,
    pub direction: Direction,
    /// Projected change from the last observed index, in percent.
    pub change_pct: f64,
    /// Reported confidence in [0, 100], capped by `band`.
    pub confidence: f64,
    /// Confidence from fit quality alone, before the band cap.
    pub fit_confidence: f64,
    pub band: ConfidenceBand,
    pub horizon_periods: u32,
    pub last_period: String,
    /// Fitted index `horizon_periods` past the last observation.
    pub projected_index: f64,
    pub fit: LineFit,
}

/// Confidence from fit quality: `100 * r² * (1 - 1/n)`.
pub fn fit_confidence(fit: &LineFit) -> f64 {
    let n = fit.n as f64;
    (100.0 * fit.r_squared * (1.0 - 1.0 / n)).clamp(0.0, 100.0)
}

/// Cap `fit_conf` at the band's ceiling.
///
/// Non-decreasing in `band` for any fixed `fit_conf`.
pub fn capped_confidence(fit_conf: f64, band: ConfidenceBand, cuts: &ConfidenceConfig) -> f64 {
    fit_conf.min(band.ceiling(cuts))
}

/// Project a category's price index.
///
/// Fewer than `min_points` points, or a series that cannot be fitted, is
/// `InsufficientHistory`.
pub fn forecast(
    category: &str,
    series: &[PricePoint],
    band: ConfidenceBand,
    cfg: &ForecastConfig,
    cuts: &ConfidenceConfig,
) -> Result<Forecast> {
    let insufficient = || Error::InsufficientHistory {
        category: category.to_string(),
        points: series.len(),
        required: cfg.min_points,
    };

    if series.len() < cfg.min_points {
        return Err(insufficient());
    }
    let values: Vec<f64> = series.iter().map(|p| p.index).collect();
    let fit = linear_fit(&values).ok_or_else(insufficient)?;
    let last = series.last().ok_or_else(insufficient)?;
    if last.index <= 0.0 {
        return Err(insufficient());
    }

    let horizon = f64::from(cfg.horizon_periods);
    let change_pct = safe_ratio(fit.slope * horizon, last.index)
        .map(|r| r * 100.0)
        .ok_or_else(insufficient)?;

    let direction = if change_pct.abs() < cfg.flat_band_pct {
        Direction::Flat
    } else if change_pct > 0.0 {
        Direction::Up
    } else {
        Direction::Down
    };

    let fit_conf = fit_confidence(&fit);
    Ok(Forecast {
        category: category.to_string(),
        direction,
        change_pct,
        confidence: capped_confidence(fit_conf, band, cuts),
        fit_confidence: fit_conf,
        band,
        horizon_periods: cfg.horizon_periods,
        last_period: last.period.clone(),
        projected_index: fit.predict((fit.n - 1) as f64 + horizon),
        fit,
    })
}
