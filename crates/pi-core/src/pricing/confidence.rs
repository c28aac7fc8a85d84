//! Confidence scoring and banding.
//!
//! A material's confidence score (0-100) combines how many observations
//! back it with how tightly its current quotes cluster. The band is a pure
//! function of the score against three cut points applied as closed lower
//! bounds: a score exactly on a cut point belongs to the higher band.

use pi_common::{Error, MaterialId, Result};
use pi_config::ConfidenceConfig;
use pi_math::coefficient_of_variation;
use serde::{Deserialize, Serialize};

/// Four-level reliability label. Ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
}

impl ConfidenceBand {
    /// Band under the default 80/50/25 cut points.
    pub fn from_score(score: f64) -> Self {
        band_for(score, &ConfidenceConfig::default())
    }

    /// Highest forecast confidence a projection from this band may report.
    ///
    /// The ceiling of a band is the cut point of the band above it, so a
    /// forecast never claims more trust than the next band up.
    pub fn ceiling(&self, cuts: &ConfidenceConfig) -> f64 {
        match self {
            ConfidenceBand::VeryWeak => cuts.weak,
            ConfidenceBand::Weak => cuts.moderate,
            ConfidenceBand::Moderate => cuts.strong,
            ConfidenceBand::Strong => 100.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceBand::VeryWeak => "Very Weak",
            ConfidenceBand::Weak => "Weak",
            ConfidenceBand::Moderate => "Moderate",
            ConfidenceBand::Strong => "Strong",
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map a score to its band. Total: NaN maps to `VeryWeak`.
pub fn band_for(score: f64, cuts: &ConfidenceConfig) -> ConfidenceBand {
    if score >= cuts.strong {
        ConfidenceBand::Strong
    } else if score >= cuts.moderate {
        ConfidenceBand::Moderate
    } else if score >= cuts.weak {
        ConfidenceBand::Weak
    } else {
        ConfidenceBand::VeryWeak
    }
}

/// Derive a confidence score from current quote prices and the number of
/// observations behind them.
///
/// `score = 100 * (1 - e^(-n / count_scale)) / (1 + cv / dispersion_scale)`
///
/// Non-decreasing in `data_points`, non-increasing in the coefficient of
/// variation of `prices`. `data_points` is floored at the number of quotes.
pub fn compute_confidence(
    material: &MaterialId,
    prices: &[f64],
    data_points: u32,
    cfg: &ConfidenceConfig,
) -> Result<f64> {
    if prices.is_empty() {
        return Err(Error::NoQuotesAvailable {
            material: material.to_string(),
        });
    }
    let n = f64::from(data_points).max(prices.len() as f64);
    let count_credit = 1.0 - (-n / cfg.count_scale).exp();

    // All-zero quotes have no defined CV; they agree perfectly.
    let cv = coefficient_of_variation(prices).unwrap_or(0.0);
    let dispersion_credit = 1.0 / (1.0 + cv / cfg.dispersion_scale);

    Ok((100.0 * count_credit * dispersion_credit).clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_scenarios() {
        assert_eq!(ConfidenceBand::from_score(96.0), ConfidenceBand::Strong);
        assert_eq!(ConfidenceBand::from_score(50.0), ConfidenceBand::Moderate);
        assert_eq!(ConfidenceBand::from_score(24.0), ConfidenceBand::VeryWeak);
    }

    #[test]
    fn boundaries_belong_to_higher_band() {
        assert_eq!(ConfidenceBand::from_score(80.0), ConfidenceBand::Strong);
        assert_eq!(ConfidenceBand::from_score(79.999), ConfidenceBand::Moderate);
        assert_eq!(ConfidenceBand::from_score(25.0), ConfidenceBand::Weak);
        assert_eq!(ConfidenceBand::from_score(f64::NAN), ConfidenceBand::VeryWeak);
    }

    #[test]
    fn custom_cut_points() {
        let cuts = ConfidenceConfig {
            strong: 90.0,
            moderate: 60.0,
            weak: 30.0,
            ..ConfidenceConfig::default()
        };
        assert_eq!(band_for(85.0, &cuts), ConfidenceBand::Moderate);
        assert_eq!(band_for(30.0, &cuts), ConfidenceBand::Weak);
    }

    #[test]
    fn display_labels() {
        assert_eq!(ConfidenceBand::VeryWeak.to_string(), "Very Weak");
        assert_eq!(ConfidenceBand::Strong.to_string(), "Strong");
    }

    #[test]
    fn ceiling_is_next_cut_point() {
        let cuts = ConfidenceConfig::default();
        assert_eq!(ConfidenceBand::VeryWeak.ceiling(&cuts), 25.0);
        assert_eq!(ConfidenceBand::Weak.ceiling(&cuts), 50.0);
        assert_eq!(ConfidenceBand::Moderate.ceiling(&cuts), 80.0);
        assert_eq!(ConfidenceBand::Strong.ceiling(&cuts), 100.0);
    }

    #[test]
    fn more_points_raise_confidence() {
        let cfg = ConfidenceConfig::default();
        let id = MaterialId::new("M1");
        let prices = [3.85, 4.12, 3.98];
        let few = compute_confidence(&id, &prices, 3, &cfg).unwrap();
        let many = compute_confidence(&id, &prices, 30, &cfg).unwrap();
        assert!(many > few);
    }

    #[test]
    fn wider_spread_lowers_confidence() {
        let cfg = ConfidenceConfig::default();
        let id = MaterialId::new("M1");
        let tight = compute_confidence(&id, &[4.0, 4.02, 3.98], 12, &cfg).unwrap();
        let wide = compute_confidence(&id, &[2.0, 4.0, 6.0], 12, &cfg).unwrap();
        assert!(tight > wide);
    }

    #[test]
    fn identical_quotes_with_many_points_are_strong() {
        let cfg = ConfidenceConfig::default();
        let score =
            compute_confidence(&MaterialId::new("M1"), &[5.0, 5.0, 5.0], 40, &cfg).unwrap();
        assert_eq!(band_for(score, &cfg), ConfidenceBand::Strong);
    }

    #[test]
    fn no_quotes_is_explicit() {
        let err = compute_confidence(&MaterialId::new("M1"), &[], 10, &ConfidenceConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoQuotesAvailable { .. }));
    }
}
