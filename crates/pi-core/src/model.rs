//! Catalog data model.
//!
//! Everything here is plain data with serde derives: the dataset loader
//! deserializes it, the store clones it out to readers, and the CLI
//! serializes it back into reports.

use chrono::NaiveDate;
use pi_common::{JobId, MaterialId, SubcontractorId, VendorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pricing::trend::Trend;

/// A supplier that quotes material prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    /// Short label for compact rendering (table headers, chips).
    pub short_label: String,
}

/// A vendor's current price for one material, in the material's canonical unit.
///
/// Never mutated once recorded; a newer quote replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorQuote {
    pub price: f64,
    pub trend: Trend,
    /// Change from the superseded quote, if there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_delta: Option<f64>,
    pub quoted_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,
}

/// Rolling average of superseded prices for one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub average: f64,
    /// Observations folded in, capped at the configured window.
    pub samples: u32,
}

impl Baseline {
    /// Fold one observation into a bounded running mean.
    ///
    /// Once `samples` reaches `window` each new observation carries weight
    /// `1/window`, approximating a moving average over the last `window`
    /// observations without storing them.
    pub fn fold(&mut self, observation: f64, window: u32) {
        let n = (self.samples + 1).min(window.max(1));
        self.average += (observation - self.average) / f64::from(n);
        self.samples = n;
    }

    /// Start a baseline from a single observation.
    pub fn starting_at(observation: f64) -> Self {
        Baseline {
            average: observation,
            samples: 1,
        }
    }
}

/// A priced material (or priced line item) in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub category: String,
    pub canonical_unit: String,

    /// Alternate unit → multiplier applied to a canonical-unit price.
    #[serde(default)]
    pub conversions: BTreeMap<String, f64>,

    #[serde(default)]
    pub quotes: BTreeMap<VendorId, VendorQuote>,

    /// Reliability score in [0, 100].
    #[serde(default)]
    pub confidence: f64,

    /// Observations backing `confidence`.
    #[serde(default)]
    pub data_points: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
}

/// Booking state of a subcontractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Limited,
    Booked,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Available => write!(f, "available"),
            Availability::Limited => write!(f, "limited"),
            Availability::Booked => write!(f, "booked"),
        }
    }
}

/// A labor subcontractor bidding on one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborSubcontractor {
    pub id: SubcontractorId,
    pub name: String,
    pub trade: String,
    pub price_per_unit_area: f64,
    pub quality: f64,
    pub schedule: f64,
    pub communication: f64,
    #[serde(default)]
    pub callbacks: u32,
    #[serde(default)]
    pub jobs_completed: u32,
    /// Last computed value score; recomputed by the ranking pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_score: Option<f64>,
    #[serde(default)]
    pub availability: Availability,
    pub last_quoted_on: NaiveDate,
}

/// A reconciled purchase: what was paid versus the best catalog price at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub job: JobId,
    pub category: String,
    pub actual: f64,
    pub optimal: f64,
    pub vendor: VendorId,
    pub ordered_on: NaiveDate,
}

impl SavingsRecord {
    /// `actual - optimal`.
    pub fn savings(&self) -> f64 {
        self.actual - self.optimal
    }
}

/// One period of a category price index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub period: String,
    pub index: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_fold_is_running_mean_until_window() {
        let mut b = Baseline::starting_at(4.0);
        b.fold(5.0, 12);
        b.fold(6.0, 12);
        assert_eq!(b.samples, 3);
        assert!((b.average - 5.0).abs() < 1e-12);
    }

    #[test]
    fn baseline_fold_caps_samples_at_window() {
        let mut b = Baseline::starting_at(10.0);
        for _ in 0..10 {
            b.fold(10.0, 3);
        }
        assert_eq!(b.samples, 3);
        b.fold(13.0, 3);
        assert!((b.average - 11.0).abs() < 1e-12);
    }

    #[test]
    fn savings_is_actual_minus_optimal() {
        let r = SavingsRecord {
            job: JobId::new("J1"),
            category: "lumber".into(),
            actual: 1200.0,
            optimal: 950.0,
            vendor: VendorId::new("V1"),
            ordered_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        };
        assert_eq!(r.savings(), 250.0);
    }

    #[test]
    fn material_deserializes_with_defaults() {
        let json = r#"{
            "id": "MAT-1", "name": "2x4 SPF", "category": "lumber",
            "canonical_unit": "lf"
        }"#;
        let m: Material = serde_json::from_str(json).unwrap();
        assert!(m.quotes.is_empty());
        assert!(m.conversions.is_empty());
        assert_eq!(m.data_points, 0);
        assert!(m.baseline.is_none());
    }
}
