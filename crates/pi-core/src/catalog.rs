//! Price catalog operations on a single material.
//!
//! The catalog's only state transition is quote replacement: a new quote
//! for a vendor+material supersedes the old one. The superseded price
//! feeds the material's rolling baseline and the new quote records its
//! trend against it. Incoming prices are converted to the canonical unit
//! as part of the same transition, so a price is never stored against a
//! unit it was not quoted in.

use chrono::NaiveDate;
use pi_common::{EntityKind, Error, Result, VendorId};
use serde::{Deserialize, Serialize};

use crate::model::{Baseline, Material, VendorQuote};
use crate::normalize::to_canonical;
use crate::pricing::trend::Trend;

/// A quote about to enter the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingQuote {
    /// Price per `unit`.
    pub price: f64,
    pub unit: String,
    pub quoted_on: NaiveDate,
    pub lead_time_days: Option<u32>,
}

/// What a replacement changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteChange {
    pub previous: Option<f64>,
    /// Stored price, in the canonical unit.
    pub current: f64,
    pub trend: Trend,
    /// True when a conversion factor was applied to the quoted price.
    pub converted: bool,
}

impl Material {
    /// Replace `vendor`'s quote, recording trend and delta and folding the
    /// superseded price into the rolling baseline.
    ///
    /// The quoted price is converted to the canonical unit first. A unit
    /// with no registered factor is `UnknownUnit` and an invalid price is
    /// `InvalidQuote`; either way the material is left unchanged.
    ///
    /// The first quote from a vendor is `Stable` with no delta and leaves
    /// the baseline untouched.
    pub fn supersede_quote(
        &mut self,
        vendor: &VendorId,
        incoming: IncomingQuote,
        window: u32,
    ) -> Result<QuoteChange> {
        let price = to_canonical(self, incoming.price, &incoming.unit)?;
        validate_price(self.id.as_str(), vendor, price)?;
        let converted = incoming.unit.trim() != self.canonical_unit;

        let previous = self.quotes.get(vendor).map(|q| q.price);
        let trend = previous
            .map(|p| Trend::classify(p, price))
            .unwrap_or_default();

        if let Some(old) = previous {
            match self.baseline.as_mut() {
                Some(b) => b.fold(old, window),
                None => self.baseline = Some(Baseline::starting_at(old)),
            }
        }

        self.quotes.insert(
            vendor.clone(),
            VendorQuote {
                price,
                trend,
                price_delta: previous.map(|p| price - p),
                quoted_on: incoming.quoted_on,
                lead_time_days: incoming.lead_time_days,
            },
        );
        self.data_points = self.data_points.saturating_add(1);

        Ok(QuoteChange {
            previous,
            current: price,
            trend,
            converted,
        })
    }

    /// Current quote prices, in vendor id order.
    pub fn quote_prices(&self) -> Vec<f64> {
        self.quotes.values().map(|q| q.price).collect()
    }

    /// Check catalog invariants against the set of registered vendors.
    pub fn validate(&self, is_known_vendor: impl Fn(&VendorId) -> bool) -> Result<()> {
        if self.canonical_unit.trim().is_empty() {
            return Err(self.invalid("canonical unit is empty".to_string()));
        }
        for (unit, factor) in &self.conversions {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(self.invalid(format!(
                    "conversion factor for '{}' must be strictly positive, got {}",
                    unit, factor
                )));
            }
        }
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(self.invalid(format!(
                "confidence must be in [0, 100], got {}",
                self.confidence
            )));
        }
        for (vendor, quote) in &self.quotes {
            if !is_known_vendor(vendor) {
                return Err(Error::unknown(EntityKind::Vendor, vendor.as_str()));
            }
            validate_price(&self.id.to_string(), vendor, quote.price)?;
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidMaterial {
            material: self.id.to_string(),
            reason,
        }
    }
}

/// Quoted prices must be finite and non-negative.
pub fn validate_price(material: &str, vendor: &VendorId, price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidQuote {
            material: material.to_string(),
            vendor: vendor.to_string(),
            reason: format!("price must be finite and non-negative, got {}", price),
        });
    }
    Ok(())
}
