//! Unit normalization.
//!
//! Prices are stored per canonical unit. A material may register alternate
//! units with a positive multiplier: `price_in_unit = canonical * factor`.
//! No rounding happens here; rounding is a display concern.

use pi_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::model::Material;

/// A price expressed in a requested unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub price: f64,
    pub unit: String,
    /// True when a conversion factor was applied.
    pub converted: bool,
}

/// Express a canonical-unit price in `unit`.
///
/// The canonical unit returns the price unchanged with `converted = false`.
/// A unit the material does not know is `UnknownUnit`, which callers treat
/// as "no conversion" rather than a batch failure.
pub fn normalize(material: &Material, canonical_price: f64, unit: &str) -> Result<Normalized> {
    let unit = unit.trim();
    if unit == material.canonical_unit {
        return Ok(Normalized {
            price: canonical_price,
            unit: material.canonical_unit.clone(),
            converted: false,
        });
    }
    match material.conversions.get(unit) {
        Some(factor) => Ok(Normalized {
            price: canonical_price * factor,
            unit: unit.to_string(),
            converted: true,
        }),
        None => Err(Error::UnknownUnit {
            material: material.id.to_string(),
            unit: unit.to_string(),
        }),
    }
}

/// Convert a price quoted in `unit` back to the canonical unit.
pub fn to_canonical(material: &Material, price: f64, unit: &str) -> Result<f64> {
    let unit = unit.trim();
    if unit == material.canonical_unit {
        return Ok(price);
    }
    match material.conversions.get(unit) {
        Some(factor) => Ok(price / factor),
        None => Err(Error::UnknownUnit {
            material: material.id.to_string(),
            unit: unit.to_string(),
        }),
    }
}
