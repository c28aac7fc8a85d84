//! Best-price selection.
//!
//! Ties on the minimum price go to the vendor registered first with the
//! catalog. Callers pass the registration order explicitly so the result
//! does not depend on map iteration order.

use pi_common::VendorId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::VendorQuote;

/// Lowest quote for a material, in its canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPrice {
    pub vendor: VendorId,
    pub price: f64,
}

/// Select the lowest-priced quote.
///
/// Quotes are visited in `registration_order`; any quote from a vendor
/// missing from that order is visited afterwards in id order. A later quote
/// only wins if strictly cheaper, so the earliest-registered vendor keeps
/// an exact tie. Returns None when there are no quotes.
pub fn best_price(
    quotes: &BTreeMap<VendorId, VendorQuote>,
    registration_order: &[VendorId],
) -> Option<BestPrice> {
    let ordered = registration_order
        .iter()
        .filter_map(|v| quotes.get_key_value(v))
        .chain(
            quotes
                .iter()
                .filter(|(v, _)| !registration_order.contains(*v)),
        );

    let mut best: Option<BestPrice> = None;
    for (vendor, quote) in ordered {
        let cheaper = match &best {
            Some(b) => quote.price < b.price,
            None => true,
        };
        if cheaper {
            best = Some(BestPrice {
                vendor: vendor.clone(),
                price: quote.price,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::trend::Trend;
    use chrono::NaiveDate;

    fn quote(price: f64) -> VendorQuote {
        VendorQuote {
            price,
            trend: Trend::Stable,
            price_delta: None,
            quoted_on: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            lead_time_days: None,
        }
    }

    fn quotes(entries: &[(&str, f64)]) -> BTreeMap<VendorId, VendorQuote> {
        entries
            .iter()
            .map(|(v, p)| (VendorId::new(*v), quote(*p)))
            .collect()
    }

    fn order(ids: &[&str]) -> Vec<VendorId> {
        ids.iter().map(|v| VendorId::new(*v)).collect()
    }

    #[test]
    fn picks_minimum() {
        let q = quotes(&[("A", 3.85), ("B", 4.12), ("C", 3.98)]);
        let best = best_price(&q, &order(&["A", "B", "C"])).unwrap();
        assert_eq!(best.vendor.as_str(), "A");
        assert_eq!(best.price, 3.85);
    }

    #[test]
    fn tie_goes_to_first_registered() {
        let q = quotes(&[("A", 4.00), ("B", 3.50), ("C", 3.50)]);
        let best = best_price(&q, &order(&["C", "A", "B"])).unwrap();
        assert_eq!(best.vendor.as_str(), "C");

        let best = best_price(&q, &order(&["A", "B", "C"])).unwrap();
        assert_eq!(best.vendor.as_str(), "B");
    }

    #[test]
    fn unordered_vendors_still_considered() {
        let q = quotes(&[("A", 4.00), ("Z", 1.00)]);
        let best = best_price(&q, &order(&["A"])).unwrap();
        assert_eq!(best.vendor.as_str(), "Z");
    }

    #[test]
    fn empty_is_no_recommendation() {
        let q = BTreeMap::new();
        assert!(best_price(&q, &order(&["A"])).is_none());
    }
}
