//! Labor value scoring and ranking.
//!
//! The value score (0-100) blends four normalized components with
//! configured weights, then divides by a callback penalty:
//!
//! ```text
//! price     = (max_price - price) / (max_price - min_price)   (1.0 if all equal)
//! rating_i  = (r_i - rating_min) / (rating_max - rating_min)  clamped to [0, 1]
//! weighted  = Σ w_i * component_i / Σ w_i
//! score     = 100 * weighted / (1 + callback_penalty * callbacks)
//! ```
//!
//! Price is scored relative to the observed range of the same trade, so a
//! score is only comparable within a trade.

use pi_common::SubcontractorId;
use pi_config::ValueScoreConfig;
use pi_math::min_max;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::{Availability, LaborSubcontractor};

/// Observed price range across a trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn of(prices: &[f64]) -> Option<Self> {
        min_max(prices).map(|(min, max)| PriceRange { min, max })
    }

    /// 1.0 for the cheapest bid, 0.0 for the most expensive.
    pub fn competitiveness(&self, price: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 1.0;
        }
        ((self.max - price) / span).clamp(0.0, 1.0)
    }
}

/// Inputs to the value score for one bid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BidInputs {
    pub price: f64,
    pub quality: f64,
    pub schedule: f64,
    pub communication: f64,
    pub callbacks: u32,
}

impl From<&LaborSubcontractor> for BidInputs {
    fn from(s: &LaborSubcontractor) -> Self {
        BidInputs {
            price: s.price_per_unit_area,
            quality: s.quality,
            schedule: s.schedule,
            communication: s.communication,
            callbacks: s.callbacks,
        }
    }
}

fn normalize_rating(r: f64, cfg: &ValueScoreConfig) -> f64 {
    let span = cfg.rating_max - cfg.rating_min;
    if span <= 0.0 || !r.is_finite() {
        return 0.0;
    }
    ((r - cfg.rating_min) / span).clamp(0.0, 1.0)
}

/// Composite value score for one bid against its trade's price range.
///
/// Raising any rating never lowers the score; adding a callback never
/// raises it.
pub fn value_score(bid: &BidInputs, range: PriceRange, cfg: &ValueScoreConfig) -> f64 {
    let weight_sum = cfg.weight_sum();
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let weighted = cfg.price_weight * range.competitiveness(bid.price)
        + cfg.quality_weight * normalize_rating(bid.quality, cfg)
        + cfg.schedule_weight * normalize_rating(bid.schedule, cfg)
        + cfg.communication_weight * normalize_rating(bid.communication, cfg);
    let callback_factor = 1.0 / (1.0 + cfg.callback_penalty * f64::from(bid.callbacks));
    100.0 * (weighted / weight_sum) * callback_factor
}

/// A subcontractor with its computed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSubcontractor {
    pub rank: usize,
    pub id: SubcontractorId,
    pub name: String,
    pub trade: String,
    pub price_per_unit_area: f64,
    pub value_score: f64,
    pub jobs_completed: u32,
    pub callbacks: u32,
    pub availability: Availability,
}

/// Score and rank every subcontractor bidding on `trade`.
///
/// Ordered by score descending; exact ties go to the subcontractor with
/// more completed jobs, then by id for a stable order.
pub fn rank_trade(
    subs: &[LaborSubcontractor],
    trade: &str,
    cfg: &ValueScoreConfig,
) -> Vec<RankedSubcontractor> {
    let peers: Vec<&LaborSubcontractor> = subs.iter().filter(|s| s.trade == trade).collect();
    let prices: Vec<f64> = peers.iter().map(|s| s.price_per_unit_area).collect();
    let Some(range) = PriceRange::of(&prices) else {
        return Vec::new();
    };

    let mut ranked: Vec<RankedSubcontractor> = peers
        .into_iter()
        .map(|s| RankedSubcontractor {
            rank: 0,
            id: s.id.clone(),
            name: s.name.clone(),
            trade: s.trade.clone(),
            price_per_unit_area: s.price_per_unit_area,
            value_score: value_score(&BidInputs::from(s), range, cfg),
            jobs_completed: s.jobs_completed,
            callbacks: s.callbacks,
            availability: s.availability,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.value_score
            .partial_cmp(&a.value_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.jobs_completed.cmp(&a.jobs_completed))
            .then_with(|| a.id.cmp(&b.id))
    });
    for (i, r) in ranked.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    ranked
}

/// Distinct trades, sorted.
pub fn trades(subs: &[LaborSubcontractor]) -> Vec<String> {
    let mut t: Vec<String> = subs.iter().map(|s| s.trade.clone()).collect();
    t.sort();
    t.dedup();
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sub(id: &str, price: f64, q: f64, s: f64, c: f64, callbacks: u32, jobs: u32) -> LaborSubcontractor {
        LaborSubcontractor {
            id: SubcontractorId::new(id),
            name: id.to_string(),
            trade: "drywall".into(),
            price_per_unit_area: price,
            quality: q,
            schedule: s,
            communication: c,
            callbacks,
            jobs_completed: jobs,
            value_score: None,
            availability: Availability::Available,
            last_quoted_on: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        }
    }

    #[test]
    fn cheapest_best_rated_scores_100() {
        let cfg = ValueScoreConfig::default();
        let range = PriceRange { min: 1.0, max: 2.0 };
        let bid = BidInputs {
            price: 1.0,
            quality: 5.0,
            schedule: 5.0,
            communication: 5.0,
            callbacks: 0,
        };
        assert!((value_score(&bid, range, &cfg) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn callbacks_never_help() {
        let cfg = ValueScoreConfig::default();
        let range = PriceRange { min: 1.0, max: 2.0 };
        let mut bid = BidInputs {
            price: 1.4,
            quality: 4.0,
            schedule: 3.5,
            communication: 4.5,
            callbacks: 0,
        };
        let clean = value_score(&bid, range, &cfg);
        bid.callbacks = 2;
        let two = value_score(&bid, range, &cfg);
        bid.callbacks = 3;
        let three = value_score(&bid, range, &cfg);
        assert!(clean > two);
        assert!(two > three);
    }

    #[test]
    fn better_rating_never_hurts() {
        let cfg = ValueScoreConfig::default();
        let range = PriceRange { min: 1.0, max: 2.0 };
        let base = BidInputs {
            price: 1.5,
            quality: 3.0,
            schedule: 3.0,
            communication: 3.0,
            callbacks: 1,
        };
        let better = BidInputs {
            schedule: 4.0,
            ..base
        };
        assert!(value_score(&better, range, &cfg) >= value_score(&base, range, &cfg));
    }

    #[test]
    fn equal_prices_score_full_price_credit() {
        let range = PriceRange { min: 2.0, max: 2.0 };
        assert_eq!(range.competitiveness(2.0), 1.0);
    }

    #[test]
    fn rank_orders_by_score_then_jobs() {
        let cfg = ValueScoreConfig::default();
        let subs = vec![
            sub("S-low", 2.10, 3.0, 3.0, 3.0, 2, 10),
            sub("S-tie-few", 1.80, 4.5, 4.0, 4.0, 0, 12),
            sub("S-tie-many", 1.80, 4.5, 4.0, 4.0, 0, 40),
            sub("S-top", 1.60, 4.8, 4.7, 4.5, 0, 5),
        ];
        let ranked = rank_trade(&subs, "drywall", &cfg);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["S-top", "S-tie-many", "S-tie-few", "S-low"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
    }

    #[test]
    fn unknown_trade_ranks_nothing() {
        let subs = vec![sub("S1", 2.0, 4.0, 4.0, 4.0, 0, 1)];
        assert!(rank_trade(&subs, "roofing", &ValueScoreConfig::default()).is_empty());
        assert_eq!(trades(&subs), ["drywall"]);
    }
}
