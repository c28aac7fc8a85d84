//! Read-side query facade over a [`PriceStore`].
//!
//! [`PriceIntel`] bundles a store with the effective engine configuration
//! and answers every dashboard query. Listing queries never fail for lack
//! of data: a material without quotes has `best: None` and `band: None`, a
//! line without a baseline is listed as not evaluated. Single-value queries
//! that cannot be answered return an explicit "insufficient data" error
//! such as `NoQuotesAvailable`.

use chrono::{NaiveDate, Utc};
use pi_common::{EntityKind, Error, JobId, MaterialId, Result, VendorId};
use pi_config::EngineConfig;
use pi_math::mean;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::anomaly::{detect_all, AnomalyPass, Severity};
use crate::forecast::{forecast, Forecast};
use crate::ingest::{ingest, IngestReport, QuoteRecord};
use crate::labor::{self, RankedSubcontractor};
use crate::logging::event_names;
use crate::model::{Material, Vendor};
use crate::normalize::normalize;
use crate::pricing::{band_for, best_price, compute_confidence, BestPrice, ConfidenceBand, Trend};
use crate::savings::{self, DateWindow, SavingsSummary};
use crate::store::PriceStore;

/// One vendor's quote as shown next to its peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteView {
    pub vendor: VendorId,
    pub vendor_name: String,
    pub short_label: String,
    /// Price in the view's display unit.
    pub price: f64,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_delta: Option<f64>,
    pub quoted_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,
    pub is_best: bool,
}

/// A material with every vendor quote and the recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialView {
    pub id: MaterialId,
    pub name: String,
    pub category: String,
    pub canonical_unit: String,
    /// Unit the prices below are expressed in.
    pub unit: String,
    /// True when prices were converted from the canonical unit.
    pub converted: bool,
    /// Set when a requested unit had no conversion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_note: Option<String>,
    /// In vendor registration order.
    pub quotes: Vec<QuoteView>,
    /// None when the material has no quotes.
    pub best: Option<BestPrice>,
    pub confidence: f64,
    pub data_points: u32,
    /// None when the material has no quotes.
    pub band: Option<ConfidenceBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_average: Option<f64>,
}

/// Compact row for category listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialListing {
    pub id: MaterialId,
    pub name: String,
    pub category: String,
    pub canonical_unit: String,
    pub quote_count: usize,
    pub best: Option<BestPrice>,
    pub confidence: f64,
    pub band: Option<ConfidenceBand>,
}

/// Outcome of a catalog-wide confidence recompute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecomputeReport {
    pub updated: usize,
    /// Materials left untouched because they have no quotes.
    pub skipped: Vec<MaterialId>,
}

/// Catalog size counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub vendors: usize,
    pub materials: usize,
    pub quotes: usize,
    pub materials_without_quotes: usize,
    pub subcontractors: usize,
    pub savings_records: usize,
    pub categories: usize,
}

/// Query facade.
pub struct PriceIntel<S: PriceStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: PriceStore> PriceIntel<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn band(&self, score: f64) -> ConfidenceBand {
        band_for(score, &self.config.confidence)
    }

    /// Band of a material's stored score; None without quotes to back it.
    fn material_band(&self, material: &Material) -> Option<ConfidenceBand> {
        (!material.quotes.is_empty()).then(|| self.band(material.confidence))
    }

    fn require_material(&self, id: &MaterialId) -> Result<Material> {
        self.store
            .material(id)
            .ok_or_else(|| Error::unknown(EntityKind::Material, id.as_str()))
    }

    /// A material with all its quotes and best price.
    ///
    /// With `unit`, prices are expressed in that unit. A unit the material
    /// cannot convert falls back to the canonical unit and sets `unit_note`.
    pub fn material_view(&self, id: &MaterialId, unit: Option<&str>) -> Result<MaterialView> {
        let material = self.require_material(id)?;
        let vendors = self.store.vendors();
        let order: Vec<VendorId> = vendors.iter().map(|v| v.id.clone()).collect();

        let (display_unit, factor, unit_note) = match unit {
            None => (material.canonical_unit.clone(), None, None),
            Some(u) => match normalize(&material, 1.0, u) {
                Ok(n) if n.converted => (n.unit, Some(n.price), None),
                Ok(n) => (n.unit, None, None),
                Err(e) => {
                    debug!(material = %material.id, unit = u, "no conversion for requested unit");
                    (
                        material.canonical_unit.clone(),
                        None,
                        Some(format!("{}; prices shown per {}", e, material.canonical_unit)),
                    )
                }
            },
        };
        let scale = |p: f64| factor.map_or(p, |f| p * f);

        // Conversion factors are positive, so the canonical winner stays the winner.
        let best = best_price(&material.quotes, &order).map(|b| BestPrice {
            vendor: b.vendor,
            price: scale(b.price),
        });

        let quotes = ordered_quotes(&material, &vendors)
            .into_iter()
            .map(|(vendor, quote)| QuoteView {
                is_best: best.as_ref().is_some_and(|b| b.vendor == vendor.id),
                vendor: vendor.id.clone(),
                vendor_name: vendor.name.clone(),
                short_label: vendor.short_label.clone(),
                price: scale(quote.price),
                trend: quote.trend,
                price_delta: quote.price_delta.map(scale),
                quoted_on: quote.quoted_on,
                lead_time_days: quote.lead_time_days,
            })
            .collect();

        Ok(MaterialView {
            id: material.id.clone(),
            name: material.name.clone(),
            category: material.category.clone(),
            canonical_unit: material.canonical_unit.clone(),
            unit: display_unit,
            converted: factor.is_some(),
            unit_note,
            quotes,
            best,
            confidence: material.confidence,
            data_points: material.data_points,
            band: self.material_band(&material),
            rolling_average: material.baseline.map(|b| scale(b.average)),
        })
    }

    /// Materials in `category`, or every material when None. Ordered by id.
    pub fn materials_by_category(&self, category: Option<&str>) -> Vec<MaterialListing> {
        let order = self.store.vendor_order();
        self.store
            .materials()
            .into_iter()
            .filter(|m| category.map_or(true, |c| m.category == c))
            .map(|m| MaterialListing {
                best: best_price(&m.quotes, &order),
                quote_count: m.quotes.len(),
                band: self.material_band(&m),
                confidence: m.confidence,
                id: m.id,
                name: m.name,
                category: m.category,
                canonical_unit: m.canonical_unit,
            })
            .collect()
    }

    /// Reliability band of a material's best price.
    ///
    /// A material with no quotes has nothing to be confident about and is
    /// `NoQuotesAvailable`.
    pub fn confidence_band(&self, id: &MaterialId) -> Result<ConfidenceBand> {
        let material = self.require_material(id)?;
        self.material_band(&material)
            .ok_or_else(|| Error::NoQuotesAvailable {
                material: material.id.to_string(),
            })
    }

    /// Current anomalies as of today, at or above `min` severity.
    pub fn anomalies(&self, min: Option<Severity>) -> AnomalyPass {
        self.detect_anomalies(Utc::now().date_naive(), min)
    }

    /// A fresh detection pass dated `as_of`.
    pub fn detect_anomalies(&self, as_of: NaiveDate, min: Option<Severity>) -> AnomalyPass {
        let pass = detect_all(
            &self.store.materials(),
            &self.store.vendors(),
            &self.store.subcontractors(),
            &self.store.labor_baselines(),
            &self.config.anomaly,
            as_of,
        );
        info!(
            event = event_names::ANOMALY_PASS_FINISHED,
            anomalies = pass.anomalies.len(),
            evaluated = pass.evaluated,
            not_evaluated = pass.not_evaluated.len(),
            "anomaly pass finished"
        );
        match min {
            Some(min) => pass.at_least(min),
            None => pass,
        }
    }

    /// Savings summary for one job. A job with no records is unknown.
    pub fn savings_for_job(&self, job: &JobId) -> Result<SavingsSummary> {
        let records = self.store.savings_records();
        let for_job: Vec<_> = records.iter().filter(|r| &r.job == job).collect();
        if for_job.is_empty() {
            return Err(Error::unknown(EntityKind::Job, job.as_str()));
        }
        Ok(savings::summarize(for_job, &self.config.savings))
    }

    /// Savings summary over records ordered inside `window`.
    pub fn savings_between(&self, window: DateWindow) -> SavingsSummary {
        let records = self.store.savings_records();
        savings::summarize(savings::within(&records, window), &self.config.savings)
    }

    /// Per-job summaries over records inside `window`.
    pub fn savings_by_job(&self, window: DateWindow) -> BTreeMap<JobId, SavingsSummary> {
        let records = self.windowed_savings(window);
        savings::summarize_by_job(&records, &self.config.savings)
    }

    /// Per-category summaries over records inside `window`.
    pub fn savings_by_category(&self, window: DateWindow) -> BTreeMap<String, SavingsSummary> {
        let records = self.windowed_savings(window);
        savings::summarize_by_category(&records, &self.config.savings)
    }

    fn windowed_savings(&self, window: DateWindow) -> Vec<crate::model::SavingsRecord> {
        self.store
            .savings_records()
            .into_iter()
            .filter(|r| window.contains(r.ordered_on))
            .collect()
    }

    /// Rank a trade's subcontractors and store their value scores.
    pub fn rank_trade(&self, trade: &str) -> Result<Vec<RankedSubcontractor>> {
        let subs = self.store.subcontractors();
        let ranked = labor::rank_trade(&subs, trade, &self.config.value_score);
        if ranked.is_empty() {
            return Err(Error::unknown(EntityKind::Trade, trade));
        }
        for r in &ranked {
            self.store.set_value_score(&r.id, r.value_score)?;
        }
        Ok(ranked)
    }

    /// Band of the mean confidence of a category's quoted materials.
    pub fn category_band(&self, category: &str) -> ConfidenceBand {
        let scores: Vec<f64> = self
            .store
            .materials()
            .into_iter()
            .filter(|m| m.category == category && !m.quotes.is_empty())
            .map(|m| m.confidence)
            .collect();
        self.band(mean(&scores).unwrap_or(0.0))
    }

    /// Project a category's price direction.
    pub fn forecast_category(&self, category: &str) -> Result<Forecast> {
        let history = self.store.price_history(category);
        let known = history.is_some() || self.categories().iter().any(|c| c == category);
        if !known {
            return Err(Error::unknown(EntityKind::Category, category));
        }
        forecast(
            category,
            &history.unwrap_or_default(),
            self.category_band(category),
            &self.config.forecast,
            &self.config.confidence,
        )
    }

    /// Every category with materials or price history, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut set: BTreeSet<String> = self
            .store
            .materials()
            .into_iter()
            .map(|m| m.category)
            .collect();
        set.extend(self.store.price_history_categories());
        set.into_iter().collect()
    }

    /// Apply extracted quote records.
    pub fn ingest(&self, records: &[QuoteRecord]) -> IngestReport {
        ingest(self.store.as_ref(), records, self.config.baseline.window)
    }

    /// Recompute every material's confidence from its current quotes.
    ///
    /// Materials are independent, so the pass runs in parallel.
    pub fn recompute_confidence(&self) -> Result<RecomputeReport> {
        let cfg = &self.config.confidence;
        let results: Vec<(MaterialId, Option<(f64, u32)>)> = self
            .store
            .materials()
            .par_iter()
            .map(|m| {
                let prices = m.quote_prices();
                let data_points = m.data_points.max(prices.len() as u32);
                let score = compute_confidence(&m.id, &prices, data_points, cfg)
                    .ok()
                    .map(|s| (s, data_points));
                (m.id.clone(), score)
            })
            .collect();

        let mut report = RecomputeReport::default();
        for (id, outcome) in results {
            match outcome {
                Some((score, data_points)) => {
                    self.store.set_confidence(&id, score, data_points)?;
                    report.updated += 1;
                }
                None => report.skipped.push(id),
            }
        }
        info!(
            event = event_names::CONFIDENCE_RECOMPUTED,
            updated = report.updated,
            skipped = report.skipped.len(),
            "confidence recomputed"
        );
        Ok(report)
    }

    pub fn stats(&self) -> CatalogStats {
        let materials = self.store.materials();
        CatalogStats {
            vendors: self.store.vendors().len(),
            quotes: materials.iter().map(|m| m.quotes.len()).sum(),
            materials_without_quotes: materials.iter().filter(|m| m.quotes.is_empty()).count(),
            materials: materials.len(),
            subcontractors: self.store.subcontractors().len(),
            savings_records: self.store.savings_records().len(),
            categories: self.categories().len(),
        }
    }
}

/// Quotes paired with their vendor, in registration order.
fn ordered_quotes<'a>(
    material: &'a Material,
    vendors: &'a [Vendor],
) -> Vec<(&'a Vendor, &'a crate::model::VendorQuote)> {
    vendors
        .iter()
        .filter_map(|v| material.quotes.get(&v.id).map(|q| (v, q)))
        .collect()
}
