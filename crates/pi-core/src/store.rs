//! Storage abstraction for the catalog.
//!
//! The engine talks to storage only through [`PriceStore`]. Readers get
//! owned snapshots; the one mutating hot path, quote replacement, is a
//! single call so an implementation can make it atomic per
//! vendor+material key. Readers may observe either the old or the new
//! quote for a vendor; no cross-vendor consistency is promised.

use pi_common::{EntityKind, Error, MaterialId, Result, SubcontractorId, VendorId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::catalog::{IncomingQuote, QuoteChange};
use crate::model::{Baseline, LaborSubcontractor, Material, PricePoint, SavingsRecord, Vendor};

/// Get/put/query access to everything the engine reads.
pub trait PriceStore: Send + Sync {
    /// Vendors in registration order.
    fn vendors(&self) -> Vec<Vendor>;
    /// Register a vendor. Duplicate ids are rejected.
    fn register_vendor(&self, vendor: Vendor) -> Result<()>;

    fn material(&self, id: &MaterialId) -> Option<Material>;
    /// All materials, ordered by id.
    fn materials(&self) -> Vec<Material>;
    /// Insert or replace a material after checking its invariants.
    fn put_material(&self, material: Material) -> Result<()>;
    /// Convert and replace one vendor's quote for one material as a single
    /// operation, against the material's conversions at that moment.
    fn supersede_quote(
        &self,
        material: &MaterialId,
        vendor: &VendorId,
        incoming: IncomingQuote,
        window: u32,
    ) -> Result<QuoteChange>;
    /// Write back a recomputed confidence score.
    fn set_confidence(&self, material: &MaterialId, score: f64, data_points: u32) -> Result<()>;

    /// Subcontractors, ordered by id.
    fn subcontractors(&self) -> Vec<LaborSubcontractor>;
    fn put_subcontractor(&self, sub: LaborSubcontractor) -> Result<()>;
    fn set_value_score(&self, id: &SubcontractorId, score: f64) -> Result<()>;

    fn savings_records(&self) -> Vec<SavingsRecord>;
    fn add_savings_record(&self, record: SavingsRecord);

    fn labor_baselines(&self) -> BTreeMap<String, Baseline>;
    fn put_labor_baseline(&self, trade: &str, baseline: Baseline);

    fn price_history(&self, category: &str) -> Option<Vec<PricePoint>>;
    fn put_price_history(&self, category: &str, series: Vec<PricePoint>);
    /// Categories with a price history, sorted.
    fn price_history_categories(&self) -> Vec<String>;

    /// Vendor ids in registration order.
    fn vendor_order(&self) -> Vec<VendorId> {
        self.vendors().into_iter().map(|v| v.id).collect()
    }
}

/// In-process store with one lock per collection.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    vendors: RwLock<Vec<Vendor>>,
    materials: RwLock<BTreeMap<MaterialId, Material>>,
    subcontractors: RwLock<BTreeMap<SubcontractorId, LaborSubcontractor>>,
    savings: RwLock<Vec<SavingsRecord>>,
    labor_baselines: RwLock<BTreeMap<String, Baseline>>,
    price_history: RwLock<HashMap<String, Vec<PricePoint>>>,
}

// A panic while holding a lock cannot leave these collections half-written
// (every write is a single insert or replace), so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|p| p.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|p| p.into_inner())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_known_vendor(&self, id: &VendorId) -> bool {
        read(&self.vendors).iter().any(|v| &v.id == id)
    }
}

impl PriceStore for InMemoryStore {
    fn vendors(&self) -> Vec<Vendor> {
        read(&self.vendors).clone()
    }

    fn register_vendor(&self, vendor: Vendor) -> Result<()> {
        let mut vendors = write(&self.vendors);
        if vendors.iter().any(|v| v.id == vendor.id) {
            return Err(Error::Duplicate {
                kind: EntityKind::Vendor,
                id: vendor.id.to_string(),
            });
        }
        vendors.push(vendor);
        Ok(())
    }

    fn material(&self, id: &MaterialId) -> Option<Material> {
        read(&self.materials).get(id).cloned()
    }

    fn materials(&self) -> Vec<Material> {
        read(&self.materials).values().cloned().collect()
    }

    fn put_material(&self, material: Material) -> Result<()> {
        material.validate(|v| self.is_known_vendor(v))?;
        write(&self.materials).insert(material.id.clone(), material);
        Ok(())
    }

    fn supersede_quote(
        &self,
        material: &MaterialId,
        vendor: &VendorId,
        incoming: IncomingQuote,
        window: u32,
    ) -> Result<QuoteChange> {
        if !self.is_known_vendor(vendor) {
            return Err(Error::unknown(EntityKind::Vendor, vendor.as_str()));
        }

        let mut materials = write(&self.materials);
        let entry = materials
            .get_mut(material)
            .ok_or_else(|| Error::unknown(EntityKind::Material, material.as_str()))?;
        entry.supersede_quote(vendor, incoming, window)
    }

    fn set_confidence(&self, material: &MaterialId, score: f64, data_points: u32) -> Result<()> {
        let mut materials = write(&self.materials);
        let entry = materials
            .get_mut(material)
            .ok_or_else(|| Error::unknown(EntityKind::Material, material.as_str()))?;
        entry.confidence = score;
        entry.data_points = data_points;
        Ok(())
    }

    fn subcontractors(&self) -> Vec<LaborSubcontractor> {
        read(&self.subcontractors).values().cloned().collect()
    }

    fn put_subcontractor(&self, sub: LaborSubcontractor) -> Result<()> {
        if !sub.price_per_unit_area.is_finite() || sub.price_per_unit_area < 0.0 {
            return Err(Error::InvalidDataset(format!(
                "subcontractor {} has invalid price {}",
                sub.id, sub.price_per_unit_area
            )));
        }
        write(&self.subcontractors).insert(sub.id.clone(), sub);
        Ok(())
    }

    fn set_value_score(&self, id: &SubcontractorId, score: f64) -> Result<()> {
        let mut subs = write(&self.subcontractors);
        let entry = subs
            .get_mut(id)
            .ok_or_else(|| Error::unknown(EntityKind::Subcontractor, id.as_str()))?;
        entry.value_score = Some(score);
        Ok(())
    }

    fn savings_records(&self) -> Vec<SavingsRecord> {
        read(&self.savings).clone()
    }

    fn add_savings_record(&self, record: SavingsRecord) {
        write(&self.savings).push(record);
    }

    fn labor_baselines(&self) -> BTreeMap<String, Baseline> {
        read(&self.labor_baselines).clone()
    }

    fn put_labor_baseline(&self, trade: &str, baseline: Baseline) {
        write(&self.labor_baselines).insert(trade.to_string(), baseline);
    }

    fn price_history(&self, category: &str) -> Option<Vec<PricePoint>> {
        read(&self.price_history).get(category).cloned()
    }

    fn put_price_history(&self, category: &str, series: Vec<PricePoint>) {
        write(&self.price_history).insert(category.to_string(), series);
    }

    fn price_history_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = read(&self.price_history).keys().cloned().collect();
        categories.sort();
        categories
    }
}
