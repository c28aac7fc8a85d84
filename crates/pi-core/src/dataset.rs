//! JSON dataset loading.
//!
//! A dataset is a complete catalog snapshot: vendors (in registration
//! order), materials with their current quotes, subcontractors, reconciled
//! savings records, labor baselines and category price history. Loading
//! seeds an [`InMemoryStore`] and checks catalog invariants on the way in.

use pi_common::{EntityKind, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::model::{Baseline, LaborSubcontractor, Material, PricePoint, SavingsRecord, Vendor};
use crate::store::{InMemoryStore, PriceStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub subcontractors: Vec<LaborSubcontractor>,
    #[serde(default)]
    pub savings: Vec<SavingsRecord>,
    /// Trade → rolling labor price baseline.
    #[serde(default)]
    pub labor_baselines: BTreeMap<String, Baseline>,
    /// Category → price index series, oldest first.
    #[serde(default)]
    pub price_history: BTreeMap<String, Vec<PricePoint>>,
}

impl Dataset {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::InvalidDataset(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Seed a fresh store. Fails on the first broken invariant.
    pub fn into_store(self) -> Result<InMemoryStore> {
        let store = InMemoryStore::new();
        for vendor in self.vendors {
            store.register_vendor(vendor)?;
        }

        let mut seen = BTreeSet::new();
        for material in self.materials {
            if !seen.insert(material.id.clone()) {
                return Err(Error::Duplicate {
                    kind: EntityKind::Material,
                    id: material.id.to_string(),
                });
            }
            store.put_material(material)?;
        }

        let mut seen = BTreeSet::new();
        for sub in self.subcontractors {
            if !seen.insert(sub.id.clone()) {
                return Err(Error::Duplicate {
                    kind: EntityKind::Subcontractor,
                    id: sub.id.to_string(),
                });
            }
            store.put_subcontractor(sub)?;
        }

        for record in self.savings {
            if !record.actual.is_finite() || !record.optimal.is_finite() {
                return Err(Error::InvalidDataset(format!(
                    "savings record for job {} has non-finite amounts",
                    record.job
                )));
            }
            store.add_savings_record(record);
        }
        for (trade, baseline) in self.labor_baselines {
            store.put_labor_baseline(&trade, baseline);
        }
        for (category, series) in self.price_history {
            if series.iter().any(|p| !p.index.is_finite()) {
                return Err(Error::InvalidDataset(format!(
                    "price history for {} has non-finite index values",
                    category
                )));
            }
            store.put_price_history(&category, series);
        }
        Ok(store)
    }

    /// Capture a store's current contents.
    pub fn snapshot<S: PriceStore + ?Sized>(store: &S) -> Self {
        let materials = store.materials();
        let mut categories: BTreeSet<String> =
            materials.iter().map(|m| m.category.clone()).collect();
        categories.extend(store.price_history_categories());
        let price_history = categories
            .into_iter()
            .filter_map(|c| store.price_history(&c).map(|s| (c, s)))
            .collect();

        Dataset {
            vendors: store.vendors(),
            materials,
            subcontractors: store.subcontractors(),
            savings: store.savings_records(),
            labor_baselines: store.labor_baselines(),
            price_history,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pi_common::MaterialId;

    const MINIMAL: &str = r#"{
        "vendors": [
            {"id": "V2", "name": "Second", "short_label": "2nd"},
            {"id": "V1", "name": "First", "short_label": "1st"}
        ],
        "materials": [{
            "id": "MAT-1", "name": "Rebar", "category": "steel", "canonical_unit": "lf",
            "conversions": {"ft": 1.0},
            "quotes": {
                "V1": {"price": 0.81, "trend": "stable", "quoted_on": "2024-03-01"},
                "V2": {"price": 0.79, "trend": "down", "quoted_on": "2024-03-02"}
            },
            "confidence": 72.0, "data_points": 9
        }],
        "price_history": {"steel": [{"period": "2024-01", "index": 101.5}]}
    }"#;

    #[test]
    fn loads_and_keeps_vendor_order() {
        let store = Dataset::from_json(MINIMAL).unwrap().into_store().unwrap();
        let order: Vec<String> = store.vendor_order().iter().map(|v| v.to_string()).collect();
        assert_eq!(order, ["V2", "V1"]);
        assert_eq!(store.materials().len(), 1);
        assert_eq!(store.price_history("steel").unwrap().len(), 1);
    }

    #[test]
    fn unknown_vendor_in_quotes_fails_load() {
        let json = MINIMAL.replace(r#"{"id": "V2", "name": "Second", "short_label": "2nd"},"#, "");
        let err = Dataset::from_json(&json).unwrap().into_store().unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownEntity {
                kind: EntityKind::Vendor,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_material_fails_load() {
        let mut ds = Dataset::from_json(MINIMAL).unwrap();
        let copy = ds.materials[0].clone();
        ds.materials.push(copy);
        assert_eq!(ds.into_store().unwrap_err().code(), 23);
    }

    #[test]
    fn malformed_json_is_invalid_dataset() {
        assert_eq!(Dataset::from_json("{\"vendors\": 3}").unwrap_err().code(), 24);
    }

    #[test]
    fn snapshot_round_trips_store() {
        let ds = Dataset::from_json(MINIMAL).unwrap();
        let store = ds.clone().into_store().unwrap();
        let snap = Dataset::snapshot(&store);
        assert_eq!(snap, ds);
        assert!(store.material(&MaterialId::new("MAT-1")).is_some());
    }
}
