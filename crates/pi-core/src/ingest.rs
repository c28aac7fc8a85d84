//! Quote ingestion.
//!
//! Records arrive already extracted from vendor documents. Each record is
//! processed on its own: a bad record is rejected back to the caller with
//! a structured error and never aborts the rest of the batch.

use chrono::NaiveDate;
use pi_common::{BatchResult, Error, MaterialId, Result, VendorId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{IncomingQuote, QuoteChange};
use crate::logging::event_names;
use crate::pricing::trend::Trend;
use crate::store::PriceStore;

/// One extracted quote, as delivered by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub vendor_id: VendorId,
    pub material_id: MaterialId,
    /// Price per `unit`.
    pub price: f64,
    pub unit: String,
    pub quoted_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,
}

/// A record that made it into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedQuote {
    pub index: usize,
    pub material: MaterialId,
    pub vendor: VendorId,
    /// Stored price, in the material's canonical unit.
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<f64>,
    pub trend: Trend,
    /// True when the quoted unit was converted to the canonical unit.
    pub converted: bool,
}

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    #[serde(flatten)]
    pub batch: BatchResult<AcceptedQuote>,
    /// Rejected records whose unit had no conversion. Included in `failed`.
    pub unconverted: usize,
}

impl IngestReport {
    pub fn accepted(&self) -> usize {
        self.batch.summary.succeeded
    }

    pub fn rejected(&self) -> usize {
        self.batch.summary.failed
    }
}

/// Parse a JSON array of records, or one JSON record per line.
pub fn parse_records(text: &str) -> Result<Vec<QuoteRecord>> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| serde_json::from_str(l).map_err(Error::from))
        .collect()
}

/// Apply `records` to `store` in order.
///
/// Unknown materials and vendors are rejected as `UnknownEntity`, invalid
/// prices as `InvalidQuote`, and units the material cannot convert as
/// `UnknownUnit` (also counted in `unconverted`). A rejection never stops
/// the rest of the batch.
pub fn ingest<S: PriceStore + ?Sized>(
    store: &S,
    records: &[QuoteRecord],
    window: u32,
) -> IngestReport {
    let mut batch = BatchResult::default();
    let mut unconverted = 0;

    for (index, record) in records.iter().enumerate() {
        let item_id = format!("#{} {}/{}", index, record.vendor_id, record.material_id);
        match ingest_one(store, record, window) {
            Ok(change) => {
                batch.add_success(AcceptedQuote {
                    index,
                    material: record.material_id.clone(),
                    vendor: record.vendor_id.clone(),
                    price: change.current,
                    previous: change.previous,
                    trend: change.trend,
                    converted: change.converted,
                });
            }
            Err(e @ Error::UnknownUnit { .. }) => {
                unconverted += 1;
                warn!(
                    event = event_names::INGEST_UNCONVERTED_UNIT,
                    index,
                    material = %record.material_id,
                    vendor = %record.vendor_id,
                    unit = %record.unit,
                    "unit not convertible, quote rejected"
                );
                batch.add_failure(item_id, &e);
            }
            Err(e) => {
                warn!(
                    event = event_names::INGEST_REJECTED,
                    index,
                    material = %record.material_id,
                    vendor = %record.vendor_id,
                    code = e.code(),
                    error = %e,
                    "quote rejected"
                );
                batch.add_failure(item_id, &e);
            }
        }
    }

    info!(
        event = event_names::INGEST_ACCEPTED,
        accepted = batch.summary.succeeded,
        rejected = batch.summary.failed,
        unconverted,
        "ingestion finished"
    );
    IngestReport { batch, unconverted }
}

fn ingest_one<S: PriceStore + ?Sized>(
    store: &S,
    record: &QuoteRecord,
    window: u32,
) -> Result<QuoteChange> {
    let change = store.supersede_quote(
        &record.material_id,
        &record.vendor_id,
        IncomingQuote {
            price: record.price,
            unit: record.unit.clone(),
            quoted_on: record.quoted_date,
            lead_time_days: record.lead_time_days,
        },
        window,
    )?;
    debug!(
        event = event_names::QUOTE_SUPERSEDED,
        material = %record.material_id,
        vendor = %record.vendor_id,
        previous = ?change.previous,
        current = change.current,
        trend = %change.trend,
        "quote superseded"
    );
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Material, Vendor};
    use crate::store::InMemoryStore;
    use std::collections::BTreeMap;

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        for id in ["A", "B"] {
            store
                .register_vendor(Vendor {
                    id: VendorId::new(id),
                    name: format!("Vendor {}", id),
                    short_label: id.to_string(),
                })
                .unwrap();
        }
        let mut conversions = BTreeMap::new();
        conversions.insert("ft".to_string(), 1.0);
        conversions.insert("board".to_string(), 8.0);
        store
            .put_material(Material {
                id: MaterialId::new("MAT-2x4"),
                name: "2x4 SPF".into(),
                category: "lumber".into(),
                canonical_unit: "lf".into(),
                conversions,
                quotes: BTreeMap::new(),
                confidence: 0.0,
                data_points: 0,
                baseline: None,
            })
            .unwrap();
        store
    }

    fn record(vendor: &str, material: &str, price: f64, unit: &str) -> QuoteRecord {
        QuoteRecord {
            vendor_id: VendorId::new(vendor),
            material_id: MaterialId::new(material),
            price,
            unit: unit.into(),
            quoted_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            lead_time_days: Some(2),
        }
    }

    #[test]
    fn converts_to_canonical_before_storing() {
        let store = store();
        let report = ingest(&store, &[record("A", "MAT-2x4", 6.40, "board")], 12);
        assert_eq!(report.accepted(), 1);
        assert!(report.batch.succeeded[0].converted);
        let m = store.material(&MaterialId::new("MAT-2x4")).unwrap();
        assert!((m.quotes[&VendorId::new("A")].price - 0.80).abs() < 1e-12);
    }

    #[test]
    fn unknown_entities_rejected_not_dropped() {
        let store = store();
        let report = ingest(
            &store,
            &[
                record("A", "MAT-404", 1.0, "lf"),
                record("Z", "MAT-2x4", 1.0, "lf"),
                record("B", "MAT-2x4", 0.75, "lf"),
            ],
            12,
        );
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.rejected(), 2);
        assert!(report.batch.failed.iter().all(|f| f.error.code == 20));
        assert_eq!(report.batch.failed[0].item_id, "#0 A/MAT-404");
    }

    #[test]
    fn negative_price_is_invalid_quote() {
        let store = store();
        let report = ingest(&store, &[record("A", "MAT-2x4", -1.0, "lf")], 12);
        assert_eq!(report.batch.failed[0].error.code, 22);
    }

    #[test]
    fn unknown_unit_rejected_and_batch_continues() {
        let store = store();
        let report = ingest(
            &store,
            &[
                record("A", "MAT-2x4", 4.00, "lf"),
                record("B", "MAT-2x4", 150.0, "pallet"),
                record("B", "MAT-2x4", 3.90, "lf"),
            ],
            12,
        );
        assert_eq!(report.accepted(), 2);
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.unconverted, 1);
        assert_eq!(report.batch.failed[0].item_id, "#1 B/MAT-2x4");
        assert_eq!(report.batch.failed[0].error.code, 30);

        let m = store.material(&MaterialId::new("MAT-2x4")).unwrap();
        assert_eq!(m.quotes[&VendorId::new("B")].price, 3.90);
        assert!(m.quote_prices().iter().all(|p| *p < 150.0));
    }

    #[test]
    fn second_quote_records_trend() {
        let store = store();
        let report = ingest(
            &store,
            &[
                record("A", "MAT-2x4", 0.80, "lf"),
                record("A", "MAT-2x4", 0.84, "lf"),
            ],
            12,
        );
        let second = &report.batch.succeeded[1];
        assert_eq!(second.previous, Some(0.80));
        assert_eq!(second.trend, Trend::Rising);
    }

    #[test]
    fn parses_array_and_lines() {
        let array = r#"[{"vendorId":"A","materialId":"M","price":1.5,"unit":"lf","quotedDate":"2024-05-01"}]"#;
        let lines = "{\"vendorId\":\"A\",\"materialId\":\"M\",\"price\":1.5,\"unit\":\"lf\",\"quotedDate\":\"2024-05-01\",\"leadTimeDays\":4}\n\n";
        assert_eq!(parse_records(array).unwrap().len(), 1);
        let parsed = parse_records(lines).unwrap();
        assert_eq!(parsed[0].lead_time_days, Some(4));
        assert!(parse_records("{not json").is_err());
    }
}
