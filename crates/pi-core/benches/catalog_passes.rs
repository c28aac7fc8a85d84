//! Criterion benchmarks for catalog-wide passes.
//!
//! Synthetic catalogs of increasing size, four vendors per material.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pi_common::{JobId, MaterialId, VendorId};
use pi_config::EngineConfig;
use pi_core::anomaly::detect_all;
use pi_core::model::{Baseline, Material, SavingsRecord, Vendor, VendorQuote};
use pi_core::pricing::Trend;
use pi_core::savings::{summarize, summarize_by_category};
use pi_core::{InMemoryStore, PriceIntel, PriceStore};

const VENDORS: [&str; 4] = ["VA", "VB", "VC", "VD"];

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn vendors() -> Vec<Vendor> {
    VENDORS
        .iter()
        .map(|id| Vendor {
            id: VendorId::new(*id),
            name: format!("Vendor {}", id),
            short_label: id.to_string(),
        })
        .collect()
}

fn synthetic_material(i: usize) -> Material {
    let base = 10.0 + (i % 97) as f64;
    let quotes: BTreeMap<VendorId, VendorQuote> = VENDORS
        .iter()
        .enumerate()
        .map(|(k, v)| {
            let wobble = ((i * 7 + k * 13) % 31) as f64 / 100.0;
            (
                VendorId::new(*v),
                VendorQuote {
                    price: base * (0.9 + wobble),
                    trend: Trend::Stable,
                    price_delta: None,
                    quoted_on: day(),
                    lead_time_days: Some(3),
                },
            )
        })
        .collect();
    Material {
        id: MaterialId::new(format!("MAT-{:05}", i)),
        name: format!("material {}", i),
        category: format!("cat-{}", i % 12),
        canonical_unit: "ea".into(),
        conversions: BTreeMap::new(),
        quotes,
        confidence: 0.0,
        data_points: 6,
        baseline: Some(Baseline {
            average: base,
            samples: 12,
        }),
    }
}

fn synthetic_savings(n: usize) -> Vec<SavingsRecord> {
    (0..n)
        .map(|i| SavingsRecord {
            job: JobId::new(format!("J-{}", i % 40)),
            category: format!("cat-{}", i % 12),
            actual: 1_000.0 + (i % 300) as f64,
            optimal: 900.0 + (i % 250) as f64,
            vendor: VendorId::new(VENDORS[i % VENDORS.len()]),
            ordered_on: day(),
        })
        .collect()
}

fn bench_catalog_passes(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let vendors = vendors();
    let mut group = c.benchmark_group("catalog");

    for size in [100usize, 1_000, 10_000] {
        let materials: Vec<Material> = (0..size).map(synthetic_material).collect();

        group.bench_with_input(BenchmarkId::new("detect_all", size), &materials, |b, m| {
            b.iter(|| {
                black_box(detect_all(
                    black_box(m),
                    &vendors,
                    &[],
                    &BTreeMap::new(),
                    &cfg.anomaly,
                    day(),
                ))
            });
        });

        let store = InMemoryStore::new();
        for v in &vendors {
            let _ = store.register_vendor(v.clone());
        }
        for m in &materials {
            let _ = store.put_material(m.clone());
        }
        let intel = PriceIntel::new(Arc::new(store), cfg.clone());
        group.bench_with_input(BenchmarkId::new("recompute_confidence", size), &intel, |b, intel| {
            b.iter(|| black_box(intel.recompute_confidence()));
        });

        let records = synthetic_savings(size);
        group.bench_with_input(BenchmarkId::new("summarize", size), &records, |b, r| {
            b.iter(|| black_box(summarize(black_box(r), &cfg.savings)));
        });
        group.bench_with_input(
            BenchmarkId::new("summarize_by_category", size),
            &records,
            |b, r| {
                b.iter(|| black_box(summarize_by_category(black_box(r), &cfg.savings)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_catalog_passes);
criterion_main!(benches);
