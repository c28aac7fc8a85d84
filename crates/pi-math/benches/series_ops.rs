//! Criterion benchmarks for `pi-math`.
//!
//! Focus on the kernels that run once per material in catalog-wide passes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pi_math::{coefficient_of_variation, linear_fit, sum_slice};

fn bench_series_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("series");

    for len in [8usize, 64, 512] {
        let series: Vec<f64> = (0..len).map(|i| 100.0 + (i as f64 * 0.37).sin() * 4.0).collect();

        group.bench_with_input(BenchmarkId::new("sum_slice", len), &series, |b, s| {
            b.iter(|| black_box(sum_slice(black_box(s))));
        });

        group.bench_with_input(
            BenchmarkId::new("coefficient_of_variation", len),
            &series,
            |b, s| {
                b.iter(|| black_box(coefficient_of_variation(black_box(s))));
            },
        );

        group.bench_with_input(BenchmarkId::new("linear_fit", len), &series, |b, s| {
            b.iter(|| black_box(linear_fit(black_box(s))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_series_kernels);
criterion_main!(benches);
