//! Savings aggregation over reconciled purchase records.
//!
//! Totals use compensated summation, so grouping the same records by job
//! or by category and summing the groups reproduces the ungrouped totals
//! up to rounding noise.

use chrono::NaiveDate;
use pi_common::{JobId, VendorId};
use pi_config::SavingsConfig;
use pi_math::{compensated_sum, safe_ratio};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::SavingsRecord;

/// A record whose savings exceeded the materiality threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedSaving {
    pub job: JobId,
    pub category: String,
    pub vendor: VendorId,
    pub savings: f64,
    pub ordered_on: NaiveDate,
}

/// Aggregate view of a set of savings records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsSummary {
    pub records: usize,
    pub actual_total: f64,
    pub optimal_total: f64,
    /// `actual_total - optimal_total`.
    pub total_savings: f64,
    /// `total_savings / actual_total`; None when nothing was spent.
    pub savings_rate: Option<f64>,
    /// Sum of per-record savings above the materiality threshold.
    pub missed_savings: f64,
    /// `total_savings - missed_savings`.
    pub realized_savings: f64,
    pub missed: Vec<MissedSaving>,
}

/// Summarize `records` against the materiality threshold.
pub fn summarize<'a, I>(records: I, cfg: &SavingsConfig) -> SavingsSummary
where
    I: IntoIterator<Item = &'a SavingsRecord>,
{
    let records: Vec<&SavingsRecord> = records.into_iter().collect();
    let actual_total = compensated_sum(records.iter().map(|r| r.actual));
    let optimal_total = compensated_sum(records.iter().map(|r| r.optimal));
    let total_savings = actual_total - optimal_total;

    let missed: Vec<MissedSaving> = records
        .iter()
        .filter(|r| r.savings() > cfg.materiality_threshold)
        .map(|r| MissedSaving {
            job: r.job.clone(),
            category: r.category.clone(),
            vendor: r.vendor.clone(),
            savings: r.savings(),
            ordered_on: r.ordered_on,
        })
        .collect();
    let missed_savings = compensated_sum(missed.iter().map(|m| m.savings));

    SavingsSummary {
        records: records.len(),
        actual_total,
        optimal_total,
        total_savings,
        savings_rate: if actual_total > 0.0 {
            safe_ratio(total_savings, actual_total)
        } else {
            None
        },
        missed_savings,
        realized_savings: total_savings - missed_savings,
        missed,
    }
}

/// Summaries keyed by job.
pub fn summarize_by_job(
    records: &[SavingsRecord],
    cfg: &SavingsConfig,
) -> BTreeMap<JobId, SavingsSummary> {
    group_by(records, |r| r.job.clone())
        .into_iter()
        .map(|(k, group)| (k, summarize(group, cfg)))
        .collect()
}

/// Summaries keyed by spend category.
pub fn summarize_by_category(
    records: &[SavingsRecord],
    cfg: &SavingsConfig,
) -> BTreeMap<String, SavingsSummary> {
    group_by(records, |r| r.category.clone())
        .into_iter()
        .map(|(k, group)| (k, summarize(group, cfg)))
        .collect()
}

fn group_by<'a, K: Ord>(
    records: &'a [SavingsRecord],
    key: impl Fn(&SavingsRecord) -> K,
) -> BTreeMap<K, Vec<&'a SavingsRecord>> {
    let mut groups: BTreeMap<K, Vec<&'a SavingsRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(key(r)).or_default().push(r);
    }
    groups
}

/// Inclusive date window on `ordered_on`. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |f| day >= f) && self.to.map_or(true, |t| day <= t)
    }
}

/// Records ordered inside `window`.
pub fn within(records: &[SavingsRecord], window: DateWindow) -> Vec<&SavingsRecord> {
    records
        .iter()
        .filter(|r| window.contains(r.ordered_on))
        .collect()
}
