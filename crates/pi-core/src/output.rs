//! Markdown and one-line summary rendering.
//!
//! JSON output is plain serde; this module covers the two human formats.
//! Values that do not exist (no quotes, no baseline, zero spend) render as
//! an em-dash so rows are never silently dropped.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::anomaly::AnomalyPass;
use crate::forecast::Forecast;
use crate::ingest::IngestReport;
use crate::labor::RankedSubcontractor;
use crate::query::{MaterialListing, MaterialView, RecomputeReport};
use crate::savings::SavingsSummary;

/// Placeholder for a missing value.
pub const MISSING: &str = "—";

pub fn price(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), |p| format!("{:.2}", p))
}

pub fn money(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), |p| format!("${:.2}", p))
}

pub fn percent(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), |p| format!("{:+.1}%", p))
}

/// A ratio in [0, 1] as an unsigned percentage.
pub fn rate(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), |r| format!("{:.1}%", r * 100.0))
}

fn or_dash<T: Display>(v: Option<T>) -> String {
    v.map_or_else(|| MISSING.to_string(), |x| x.to_string())
}

pub fn material_md(view: &MaterialView) -> String {
    let mut out = format!("# {} ({})\n\n", view.name, view.id);
    out.push_str(&format!("Category: {}\n", view.category));
    out.push_str(&format!("Unit: {}\n", view.unit));
    if let Some(note) = &view.unit_note {
        out.push_str(&format!("Note: {}\n", note));
    }
    match view.band {
        Some(band) => out.push_str(&format!(
            "Confidence: {:.0} ({}, {} data points)\n",
            view.confidence, band, view.data_points
        )),
        None => out.push_str(&format!("Confidence: {} (no quotes)\n", MISSING)),
    }
    out.push_str(&format!("Rolling average: {}\n\n", price(view.rolling_average)));

    out.push_str("| Vendor | Price | Trend | Delta | Quoted | Lead time |\n");
    out.push_str("|---|---:|---|---:|---|---:|\n");
    for q in &view.quotes {
        let marker = if q.is_best { " **best**" } else { "" };
        out.push_str(&format!(
            "| {}{} | {:.2} | {} {} | {} | {} | {} |\n",
            q.vendor_name,
            marker,
            q.price,
            q.trend.arrow(),
            q.trend,
            q.price_delta
                .map_or_else(|| MISSING.to_string(), |d| format!("{:+.2}", d)),
            q.quoted_on,
            or_dash(q.lead_time_days.map(|d| format!("{}d", d))),
        ));
    }
    out.push('\n');
    match &view.best {
        Some(b) => out.push_str(&format!("Best price: {} at {:.2}/{}\n", b.vendor, b.price, view.unit)),
        None => out.push_str(&format!("Best price: {} (no quotes)\n", MISSING)),
    }
    out
}

pub fn material_summary(view: &MaterialView) -> String {
    format!(
        "{} {}: best {} ({}) per {}, {} quotes, confidence {}",
        view.id,
        view.name,
        price(view.best.as_ref().map(|b| b.price)),
        or_dash(view.best.as_ref().map(|b| &b.vendor)),
        view.unit,
        view.quotes.len(),
        or_dash(view.band)
    )
}

pub fn listing_md(rows: &[MaterialListing]) -> String {
    let mut out = String::from("# Materials\n\n");
    out.push_str("| Id | Name | Category | Unit | Quotes | Best | Vendor | Confidence |\n");
    out.push_str("|---|---|---|---|---:|---:|---|---|\n");
    for r in rows {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            r.id,
            r.name,
            r.category,
            r.canonical_unit,
            r.quote_count,
            price(r.best.as_ref().map(|b| b.price)),
            or_dash(r.best.as_ref().map(|b| &b.vendor)),
            or_dash(r.band)
        ));
    }
    out
}

pub fn anomalies_md(pass: &AnomalyPass) -> String {
    let mut out = String::from("# Price anomalies\n\n");
    if pass.anomalies.is_empty() {
        out.push_str("No anomalies.\n");
    } else {
        out.push_str("| Severity | Line | Vendor | Deviation | Current | Baseline | Detected |\n");
        out.push_str("|---|---|---|---:|---:|---:|---|\n");
        for a in &pass.anomalies {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {:.2} | {:.2} | {} |\n",
                a.severity,
                a.line,
                or_dash(a.vendor.as_ref()),
                percent(Some(a.deviation_pct)),
                a.current,
                a.baseline,
                a.detected_on
            ));
        }
        out.push('\n');
        for a in &pass.anomalies {
            out.push_str(&format!("- {}\n", a.explanation));
        }
    }
    if !pass.not_evaluated.is_empty() {
        out.push_str("\n## Not evaluated (no baseline)\n\n");
        for skipped in &pass.not_evaluated {
            out.push_str(&format!("- {} (code {})\n", skipped.line, skipped.reason.code));
        }
    }
    out
}

pub fn anomalies_summary(pass: &AnomalyPass) -> String {
    use crate::anomaly::Severity;
    format!(
        "{} anomalies ({} critical, {} warning, {} info); {} evaluated, {} not evaluated",
        pass.anomalies.len(),
        pass.count(Severity::Critical),
        pass.count(Severity::Warning),
        pass.count(Severity::Info),
        pass.evaluated,
        pass.not_evaluated.len()
    )
}

pub fn savings_md(title: &str, s: &SavingsSummary) -> String {
    let mut out = format!("# Savings: {}\n\n", title);
    out.push_str(&format!("Records: {}\n", s.records));
    out.push_str(&format!("Actual spend: {}\n", money(Some(s.actual_total))));
    out.push_str(&format!("Optimal spend: {}\n", money(Some(s.optimal_total))));
    out.push_str(&format!("Total savings: {}\n", money(Some(s.total_savings))));
    out.push_str(&format!("Savings rate: {}\n", rate(s.savings_rate)));
    out.push_str(&format!("Realized: {}\n", money(Some(s.realized_savings))));
    out.push_str(&format!("Missed: {}\n", money(Some(s.missed_savings))));
    if !s.missed.is_empty() {
        out.push_str("\n| Job | Category | Vendor | Missed | Ordered |\n");
        out.push_str("|---|---|---|---:|---|\n");
        for m in &s.missed {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                m.job,
                m.category,
                m.vendor,
                money(Some(m.savings)),
                m.ordered_on
            ));
        }
    }
    out
}

pub fn savings_summary(title: &str, s: &SavingsSummary) -> String {
    format!(
        "{}: savings {} of {} spent ({}), missed {}",
        title,
        money(Some(s.total_savings)),
        money(Some(s.actual_total)),
        rate(s.savings_rate),
        money(Some(s.missed_savings))
    )
}

pub fn grouped_savings_md<K: Display>(heading: &str, groups: &BTreeMap<K, SavingsSummary>) -> String {
    let mut out = format!("# Savings by {}\n\n", heading);
    out.push_str(&format!(
        "| {} | Records | Actual | Optimal | Savings | Rate | Missed |\n",
        heading
    ));
    out.push_str("|---|---:|---:|---:|---:|---:|---:|\n");
    for (key, s) in groups {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            key,
            s.records,
            money(Some(s.actual_total)),
            money(Some(s.optimal_total)),
            money(Some(s.total_savings)),
            rate(s.savings_rate),
            money(Some(s.missed_savings))
        ));
    }
    out
}

pub fn ranking_md(trade: &str, ranked: &[RankedSubcontractor]) -> String {
    let mut out = format!("# {} subcontractors\n\n", trade);
    out.push_str("| Rank | Name | Price/area | Value score | Jobs | Callbacks | Availability |\n");
    out.push_str("|---:|---|---:|---:|---:|---:|---|\n");
    for r in ranked {
        out.push_str(&format!(
            "| {} | {} | {:.2} | {:.1} | {} | {} | {} |\n",
            r.rank,
            r.name,
            r.price_per_unit_area,
            r.value_score,
            r.jobs_completed,
            r.callbacks,
            r.availability
        ));
    }
    out
}

pub fn ranking_summary(trade: &str, ranked: &[RankedSubcontractor]) -> String {
    match ranked.first() {
        Some(top) => format!(
            "{}: {} ranked, top {} (score {:.1})",
            trade,
            ranked.len(),
            top.name,
            top.value_score
        ),
        None => format!("{}: {}", trade, MISSING),
    }
}

pub fn forecast_md(f: &Forecast) -> String {
    let mut out = format!("# Forecast: {}\n\n", f.category);
    out.push_str(&format!(
        "Direction: {} ({} over {} periods from {})\n",
        f.direction,
        percent(Some(f.change_pct)),
        f.horizon_periods,
        f.last_period
    ));
    out.push_str(&format!(
        "Projected index: {:.2} (last fitted {:.2})\n",
        f.projected_index,
        f.fit.last_fitted()
    ));
    out.push_str(&format!(
        "Confidence: {:.0} (fit {:.0}, capped by {} band)\n",
        f.confidence, f.fit_confidence, f.band
    ));
    out.push_str(&format!(
        "Fit: slope {:.3}/period, r² {:.3}, {} points\n",
        f.fit.slope, f.fit.r_squared, f.fit.n
    ));
    out
}

pub fn forecast_summary(f: &Forecast) -> String {
    format!(
        "{}: {} {} (confidence {:.0})",
        f.category,
        f.direction,
        percent(Some(f.change_pct)),
        f.confidence
    )
}

pub fn ingest_md(report: &IngestReport) -> String {
    let mut out = String::from("# Ingestion\n\n");
    out.push_str(&format!("Accepted: {}\n", report.accepted()));
    out.push_str(&format!("Rejected: {}\n", report.rejected()));
    out.push_str(&format!("Unconverted units: {}\n", report.unconverted));
    if !report.batch.failed.is_empty() {
        out.push_str("\n| Record | Code | Reason |\n|---|---:|---|\n");
        for f in &report.batch.failed {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                f.item_id, f.error.code, f.error.message
            ));
        }
    }
    out
}

pub fn ingest_summary(report: &IngestReport) -> String {
    format!(
        "ingested {} of {} records ({} rejected, {} unconverted)",
        report.accepted(),
        report.batch.summary.total,
        report.rejected(),
        report.unconverted
    )
}

pub fn recompute_summary(report: &RecomputeReport) -> String {
    format!(
        "confidence recomputed for {} materials, {} skipped (no quotes)",
        report.updated,
        report.skipped.len()
    )
}
