//! Price anomaly detection.
//!
//! Each line (a material's vendor quotes, or a subcontractor's labor
//! price) is compared with its rolling baseline:
//!
//! ```text
//! deviation % = (current - average) / average * 100
//! ```
//!
//! Severity is the highest threshold the absolute deviation meets or
//! exceeds. A line without a usable baseline is reported as not evaluated
//! with an `UndefinedBaseline` reason, which is distinct from evaluated and
//! clean. Every pass regenerates its
//! anomalies from scratch; nothing is accumulated between passes.

use chrono::NaiveDate;
use pi_common::{Error, MaterialId, StructuredError, SubcontractorId, VendorId};
use pi_config::AnomalyThresholds;
use pi_math::pct_change;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Baseline, LaborSubcontractor, Material, Vendor};

/// Anomaly severity. Ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    #[serde(alias = "alert")]
    Critical,
}

impl Severity {
    /// Highest severity whose threshold `abs_deviation_pct` meets or exceeds.
    ///
    /// None below the informational noise floor.
    pub fn classify(abs_deviation_pct: f64, t: &AnomalyThresholds) -> Option<Self> {
        if abs_deviation_pct >= t.critical_pct {
            Some(Severity::Critical)
        } else if abs_deviation_pct >= t.warning_pct {
            Some(Severity::Warning)
        } else if abs_deviation_pct >= t.info_pct {
            Some(Severity::Info)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "informational" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "critical" | "alert" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// The line an anomaly refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineRef {
    Material { id: MaterialId },
    Labor {
        trade: String,
        subcontractor: SubcontractorId,
    },
}

impl std::fmt::Display for LineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineRef::Material { id } => write!(f, "material {}", id),
            LineRef::Labor {
                trade,
                subcontractor,
            } => write!(f, "{} labor {}", trade, subcontractor),
        }
    }
}

/// A flagged price movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub line: LineRef,
    /// Vendor whose quote deviated; None for labor lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorId>,
    pub severity: Severity,
    pub deviation_pct: f64,
    pub current: f64,
    pub baseline: f64,
    pub explanation: String,
    pub detected_on: NaiveDate,
}

/// Outcome of evaluating one price against its baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// No usable baseline; detection skipped.
    NotEvaluated,
    /// Deviation below the noise floor.
    Clear { deviation_pct: f64 },
    Flagged { severity: Severity, deviation_pct: f64 },
}

/// Evaluate `current` against `baseline`.
pub fn evaluate(current: f64, baseline: Option<&Baseline>, t: &AnomalyThresholds) -> Evaluation {
    let Some(deviation_pct) = baseline.and_then(|b| pct_change(b.average, current)) else {
        return Evaluation::NotEvaluated;
    };
    match Severity::classify(deviation_pct.abs(), t) {
        Some(severity) => Evaluation::Flagged {
            severity,
            deviation_pct,
        },
        None => Evaluation::Clear { deviation_pct },
    }
}

/// A line the pass skipped, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub line: LineRef,
    pub reason: StructuredError,
}

impl SkippedLine {
    fn without_baseline(line: LineRef) -> Self {
        let reason = StructuredError::from(&Error::UndefinedBaseline {
            line: line.to_string(),
        });
        SkippedLine { line, reason }
    }
}

/// Result of one detection pass over the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyPass {
    /// Most severe first, then by absolute deviation.
    pub anomalies: Vec<Anomaly>,
    /// Lines skipped for lack of a baseline, ordered by line.
    pub not_evaluated: Vec<SkippedLine>,
    /// Quotes and labor prices actually compared against a baseline.
    pub evaluated: usize,
}

impl AnomalyPass {
    /// Keep only anomalies at or above `min`.
    pub fn at_least(mut self, min: Severity) -> Self {
        self.anomalies.retain(|a| a.severity >= min);
        self
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.anomalies.iter().filter(|a| a.severity == severity).count()
    }
}

fn direction_word(deviation_pct: f64) -> &'static str {
    if deviation_pct >= 0.0 {
        "above"
    } else {
        "below"
    }
}

fn material_findings(
    material: &Material,
    vendor_names: &BTreeMap<VendorId, String>,
    t: &AnomalyThresholds,
    as_of: NaiveDate,
) -> (Vec<Anomaly>, Option<SkippedLine>, usize) {
    let line = LineRef::Material {
        id: material.id.clone(),
    };
    if material.quotes.is_empty() {
        return (Vec::new(), None, 0);
    }
    let Some(baseline) = material.baseline.filter(|b| b.average > 0.0) else {
        return (Vec::new(), Some(SkippedLine::without_baseline(line)), 0);
    };

    let mut found = Vec::new();
    let mut evaluated = 0;
    for (vendor, quote) in &material.quotes {
        match evaluate(quote.price, Some(&baseline), t) {
            Evaluation::NotEvaluated => {}
            Evaluation::Clear { .. } => evaluated += 1,
            Evaluation::Flagged {
                severity,
                deviation_pct,
            } => {
                evaluated += 1;
                let vendor_name = vendor_names
                    .get(vendor)
                    .map(String::as_str)
                    .unwrap_or(vendor.as_str());
                found.push(Anomaly {
                    line: line.clone(),
                    vendor: Some(vendor.clone()),
                    severity,
                    deviation_pct,
                    current: quote.price,
                    baseline: baseline.average,
                    explanation: format!(
                        "{} quoted {} at {:.2}/{}, {:.1}% {} its rolling average of {:.2}",
                        vendor_name,
                        material.name,
                        quote.price,
                        material.canonical_unit,
                        deviation_pct.abs(),
                        direction_word(deviation_pct),
                        baseline.average
                    ),
                    detected_on: as_of,
                });
            }
        }
    }
    (found, None, evaluated)
}

fn labor_findings(
    sub: &LaborSubcontractor,
    baseline: Option<&Baseline>,
    t: &AnomalyThresholds,
    as_of: NaiveDate,
) -> (Option<Anomaly>, Option<SkippedLine>, usize) {
    let line = LineRef::Labor {
        trade: sub.trade.clone(),
        subcontractor: sub.id.clone(),
    };
    match evaluate(sub.price_per_unit_area, baseline, t) {
        Evaluation::NotEvaluated => (None, Some(SkippedLine::without_baseline(line)), 0),
        Evaluation::Clear { .. } => (None, None, 1),
        Evaluation::Flagged {
            severity,
            deviation_pct,
        } => {
            let average = baseline.map(|b| b.average).unwrap_or_default();
            let anomaly = Anomaly {
                explanation: format!(
                    "{} bid {} labor at {:.2}/unit area, {:.1}% {} the trade average of {:.2}",
                    sub.name,
                    sub.trade,
                    sub.price_per_unit_area,
                    deviation_pct.abs(),
                    direction_word(deviation_pct),
                    average
                ),
                line,
                vendor: None,
                severity,
                deviation_pct,
                current: sub.price_per_unit_area,
                baseline: average,
                detected_on: as_of,
            };
            (Some(anomaly), None, 1)
        }
    }
}

/// Run a full detection pass over materials and labor lines.
///
/// Materials are evaluated in parallel; there is no cross-material state.
pub fn detect_all(
    materials: &[Material],
    vendors: &[Vendor],
    subcontractors: &[LaborSubcontractor],
    labor_baselines: &BTreeMap<String, Baseline>,
    t: &AnomalyThresholds,
    as_of: NaiveDate,
) -> AnomalyPass {
    let vendor_names: BTreeMap<VendorId, String> = vendors
        .iter()
        .map(|v| (v.id.clone(), v.name.clone()))
        .collect();

    let material_results: Vec<_> = materials
        .par_iter()
        .map(|m| material_findings(m, &vendor_names, t, as_of))
        .collect();

    let mut pass = AnomalyPass::default();
    for (found, skipped, evaluated) in material_results {
        pass.anomalies.extend(found);
        pass.not_evaluated.extend(skipped);
        pass.evaluated += evaluated;
    }

    for sub in subcontractors {
        let baseline = labor_baselines
            .get(&sub.trade)
            .filter(|b| b.average > 0.0);
        let (found, skipped, evaluated) = labor_findings(sub, baseline, t, as_of);
        pass.anomalies.extend(found);
        pass.not_evaluated.extend(skipped);
        pass.evaluated += evaluated;
    }

    pass.anomalies.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.deviation_pct.abs().total_cmp(&a.deviation_pct.abs()))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.vendor.cmp(&b.vendor))
    });
    pass.not_evaluated.sort_by(|a, b| a.line.cmp(&b.line));
    pass
}
