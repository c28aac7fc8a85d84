//! Configuration snapshots for report provenance.
//!
//! A snapshot captures which calibration produced a report: where the
//! config came from, a hash of its content, and the key thresholds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::EngineConfig;
use crate::resolve::ConfigPaths;

/// Provenance record attached to reports and `pi-core config` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Load time.
    pub timestamp: DateTime<Utc>,

    /// Machine that produced the report.
    #[serde(default)]
    pub hostname: Option<String>,

    pub schema_version: String,

    /// Path where the engine config was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the engine configuration.
    pub source: String,

    /// SHA-256 of the file content, or of the canonical default JSON.
    pub hash: String,

    /// Thresholds most often asked about when a report looks off.
    pub summary: ConfigSummary,
}

/// The thresholds that change anomaly, band and savings output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub warning_pct: f64,
    pub critical_pct: f64,
    pub band_cut_points: [f64; 3],
    pub materiality_threshold: f64,
    pub baseline_window: u32,
}

impl ConfigSummary {
    fn from_config(config: &EngineConfig) -> Self {
        ConfigSummary {
            warning_pct: config.anomaly.warning_pct,
            critical_pct: config.anomaly.critical_pct,
            band_cut_points: [
                config.confidence.strong,
                config.confidence.moderate,
                config.confidence.weak,
            ],
            materiality_threshold: config.savings.materiality_threshold,
            baseline_window: config.baseline.window,
        }
    }
}

impl ConfigSnapshot {
    /// Create a snapshot from a config loaded from disk.
    pub fn new(config: &EngineConfig, paths: &ConfigPaths, raw_json: &str) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            hostname: current_hostname(),
            schema_version: config.schema_version.clone(),
            path: paths.engine.as_ref().map(|p| p.display().to_string()),
            source: paths.engine_source.to_string(),
            hash: hash_content(raw_json),
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Create a snapshot for a config that did not come from a file.
    pub fn from_defaults(config: &EngineConfig) -> Self {
        ConfigSnapshot {
            timestamp: Utc::now(),
            hostname: current_hostname(),
            schema_version: config.schema_version.clone(),
            path: None,
            source: crate::resolve::ConfigSource::BuiltinDefault.to_string(),
            hash: hash_content(&config.to_canonical_json()),
            summary: ConfigSummary::from_config(config),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Same calibration, regardless of where or when it was loaded.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.hash == other.hash
    }

    /// First 12 hex digits of the hash; shown in run envelopes.
    pub fn short_id(&self) -> &str {
        &self.hash[..12.min(self.hash.len())]
    }
}

fn current_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().to_string())
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
