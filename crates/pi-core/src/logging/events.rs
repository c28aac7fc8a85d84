//! Structured event names and pipeline stages for logging.
//!
//! Every engine log line carries an `event` field drawn from
//! [`event_names`] so JSONL consumers can filter without parsing messages.

use serde::{Deserialize, Serialize};

/// Stages of a pi-core run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Dataset loading into the store.
    Load,
    /// Quote ingestion and supersession.
    Ingest,
    /// Catalog-wide batch passes (confidence, anomalies).
    Analyze,
    /// Rendering a report.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Ingest => "ingest",
            Stage::Analyze => "analyze",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";

    // Load
    pub const DATASET_LOADED: &str = "dataset.loaded";

    // Ingest
    pub const INGEST_ACCEPTED: &str = "ingest.accepted";
    pub const INGEST_REJECTED: &str = "ingest.rejected";
    pub const INGEST_UNCONVERTED_UNIT: &str = "ingest.unconverted_unit";
    pub const QUOTE_SUPERSEDED: &str = "quote.superseded";

    // Analyze
    pub const ANOMALY_PASS_FINISHED: &str = "anomaly.pass_finished";
    pub const CONFIDENCE_RECOMPUTED: &str = "confidence.recomputed";
}
