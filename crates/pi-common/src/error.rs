//! Error types for Price Intelligence.
//!
//! Every error carries a stable numeric code, a category, a recoverability
//! flag and a one-line fix, so the same value can be printed for a person
//! or emitted as JSON for a dashboard.
//!
//! Several variants are not failures of the engine at all but explicit
//! "insufficient data" outcomes ([`Error::NoQuotesAvailable`],
//! [`Error::UndefinedBaseline`], [`Error::InsufficientHistory`],
//! [`Error::UnknownUnit`]). Dashboards render those as an em-dash rather
//! than dropping the row; see [`Error::is_insufficient_data`].
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Unknown Entity
//!   Reason: unknown vendor: ACME-99
//!   Fix: Register the vendor in the catalog before ingesting its quotes.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 20,
//!   "category": "catalog",
//!   "message": "unknown vendor: ACME-99",
//!   "recoverable": false,
//!   "context": { "kind": "vendor", "id": "ACME-99" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for Price Intelligence operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Catalog integrity errors (unknown entities, invariant violations).
    Catalog,
    /// Pricing computations that lack the data they need.
    Pricing,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Catalog => write!(f, "catalog"),
            ErrorCategory::Pricing => write!(f, "pricing"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Kinds of catalog entity an id can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Material,
    Vendor,
    Subcontractor,
    Job,
    Category,
    Trade,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Material => write!(f, "material"),
            EntityKind::Vendor => write!(f, "vendor"),
            EntityKind::Subcontractor => write!(f, "subcontractor"),
            EntityKind::Job => write!(f, "job"),
            EntityKind::Category => write!(f, "category"),
            EntityKind::Trade => write!(f, "trade"),
        }
    }
}

/// Unified error type for Price Intelligence.
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors (20-29)
    #[error("unknown {kind}: {id}")]
    UnknownEntity { kind: EntityKind, id: String },

    #[error("invalid material {material}: {reason}")]
    InvalidMaterial { material: String, reason: String },

    #[error("invalid quote from {vendor} for {material}: {reason}")]
    InvalidQuote {
        material: String,
        vendor: String,
        reason: String,
    },

    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: EntityKind, id: String },

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    // Pricing / data sufficiency (30-39)
    #[error("material {material} has no conversion to unit '{unit}'")]
    UnknownUnit { material: String, unit: String },

    #[error("no vendor quotes available for {material}")]
    NoQuotesAvailable { material: String },

    #[error("no rolling baseline for {line}")]
    UndefinedBaseline { line: String },

    #[error("insufficient price history for {category}: {points} point(s), need {required}")]
    InsufficientHistory {
        category: String,
        points: usize,
        required: usize,
    },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an unknown-entity error.
    pub fn unknown(kind: EntityKind, id: impl Into<String>) -> Self {
        Error::UnknownEntity {
            kind,
            id: id.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category (configuration
    /// problems are `pi_config::ValidationError`, not engine errors):
    /// - 20-29: Catalog errors
    /// - 30-39: Pricing / data sufficiency
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::UnknownEntity { .. } => 20,
            Error::InvalidMaterial { .. } => 21,
            Error::InvalidQuote { .. } => 22,
            Error::Duplicate { .. } => 23,
            Error::InvalidDataset(_) => 24,
            Error::UnknownUnit { .. } => 30,
            Error::NoQuotesAvailable { .. } => 31,
            Error::UndefinedBaseline { .. } => 32,
            Error::InsufficientHistory { .. } => 33,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownEntity { .. }
            | Error::InvalidMaterial { .. }
            | Error::InvalidQuote { .. }
            | Error::Duplicate { .. }
            | Error::InvalidDataset(_) => ErrorCategory::Catalog,

            Error::UnknownUnit { .. }
            | Error::NoQuotesAvailable { .. }
            | Error::UndefinedBaseline { .. }
            | Error::InsufficientHistory { .. } => ErrorCategory::Pricing,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// True for outcomes that mean "not enough data to answer", which the
    /// consuming dashboard renders as a placeholder instead of an error.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            Error::UnknownUnit { .. }
                | Error::NoQuotesAvailable { .. }
                | Error::UndefinedBaseline { .. }
                | Error::InsufficientHistory { .. }
        )
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Rejected back to the ingestion collaborator, never retried here.
            Error::UnknownEntity { .. } => false,
            Error::InvalidMaterial { .. } => false,
            Error::InvalidQuote { .. } => false,
            Error::Duplicate { .. } => false,
            Error::InvalidDataset(_) => true,

            // More quotes or history resolve these.
            Error::UnknownUnit { .. } => true,
            Error::NoQuotesAvailable { .. } => true,
            Error::UndefinedBaseline { .. } => true,
            Error::InsufficientHistory { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::UnknownEntity { .. } => {
                "Register the vendor or material in the catalog before ingesting its quotes."
            }
            Error::InvalidMaterial { .. } => {
                "Conversion factors must be strictly positive and every quote must name a registered vendor."
            }
            Error::InvalidQuote { .. } => "Quoted prices must be finite and non-negative.",
            Error::Duplicate { .. } => "Identifiers must be unique within the catalog.",
            Error::InvalidDataset(_) => "Check the dataset JSON against the documented layout.",

            Error::UnknownUnit { .. } => {
                "Register a conversion factor for the unit, or query in the canonical unit."
            }
            Error::NoQuotesAvailable { .. } => {
                "Collect at least one vendor quote for this material."
            }
            Error::UndefinedBaseline { .. } => {
                "A baseline forms once a vendor quote has been superseded at least once."
            }
            Error::InsufficientHistory { .. } => {
                "Add more periods to the category's price history before forecasting."
            }

            Error::Io(_) => "Check that the file exists and is readable, then retry.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::UnknownEntity { .. } => "Unknown Entity",
            Error::InvalidMaterial { .. } => "Invalid Material",
            Error::InvalidQuote { .. } => "Invalid Quote",
            Error::Duplicate { .. } => "Duplicate Identifier",
            Error::InvalidDataset(_) => "Invalid Dataset",
            Error::UnknownUnit { .. } => "No Unit Conversion",
            Error::NoQuotesAvailable { .. } => "No Quotes Available",
            Error::UndefinedBaseline { .. } => "No Baseline",
            Error::InsufficientHistory { .. } => "Insufficient History",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., material id, unit).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UnknownEntity { kind, id } | Error::Duplicate { kind, id } => {
                context.insert("kind".to_string(), serde_json::json!(kind));
                context.insert("id".to_string(), serde_json::json!(id));
            }
            Error::InvalidQuote {
                material, vendor, ..
            } => {
                context.insert("material".to_string(), serde_json::json!(material));
                context.insert("vendor".to_string(), serde_json::json!(vendor));
            }
            Error::UnknownUnit { material, unit } => {
                context.insert("material".to_string(), serde_json::json!(material));
                context.insert("unit".to_string(), serde_json::json!(unit));
            }
            Error::NoQuotesAvailable { material } | Error::InvalidMaterial { material, .. } => {
                context.insert("material".to_string(), serde_json::json!(material));
            }
            Error::UndefinedBaseline { line } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::InsufficientHistory {
                category,
                points,
                required,
            } => {
                context.insert("category".to_string(), serde_json::json!(category));
                context.insert("points".to_string(), serde_json::json!(points));
                context.insert("required".to_string(), serde_json::json!(required));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Compact single-line JSON for stderr.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Per-item outcome of a batch where one bad item must not sink the rest
/// (quote ingestion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BatchError>,
    pub summary: BatchSummary,
}

/// One rejected item, reported back to whoever supplied it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Position and key of the item, e.g. `#3 VZ/MAT-STUD-2x4`.
    pub item_id: String,
    pub error: StructuredError,
}

/// Counts over a [`BatchResult`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub all_succeeded: bool,
}

impl<T> BatchResult<T> {
    pub fn add_failure(&mut self, item_id: impl Into<String>, error: &Error) {
        self.failed.push(BatchError {
            item_id: item_id.into(),
            error: StructuredError::from(error),
        });
        self.summary.failed += 1;
        self.summary.total += 1;
        self.summary.all_succeeded = false;
    }

    pub fn add_success(&mut self, item: T) {
        self.succeeded.push(item);
        self.summary.succeeded += 1;
        self.summary.total += 1;
    }
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        BatchResult {
            succeeded: Vec::new(),
            failed: Vec::new(),
            summary: BatchSummary {
                all_succeeded: true,
                ..BatchSummary::default()
            },
        }
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
