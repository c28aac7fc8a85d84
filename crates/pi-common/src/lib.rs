//! Price Intelligence common types, IDs, and errors.
//!
//! This crate provides foundational types shared across pi-core modules:
//! - Catalog identity types (materials, vendors, subcontractors, jobs)
//! - The unified error taxonomy with stable codes
//! - Output formats

pub mod error;
pub mod id;
pub mod output;

pub use error::{
    format_error_human, BatchError, BatchResult, BatchSummary, EntityKind, Error, ErrorCategory,
    Result, StructuredError,
};
pub use id::{JobId, MaterialId, SubcontractorId, VendorId};
pub use output::OutputFormat;
