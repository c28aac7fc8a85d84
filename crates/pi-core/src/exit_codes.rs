//! Exit codes for the pi-core CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes
//! - 10-19: User/data errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use pi_common::{Error, ErrorCategory};

/// Exit codes for pi-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Success: nothing to report
    Clean = 0,

    /// Anomaly pass flagged at least one line
    AnomaliesFound = 1,

    // ========================================================================
    // User / Data Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Engine configuration missing, unparseable or invalid
    ConfigError = 11,

    /// Dataset invalid or referenced entity unknown
    DataError = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates an operational outcome (codes 0-1).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/data error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        let code = self as i32;
        code >= 20
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::AnomaliesFound => "OK_ANOMALIES",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DataError => "ERR_DATA",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Map an engine error to the exit code the CLI reports for it.
    ///
    /// Configuration problems never reach here; they are `ConfigError`s
    /// mapped by the CLI before any engine call.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::DataError,
            _ => match err.category() {
                ErrorCategory::Catalog | ErrorCategory::Pricing => ExitCode::DataError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
