//! Logging configuration.
//!
//! Precedence, lowest first: built-in default (warn, human) → `RUST_LOG`
//! directives → `PI_LOG` level → `PI_LOG_FORMAT` → CLI flags.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format.
    #[default]
    #[value(alias = "console", alias = "pretty")]
    Human,
    /// JSON lines, one event per line.
    #[value(alias = "json")]
    Jsonl,
}

/// Log level filter for pi-core events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Completely silent.
    #[value(alias = "none", alias = "quiet")]
    Off,
    Error,
    #[default]
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Level selected by `-v` count and `-q`, or None to defer to the environment.
    ///
    /// The default is warn, so one `-v` surfaces ingestion and pass summaries.
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Option<Self> {
        if quiet {
            return Some(LogLevel::Error);
        }
        match verbose {
            0 => None,
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }

    fn parse_env(value: &str) -> Option<Self> {
        <LogLevel as ValueEnum>::from_str(value.trim(), true).ok()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Resolved logging settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Raw `RUST_LOG` directives, used only when no explicit level was given.
    pub directives: Option<String>,
    /// Timestamps on human output; off when `PI_LOG_TIMESTAMPS=0`.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Warn,
            directives: None,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    fn resolve(
        var: impl Fn(&str) -> Option<String>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let mut config = LogConfig::default();

        let explicit = var("PI_LOG").and_then(|v| LogLevel::parse_env(&v));
        match explicit {
            Some(level) => config.level = level,
            None => config.directives = var("RUST_LOG").filter(|d| !d.trim().is_empty()),
        }

        if let Some(format) = var("PI_LOG_FORMAT")
            .and_then(|v| <LogFormat as ValueEnum>::from_str(v.trim(), true).ok())
        {
            config.format = format;
        }
        if var("PI_LOG_TIMESTAMPS").is_some_and(|v| v.trim() == "0") {
            config.timestamps = false;
        }

        if let Some(level) = cli_level {
            config.level = level;
            config.directives = None;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_warn_human() {
        let config = LogConfig::resolve(env(&[]), None, None);
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn pi_log_beats_rust_log() {
        let config = LogConfig::resolve(
            env(&[("PI_LOG", "Debug"), ("RUST_LOG", "pi_core=trace")]),
            None,
            None,
        );
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.directives, None);
    }

    #[test]
    fn rust_log_kept_as_directives() {
        let config = LogConfig::resolve(env(&[("RUST_LOG", "pi_core=debug")]), None, None);
        assert_eq!(config.directives.as_deref(), Some("pi_core=debug"));
        assert_eq!(config.level, LogLevel::Warn);
    }

    #[test]
    fn env_aliases_parse() {
        let config = LogConfig::resolve(
            env(&[("PI_LOG", "warning"), ("PI_LOG_FORMAT", "json"), ("PI_LOG_TIMESTAMPS", "0")]),
            None,
            None,
        );
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert!(!config.timestamps);
    }

    #[test]
    fn unparseable_env_is_ignored() {
        let config = LogConfig::resolve(env(&[("PI_LOG", "loud"), ("PI_LOG_FORMAT", "xml")]), None, None);
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Human);
    }

    #[test]
    fn verbosity_mapping() {
        assert_eq!(LogLevel::from_verbosity(0, false), None);
        assert_eq!(LogLevel::from_verbosity(1, false), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_verbosity(2, false), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_verbosity(5, false), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_verbosity(2, true), Some(LogLevel::Error));
    }

    #[test]
    fn cli_overrides_win() {
        let config = LogConfig::resolve(
            env(&[("PI_LOG", "error"), ("RUST_LOG", "trace")]),
            Some(LogLevel::Trace),
            Some(LogFormat::Jsonl),
        );
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert_eq!(config.directives, None);
    }
}
