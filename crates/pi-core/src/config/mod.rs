//! Configuration loading for pi-core.
//!
//! This module handles:
//! - Config resolution order (CLI > env > XDG > defaults)
//! - Schema validation (shape/type checking via serde)
//! - Semantic validation (threshold ordering, band cut points, weights)
//! - Config snapshot generation for reports

pub use pi_config::{
    resolve_config, validate_config, ConfigPaths, ConfigSnapshot, ConfigSource, EngineConfig,
    ValidationError,
};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::logging::event_names;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Effective configuration with provenance.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: EngineConfig,
    pub snapshot: ConfigSnapshot,
    pub paths: ConfigPaths,
}

/// Load and validate the engine configuration.
///
/// An explicit `cli_path` must exist; every other source is optional and
/// the built-in defaults apply when none is found.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let paths = resolve_config(cli_path);
    let Some(path) = paths.engine.clone() else {
        let config = EngineConfig::default();
        debug!(event = event_names::CONFIG_DEFAULT_USED, "using built-in engine config");
        return Ok(LoadedConfig {
            snapshot: ConfigSnapshot::from_defaults(&config),
            config,
            paths,
        });
    };

    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config: EngineConfig =
        serde_json::from_str(&raw).map_err(|source| ConfigError::ParseError {
            path: path.clone(),
            source,
        })?;
    validate_config(&config)?;

    let snapshot = ConfigSnapshot::new(&config, &paths, &raw);
    info!(
        event = event_names::CONFIG_LOADED,
        path = %path.display(),
        source = %paths.engine_source,
        hash = snapshot.short_id(),
        "engine config loaded"
    );
    Ok(LoadedConfig {
        config,
        snapshot,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn explicit_missing_path_is_not_found() {
        let err = load_config(Some(Path::new("/nonexistent/engine.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn explicit_path_is_loaded_and_hashed() {
        let file = write_config(r#"{"anomaly": {"warning_pct": 15.0}}"#);
        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.config.anomaly.warning_pct, 15.0);
        assert_eq!(loaded.paths.engine_source, ConfigSource::CliArgument);
        assert_eq!(loaded.snapshot.hash.len(), 64);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let file = write_config("{ not json");
        assert!(matches!(
            load_config(Some(file.path())).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let file = write_config(r#"{"anomaly": {"warning_pct": 30.0, "critical_pct": 20.0}}"#);
        assert!(matches!(
            load_config(Some(file.path())).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }
}
