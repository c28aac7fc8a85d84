//! End-to-end CLI tests for pi-core.
//!
//! Every test runs the real binary against the shared fixtures with config
//! lookup isolated from the host environment.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
}

fn catalog() -> PathBuf {
    fixtures_dir().join("catalog.json")
}

/// Get a Command for the pi-core binary with a clean config environment.
fn pi_core() -> Command {
    let mut cmd = Command::cargo_bin("pi-core").expect("pi-core binary should exist");
    cmd.env_remove("PI_DATA")
        .env_remove("PRICE_INTEL_CONFIG")
        .env_remove("PRICE_INTEL_CONFIG_DIR")
        .env_remove("PI_LOG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent/pi-core-tests");
    cmd
}

fn with_catalog() -> Command {
    let mut cmd = pi_core();
    cmd.arg("--data").arg(catalog());
    cmd
}

fn json_result(output: &[u8]) -> Value {
    let v: Value = serde_json::from_slice(output).expect("stdout is JSON");
    v["result"].clone()
}

// ============================================================================
// Query commands
// ============================================================================

mod queries {
    use super::*;

    #[test]
    fn material_reports_best_vendor() {
        let out = with_catalog()
            .args(["material", "MAT-STUD-2x4"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let result = json_result(&out);
        assert_eq!(result["best"]["vendor"], "VA");
        assert_eq!(result["best"]["price"], 3.85);
        assert_eq!(result["quotes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn material_envelope_has_run_metadata() {
        let out = with_catalog()
            .args(["material", "MAT-STUD-2x4"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let v: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["command"], "material");
        assert!(v["run_id"].as_str().is_some());
        assert_eq!(v["config_hash"].as_str().unwrap().len(), 12);
    }

    #[test]
    fn material_without_quotes_renders_dash_in_md() {
        with_catalog()
            .args(["-f", "md", "material", "MAT-OSB-716"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Best price: —"))
            .stdout(predicate::str::contains("Confidence: — (no quotes)"));
    }

    #[test]
    fn material_without_quotes_has_null_band_in_json() {
        let out = with_catalog()
            .args(["material", "MAT-OSB-716"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let result = json_result(&out);
        assert!(result["band"].is_null());
        assert!(result["best"].is_null());
    }

    #[test]
    fn unknown_material_is_data_error() {
        with_catalog()
            .args(["material", "MAT-NOPE"])
            .assert()
            .code(12)
            .stderr(predicate::str::contains("\"code\":20"));
    }

    #[test]
    fn blank_material_id_is_args_error() {
        with_catalog().args(["material", "  "]).assert().code(10);
    }

    #[test]
    fn list_by_category() {
        with_catalog()
            .args(["-f", "summary", "list", "--category", "lumber"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 materials in lumber"));
    }

    #[test]
    fn rank_drywall() {
        with_catalog()
            .args(["-f", "summary", "rank", "drywall"])
            .assert()
            .success()
            .stdout(predicate::str::contains("drywall: 3 ranked"));
    }
}

// ============================================================================
// Anomalies, savings, forecasts
// ============================================================================

mod analysis {
    use super::*;

    #[test]
    fn anomalies_exit_one_when_flagged() {
        let out = with_catalog()
            .args(["anomalies", "--as-of", "2024-06-15"])
            .assert()
            .code(1)
            .get_output()
            .stdout
            .clone();
        let result = json_result(&out);
        assert_eq!(result["anomalies"].as_array().unwrap().len(), 5);
        assert_eq!(result["anomalies"][0]["severity"], "critical");
    }

    #[test]
    fn anomalies_severity_filter() {
        with_catalog()
            .args(["-f", "summary", "anomalies", "--severity", "critical", "--as-of", "2024-06-15"])
            .assert()
            .code(1)
            .stdout(predicate::str::starts_with("1 anomalies"));
    }

    #[test]
    fn savings_for_documented_job() {
        let out = with_catalog()
            .args(["savings", "--job", "J-1042"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let result = json_result(&out);
        assert_eq!(result["total_savings"], 8589.0);
        assert_eq!(result["actual_total"], 22347.0);
    }

    #[test]
    fn savings_job_conflicts_with_range() {
        with_catalog()
            .args(["savings", "--job", "J-1042", "--from", "2024-01-01"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }

    #[test]
    fn savings_empty_range_is_args_error() {
        with_catalog()
            .args(["savings", "--from", "2024-06-01", "--to", "2024-01-01"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("empty date range"));
    }

    #[test]
    fn savings_by_category_md() {
        with_catalog()
            .args(["-f", "md", "savings", "--by", "category"])
            .assert()
            .success()
            .stdout(predicate::str::contains("# Savings by category"));
    }

    #[test]
    fn forecast_lumber_up() {
        with_catalog()
            .args(["-f", "summary", "forecast", "lumber"])
            .assert()
            .success()
            .stdout(predicate::str::contains("lumber: up"));
    }

    #[test]
    fn forecast_short_history_is_data_error() {
        with_catalog()
            .args(["forecast", "steel"])
            .assert()
            .code(12)
            .stderr(predicate::str::contains("\"code\":33"));
    }

    #[test]
    fn forecast_short_history_summary_shows_missing() {
        with_catalog()
            .args(["--format", "summary", "forecast", "steel"])
            .assert()
            .code(12)
            .stdout(predicate::str::starts_with("—"));
    }
}

// ============================================================================
// Mutating commands
// ============================================================================

mod mutations {
    use super::*;

    #[test]
    fn ingest_reports_rejections_and_writes_dataset() {
        let dir = TempDir::new().unwrap();
        let written = dir.path().join("updated.json");
        let out = with_catalog()
            .arg("ingest")
            .arg(fixtures_dir().join("quotes.json"))
            .arg("--output")
            .arg(&written)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let result = json_result(&out);
        assert_eq!(result["unconverted"], 1);
        assert_eq!(result["failed"].as_array().unwrap().len(), 3);
        assert_eq!(result["failed"][0]["error"]["code"], 30);

        pi_core()
            .arg("--data")
            .arg(&written)
            .args(["material", "MAT-STUD-2x4"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"rising\""));
    }

    #[test]
    fn ingest_missing_file_is_io_error() {
        with_catalog()
            .args(["ingest", "/nonexistent/quotes.json"])
            .assert()
            .code(21);
    }

    #[test]
    fn recompute_summary() {
        with_catalog()
            .args(["-f", "summary", "recompute"])
            .assert()
            .success()
            .stdout(predicate::str::contains("4 materials, 1 skipped"));
    }
}

// ============================================================================
// Config, check and argument errors
// ============================================================================

mod setup {
    use super::*;

    #[test]
    fn missing_dataset_is_args_error() {
        pi_core()
            .args(["material", "MAT-STUD-2x4"])
            .assert()
            .code(10)
            .stderr(predicate::str::contains("--data"));
    }

    #[test]
    fn missing_config_path_is_args_error() {
        with_catalog()
            .args(["--config", "/nonexistent/engine.json", "list"])
            .assert()
            .code(10);
    }

    #[test]
    fn invalid_config_is_config_error() {
        with_catalog()
            .arg("--config")
            .arg(fixtures_dir().join("config").join("invalid_engine_thresholds.json"))
            .arg("list")
            .assert()
            .code(11);
    }

    #[test]
    fn config_defaults_in_md() {
        pi_core()
            .args(["-f", "md", "config"])
            .assert()
            .success()
            .stdout(predicate::str::contains("built-in defaults"));
    }

    #[test]
    fn config_from_file_reports_cli_source() {
        pi_core()
            .arg("--config")
            .arg(fixtures_dir().join("config").join("valid_engine.json"))
            .args(["-f", "summary", "config"])
            .assert()
            .success()
            .stdout(predicate::str::contains("CLI argument"));
    }

    #[test]
    fn check_with_dataset() {
        with_catalog()
            .args(["-f", "summary", "check"])
            .assert()
            .success()
            .stdout(predicate::str::contains("5 materials"));
    }

    #[test]
    fn check_without_dataset() {
        pi_core()
            .args(["-f", "summary", "check"])
            .assert()
            .success()
            .stdout(predicate::str::contains("no dataset"));
    }

    #[test]
    fn unknown_command_fails() {
        pi_core()
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn help_lists_engine_and_setup_commands() {
        let mut assert = pi_core().arg("--help").assert().success();
        for command in [
            "material", "list", "anomalies", "savings", "rank", "forecast", "ingest",
            "recompute", "check", "config",
        ] {
            assert = assert.stdout(predicate::str::contains(command));
        }
    }
}
