//! Structured logging for pi-core.
//!
//! Human-readable lines for interactive use, JSON lines for pipelines that
//! feed dashboards. stdout carries command payloads only; every log line
//! goes to stderr.

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter for a resolved config: raw `RUST_LOG` directives when present,
/// otherwise `level` applied to the pi crates only.
fn build_filter(config: &LogConfig) -> EnvFilter {
    match &config.directives {
        Some(directives) => EnvFilter::builder().parse_lossy(directives),
        None => EnvFilter::builder().parse_lossy(format!(
            "off,pi_core={lvl},pi_config={lvl}",
            lvl = config.level
        )),
    }
}

/// Install the global subscriber.
///
/// Call once at startup; a second call leaves the first subscriber in place.
pub fn init_logging(config: &LogConfig) {
    let layer = match config.format {
        LogFormat::Human => {
            let human = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                human.boxed()
            } else {
                human.without_time().boxed()
            }
        }
        LogFormat::Jsonl => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(layer.with_filter(build_filter(config)))
        .try_init()
    {
        eprintln!("logging already initialized: {}", e);
    }
}

/// Short correlation id for one CLI invocation: `run-` plus 12 hex digits.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}
