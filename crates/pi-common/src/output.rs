//! Report formats shared by every pi-core command.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How a command renders its payload on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty JSON inside a run envelope, for dashboards and scripts.
    #[default]
    Json,
    /// Markdown tables; missing values render as an em-dash.
    #[value(alias = "markdown")]
    Md,
    /// A single status line.
    Summary,
}

impl OutputFormat {
    /// True for formats meant to be read by a person.
    pub fn is_human(self) -> bool {
        !matches!(self, OutputFormat::Json)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Md => "md",
            OutputFormat::Summary => "summary",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
