//! Subscriber settings: how much of a run is reported and in which encoding.
//!
//! `DBN_LOG` picks the verbosity and `DBN_LOG_FORMAT` the encoding. A valid
//! `RUST_LOG` filter overrides the verbosity directive entirely.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Encoding of emitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line, span fields flattened in.
    Jsonl,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// How much of a learning or generation run is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    /// Run boundaries, structural EM rounds and imputation summaries.
    #[default]
    Runs,
    /// Also score searches, branchings, CPT estimation and parameter EM steps.
    Steps,
    Trace,
}

impl Verbosity {
    /// `EnvFilter` directive for this crate's events.
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "dbn_core=off",
            Verbosity::Runs => "dbn_core=info",
            Verbosity::Steps => "dbn_core=debug",
            Verbosity::Trace => "dbn_core=trace",
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(Verbosity::Quiet),
            "runs" | "info" => Ok(Verbosity::Runs),
            "steps" | "debug" => Ok(Verbosity::Steps),
            "trace" => Ok(Verbosity::Trace),
            other => Err(format!("unknown verbosity '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub verbosity: Verbosity,
    /// Human output only.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            verbosity: Verbosity::Runs,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Settings from `DBN_LOG` and `DBN_LOG_FORMAT`; unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = LogConfig::default();
        if let Some(verbosity) = var("DBN_LOG").and_then(|v| v.parse().ok()) {
            config.verbosity = verbosity;
        }
        if let Some(format) = var("DBN_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        config
    }

    /// `RUST_LOG` when it holds a valid filter, otherwise the verbosity directive.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.verbosity.directive()))
    }
}
