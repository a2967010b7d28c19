//! Tracing setup for the binaries

use std::str::FromStr;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use rigstream_core::RigError;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for terminals
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(RigError::Config(format!("unknown log format '{}'", other))),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), RigError> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());
    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| RigError::Config(format!("tracing init failed: {}", e)))
}
