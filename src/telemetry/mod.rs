//! Tracing subscriber setup.
//!
//! Diagnostics from the expansion engine (depth budget hits, unknown
//! filters, bad filter arguments) are emitted as `tracing` events; this
//! module installs the subscriber that renders them.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Filter directives, overrides `log.level` | unset |
//! | `LOG__LEVEL` | Filter directive when `RUST_LOG` is unset | `info` |
//! | `LOG__JSON` | Emit JSON lines | `false` |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Telemetry-specific error type
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Invalid log filter directive: {0}")]
    InvalidFilter(String),
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

fn build_filter(config: &LogConfig) -> TelemetryResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| TelemetryError::InvalidFilter(e.to_string())),
    }
}

/// Initialize the global tracing subscriber.
///
/// Uses `RUST_LOG` when set, otherwise `config.level`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> TelemetryResult<()> {
    let env_filter = build_filter(config)?;

    let result = if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
}
