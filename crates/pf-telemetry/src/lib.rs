//! # PF Telemetry
//!
//! Logging bootstrap for binaries embedding the ordered collections engine.
//! Library crates only emit `tracing` events; installing a subscriber is
//! done once, here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pf_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PF_SERVICE_NAME` | `ordered-collections` | Service name in log lines |
//! | `PF_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `PF_JSON_LOGS` | `false` (`true` in containers) | JSON output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
