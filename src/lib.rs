//! AnyAPI Hub Library
//!
//! Schema-validated invocation of external REST APIs behind a
//! multi-provider tool hub.
//!
//! # Features
//!
//! - **API Registry**: built-in and runtime-registered REST API definitions
//! - **API Client**: validated request building with auth injection
//! - **Capability Wrapper**: `apiId.endpointName` actions over a curated set
//! - **AnyAPI Provider**: `make_api_call`, `list_available_apis`,
//!   `get_api_documentation`, `add_custom_api`
//! - **Hub**: provider lifecycle, routing, trace ids, events and usage stats

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capability;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod hub;
pub mod provider;
pub mod registry;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` overrides `level` when set.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output on stdout stays machine-readable.
    match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}
