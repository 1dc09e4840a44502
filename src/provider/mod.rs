//! Provider abstraction: named bundles of schema-described tools.
//!
//! A [`Provider`] owns a set of [`Tool`]s and an initialize/shutdown
//! lifecycle. The [`Hub`](crate::hub::Hub) routes `(provider, tool,
//! arguments)` requests to it.
//!
//! ```text
//! ┌──────────┐  execute_action   ┌──────────────────┐
//! │   Hub    │ ────────────────▶ │ Arc<dyn Provider>│
//! │ (name →) │                   │  AnyApiProvider  │
//! └──────────┘                   └──────────────────┘
//! ```

mod anyapi;
pub mod schema;

pub use anyapi::AnyApiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// A callable unit exposed by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Name, unique within its provider
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema of the arguments object
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Health status for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum ProviderHealth {
    /// Provider is operating normally.
    Healthy,
    /// Provider is degraded but partially operational.
    Degraded(String),
    /// Provider is unavailable.
    Unavailable(String),
}

impl ProviderHealth {
    /// Returns `true` if the provider is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// A source of tools.
///
/// Implementations must be `Send + Sync + 'static` so they can be
/// stored in `Arc<dyn Provider>` and shared across async tasks.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Unique, stable name for this provider instance.
    fn name(&self) -> &str;

    /// Provider version, reported in hub status.
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Tools this provider declares.
    fn tools(&self) -> Vec<Tool>;

    /// Lifecycle hook run once before the provider is stored.
    ///
    /// # Errors
    ///
    /// An error here keeps the provider out of the hub.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Lifecycle hook run once when the provider is removed.
    ///
    /// # Errors
    ///
    /// Errors are logged by the hub; removal proceeds regardless.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    /// Invoke a declared tool with JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if arguments are invalid or the invocation fails.
    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value>;

    /// Health status of this provider.
    async fn health(&self) -> ProviderHealth {
        ProviderHealth::Healthy
    }
}
