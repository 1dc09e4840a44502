//! Lifecycle events published by the hub.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Something that happened in the hub
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum HubEvent {
    /// A provider was initialized and stored
    #[serde(rename = "server.registered")]
    ServerRegistered {
        /// Provider name
        server: String,
        /// Declared tool count
        tools: usize,
    },
    /// A provider was shut down and removed
    #[serde(rename = "server.unregistered")]
    ServerUnregistered {
        /// Provider name
        server: String,
    },
    /// An action was dispatched to a provider
    #[serde(rename = "tool.called")]
    ToolCalled {
        /// Provider name
        server: String,
        /// Tool name
        tool: String,
        /// Action trace id
        trace_id: String,
        /// Dispatch time
        timestamp: DateTime<Utc>,
    },
    /// The tool returned
    #[serde(rename = "tool.completed")]
    ToolCompleted {
        /// Provider name
        server: String,
        /// Tool name
        tool: String,
        /// Action trace id
        trace_id: String,
        /// Whether the response reported success
        success: bool,
        /// Execution time
        execution_time_ms: u64,
    },
    /// The tool failed
    #[serde(rename = "tool.error")]
    ToolError {
        /// Provider name
        server: String,
        /// Tool name
        tool: String,
        /// Action trace id
        trace_id: String,
        /// Error message
        error: String,
        /// Execution time
        execution_time_ms: u64,
    },
}

impl HubEvent {
    /// Dotted event name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServerRegistered { .. } => "server.registered",
            Self::ServerUnregistered { .. } => "server.unregistered",
            Self::ToolCalled { .. } => "tool.called",
            Self::ToolCompleted { .. } => "tool.completed",
            Self::ToolError { .. } => "tool.error",
        }
    }
}
