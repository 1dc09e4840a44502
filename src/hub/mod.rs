//! Orchestrator/Hub
//!
//! Maps provider names to live [`Provider`]s and routes
//! `(server, tool, arguments)` requests to them.
//!
//! Every action gets a trace id, a timing measurement, a pair of lifecycle
//! events and a usage counter. Routing failures (`UnknownProvider`,
//! `UnknownTool`, `CapabilityDenied`) are errors; failures inside a tool
//! become an envelope with `success: false`.
//!
//! `max_concurrent_actions` is reported in [`HubStatus`] but not enforced.

mod events;
mod stats;
pub mod trace;

pub use events::HubEvent;
pub use stats::{StatsSnapshot, ToolStats, UsageStats};

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::capability::{AllowAll, CapabilityGate};
use crate::config::HubConfig;
use crate::error::ErrorBody;
use crate::provider::{Provider, ProviderHealth, Tool};
use crate::{Error, Result};

/// Argument keys whose values never appear in envelopes, matched with `-` and `_` removed
const REDACTED_KEYS: &[&str] = &["token", "secret", "password", "authorization", "apikey", "cookie", "credential"];

/// Header names whose values are echoed; every other header value is masked
const VISIBLE_HEADERS: &[&str] = &["accept", "accept-language", "content-type", "user-agent"];

/// Routes tool calls to registered providers
pub struct Hub {
    providers: DashMap<String, Arc<dyn Provider>>,
    gate: Arc<dyn CapabilityGate>,
    events: broadcast::Sender<HubEvent>,
    stats: UsageStats,
    config: HubConfig,
}

/// A tool tagged with its owning provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderTool {
    /// Provider name
    pub provider: String,
    /// The tool
    pub tool: Tool,
}

/// Result envelope of [`Hub::execute_action`]
#[derive(Debug, Clone, Serialize)]
pub struct ActionEnvelope {
    /// Provider name
    pub server: String,
    /// Tool name
    pub tool: String,
    /// Arguments as received, credentials redacted
    pub arguments: Value,
    /// Tool output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// False if the tool failed or its response says `success: false`
    pub success: bool,
    /// Tool failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    /// Trace and timing
    pub metadata: ActionMetadata,
}

/// Envelope metadata
#[derive(Debug, Clone, Serialize)]
pub struct ActionMetadata {
    /// `hub-<uuid>`
    pub trace_id: String,
    /// Wall-clock execution time
    pub execution_time_ms: u64,
    /// Dispatch time
    pub timestamp: DateTime<Utc>,
}

/// Aggregate health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HubHealth {
    /// Every provider is healthy
    Healthy,
    /// At least one provider is not healthy
    Degraded,
    /// No providers registered
    Idle,
}

/// Per-provider line of [`HubStatus`]
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Provider name
    pub name: String,
    /// Provider version
    pub version: String,
    /// Declared tool count
    pub tools: usize,
    /// Health check result
    pub health: ProviderHealth,
}

/// Snapshot returned by [`Hub::get_hub_status`]
#[derive(Debug, Clone, Serialize)]
pub struct HubStatus {
    /// Registered providers
    pub servers: usize,
    /// Tools across all providers
    pub total_tools: usize,
    /// Aggregate health
    pub health: HubHealth,
    /// Configured limit (advisory, not enforced)
    pub max_concurrent_actions: usize,
    /// Per-provider detail, sorted by name
    pub providers: Vec<ProviderStatus>,
    /// Usage counters
    pub stats: StatsSnapshot,
}

impl Hub {
    /// Create an empty hub that allows every tool
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        Self {
            providers: DashMap::new(),
            gate: Arc::new(AllowAll),
            events,
            stats: UsageStats::new(),
            config,
        }
    }

    /// Replace the license gate (consulted with `server:tool`)
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn CapabilityGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Receive lifecycle events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: HubEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Initialize and store a provider.
    ///
    /// # Errors
    ///
    /// [`Error::ProviderInit`] if `initialize()` fails (nothing is stored), or
    /// [`Error::ProviderAlreadyRegistered`] if the name is taken (the existing
    /// provider is kept).
    pub async fn register_server(&self, provider: Arc<dyn Provider>) -> Result<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(Error::ProviderAlreadyRegistered(name));
        }

        provider.initialize().await.map_err(|e| Error::ProviderInit {
            provider: name.clone(),
            reason: e.to_string(),
        })?;

        let tools = provider.tools().len();
        let inserted = match self.providers.entry(name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&provider));
                true
            }
        };
        if !inserted {
            // Lost a registration race after initializing; undo.
            if let Err(e) = provider.shutdown().await {
                warn!(server = %name, error = %e, "Shutdown after duplicate registration failed");
            }
            return Err(Error::ProviderAlreadyRegistered(name));
        }

        info!(server = %name, tools, "Provider registered");
        self.emit(HubEvent::ServerRegistered { server: name, tools });
        Ok(())
    }

    /// Shut down and remove a provider.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProvider`] if no provider has this name. A failing
    /// `shutdown()` is logged; the provider is removed regardless.
    pub async fn unregister_server(&self, name: &str) -> Result<()> {
        let (name, provider) = self
            .providers
            .remove(name)
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))?;

        if let Err(e) = provider.shutdown().await {
            warn!(server = %name, error = %e, "Provider shutdown failed");
        }

        info!(server = %name, "Provider unregistered");
        self.emit(HubEvent::ServerUnregistered { server: name });
        Ok(())
    }

    /// Unregister every provider
    pub async fn shutdown_all(&self) {
        let names: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        for name in names {
            // Concurrent removal is not an error here.
            let _ = self.unregister_server(&name).await;
        }
    }

    /// Look up a provider
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).map(|p| Arc::clone(p.value()))
    }

    /// Registered provider names, sorted
    #[must_use]
    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Every provider's tools, tagged with the provider name
    #[must_use]
    pub fn get_all_tools(&self) -> Vec<ProviderTool> {
        self.server_names()
            .into_iter()
            .filter_map(|name| self.provider(&name).map(|p| (name, p)))
            .flat_map(|(name, provider)| {
                provider.tools().into_iter().map(move |tool| ProviderTool {
                    provider: name.clone(),
                    tool,
                })
            })
            .collect()
    }

    /// Route a tool call.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownProvider`], [`Error::UnknownTool`] or
    /// [`Error::CapabilityDenied`]. Failures inside the tool are reported in
    /// the envelope instead.
    pub async fn execute_action(
        &self,
        server: &str,
        tool: &str,
        arguments: Value,
    ) -> Result<ActionEnvelope> {
        let provider = self
            .provider(server)
            .ok_or_else(|| Error::UnknownProvider(server.to_string()))?;
        if !provider.tools().iter().any(|t| t.name == tool) {
            return Err(Error::UnknownTool {
                provider: server.to_string(),
                tool: tool.to_string(),
            });
        }
        let gate_id = format!("{server}:{tool}");
        if !self.gate.is_allowed(&gate_id) {
            return Err(Error::CapabilityDenied(gate_id));
        }

        let trace_id = trace::generate();
        let timestamp = Utc::now();
        let redacted = redact(&arguments);
        self.emit(HubEvent::ToolCalled {
            server: server.to_string(),
            tool: tool.to_string(),
            trace_id: trace_id.clone(),
            timestamp,
        });

        let span = info_span!("execute_action", server, tool, trace_id = %trace_id);
        let started = Instant::now();
        let outcome = trace::with_trace_id(trace_id.clone(), provider.call_tool(tool, arguments))
            .instrument(span)
            .await;
        let execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (success, response, error) = match outcome {
            Ok(response) => {
                let success = response
                    .get("success")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                self.emit(HubEvent::ToolCompleted {
                    server: server.to_string(),
                    tool: tool.to_string(),
                    trace_id: trace_id.clone(),
                    success,
                    execution_time_ms,
                });
                (success, Some(response), None)
            }
            Err(e) => {
                debug!(server, tool, trace_id = %trace_id, kind = e.kind(), error = %e, "Tool failed");
                self.emit(HubEvent::ToolError {
                    server: server.to_string(),
                    tool: tool.to_string(),
                    trace_id: trace_id.clone(),
                    error: e.to_string(),
                    execution_time_ms,
                });
                (false, None, Some(ErrorBody::from(&e)))
            }
        };

        self.stats.record(server, tool, success, execution_time_ms);
        info!(server, tool, trace_id = %trace_id, success, elapsed_ms = execution_time_ms, "Action finished");

        Ok(ActionEnvelope {
            server: server.to_string(),
            tool: tool.to_string(),
            arguments: redacted,
            response,
            success,
            error,
            metadata: ActionMetadata {
                trace_id,
                execution_time_ms,
                timestamp,
            },
        })
    }

    /// Provider count, tool counts, health and usage
    pub async fn get_hub_status(&self) -> HubStatus {
        let probes = self
            .server_names()
            .into_iter()
            .filter_map(|name| self.provider(&name).map(|p| (name, p)))
            .map(|(name, provider)| async move {
                ProviderStatus {
                    version: provider.version().to_string(),
                    tools: provider.tools().len(),
                    health: provider.health().await,
                    name,
                }
            });
        let providers = join_all(probes).await;

        let health = if providers.is_empty() {
            HubHealth::Idle
        } else if providers.iter().all(|p| p.health.is_healthy()) {
            HubHealth::Healthy
        } else {
            HubHealth::Degraded
        };

        HubStatus {
            servers: providers.len(),
            total_tools: providers.iter().map(|p| p.tools).sum(),
            health,
            max_concurrent_actions: self.config.max_concurrent_actions,
            providers,
            stats: self.stats.snapshot(),
        }
    }
}

fn is_sensitive(key: &str) -> bool {
    let key: String = key
        .chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect();
    REDACTED_KEYS.iter().any(|k| key.contains(k))
}

fn mask() -> Value {
    Value::String("[REDACTED]".to_string())
}

/// Copy of `value` with credential-like keys masked, at any depth.
/// Values under a `headers` object are masked unless the header is known harmless.
fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match v {
                        _ if is_sensitive(k) => mask(),
                        Value::Object(headers) if k.eq_ignore_ascii_case("headers") => {
                            Value::Object(redact_headers(headers))
                        }
                        _ => redact(v),
                    };
                    (k.clone(), v)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn redact_headers(headers: &Map<String, Value>) -> Map<String, Value> {
    headers
        .iter()
        .map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            let value = if VISIBLE_HEADERS.contains(&lower.as_str()) {
                value.clone()
            } else {
                mask()
            };
            (name.clone(), value)
        })
        .collect()
}
