//! Usage statistics for hub actions
//!
//! Counts invocations and failures per `server:tool`.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

#[derive(Default)]
struct ToolCounters {
    invocations: AtomicU64,
    failures: AtomicU64,
    total_ms: AtomicU64,
}

/// Usage statistics for the hub
#[derive(Default)]
pub struct UsageStats {
    total_invocations: AtomicU64,
    total_failures: AtomicU64,
    /// key = "server:tool"
    per_tool: DashMap<String, ToolCounters>,
}

impl UsageStats {
    /// Create new statistics tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished action
    pub fn record(&self, server: &str, tool: &str, success: bool, elapsed_ms: u64) {
        self.total_invocations.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_failures.fetch_add(1, Ordering::Relaxed);
        }

        let entry = self.per_tool.entry(format!("{server}:{tool}")).or_default();
        entry.invocations.fetch_add(1, Ordering::Relaxed);
        entry.total_ms.fetch_add(elapsed_ms, Ordering::Relaxed);
        if !success {
            entry.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get snapshot of current statistics, busiest tools first
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut tools: Vec<ToolStats> = self
            .per_tool
            .iter()
            .map(|entry| {
                let key = entry.key().as_str();
                let (server, tool) = key.split_once(':').unwrap_or((key, ""));
                let invocations = entry.invocations.load(Ordering::Relaxed);
                let total_ms = entry.total_ms.load(Ordering::Relaxed);
                ToolStats {
                    server: server.to_string(),
                    tool: tool.to_string(),
                    invocations,
                    failures: entry.failures.load(Ordering::Relaxed),
                    avg_ms: total_ms.checked_div(invocations).unwrap_or(0),
                }
            })
            .collect();
        tools.sort_by(|a, b| b.invocations.cmp(&a.invocations).then_with(|| a.tool.cmp(&b.tool)));

        StatsSnapshot {
            invocations: self.total_invocations.load(Ordering::Relaxed),
            failures: self.total_failures.load(Ordering::Relaxed),
            tools,
        }
    }
}

/// Snapshot of usage statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Total actions
    pub invocations: u64,
    /// Actions that did not succeed
    pub failures: u64,
    /// Per-tool counters
    pub tools: Vec<ToolStats>,
}

/// Counters for one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolStats {
    /// Provider name
    pub server: String,
    /// Tool name
    pub tool: String,
    /// Calls
    pub invocations: u64,
    /// Failed calls
    pub failures: u64,
    /// Mean execution time
    pub avg_ms: u64,
}
