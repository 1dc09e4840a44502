//! License gate consulted before any capability or tool executes.

use std::collections::HashSet;

/// Allow/deny decision for a capability or tool id
pub trait CapabilityGate: Send + Sync + 'static {
    /// Whether `id` may execute
    fn is_allowed(&self, id: &str) -> bool;
}

/// Allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CapabilityGate for AllowAll {
    fn is_allowed(&self, _id: &str) -> bool {
        true
    }
}

/// Allows only listed ids
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    allowed: HashSet<String>,
}

impl AllowList {
    /// Gate allowing exactly `ids`
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl CapabilityGate for AllowList {
    fn is_allowed(&self, id: &str) -> bool {
        self.allowed.contains(id)
    }
}
