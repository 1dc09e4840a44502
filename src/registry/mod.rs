//! API Definition Registry
//!
//! In-memory catalog of [`ApiDefinition`]s keyed by id. The registry is an
//! explicit object owned by the startup context and shared by reference
//! (`Arc<ApiRegistry>`) with the client, the capability executor and the
//! `AnyAPI` provider.
//!
//! # Concurrency
//!
//! Definitions are published as `Arc<ApiDefinition>` and never mutated
//! afterwards, so a reader holding one can never observe a partially
//! constructed entry. Duplicate detection and insertion happen under a
//! single write lock: of N concurrent registrations of the same id exactly
//! one succeeds and the rest get [`Error::DuplicateApiRegistration`].

pub mod builtin;
mod definition;

pub use definition::*;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::{Error, Result};

/// Registry of API definitions
#[derive(Default)]
pub struct ApiRegistry {
    definitions: RwLock<HashMap<String, Arc<ApiDefinition>>>,
}

impl ApiRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in definition
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut defs = registry.definitions.write();
            for def in builtin::definitions() {
                defs.insert(def.id.clone(), Arc::new(def));
            }
        }
        registry
    }

    /// Create a registry holding only the named built-in definitions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an id does not name a built-in.
    pub fn curated(ids: &[String]) -> Result<Self> {
        let builtins = builtin::definitions();
        let registry = Self::new();
        for id in ids {
            let def = builtins
                .iter()
                .find(|d| &d.id == id)
                .cloned()
                .ok_or_else(|| Error::Config(format!("Curated API '{id}' is not a built-in")))?;
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Register a definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] if the definition violates its
    /// invariants, or [`Error::DuplicateApiRegistration`] if the id is taken.
    pub fn register(&self, definition: ApiDefinition) -> Result<Arc<ApiDefinition>> {
        definition.validate()?;

        let definition = Arc::new(definition);
        {
            let mut defs = self.definitions.write();
            if defs.contains_key(&definition.id) {
                return Err(Error::DuplicateApiRegistration(definition.id.clone()));
            }
            defs.insert(definition.id.clone(), Arc::clone(&definition));
        }

        info!(
            api_id = %definition.id,
            endpoints = definition.endpoints.len(),
            "Registered API definition"
        );
        Ok(definition)
    }

    /// Look up a definition by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<ApiDefinition>> {
        self.definitions.read().get(id).cloned()
    }

    /// Look up a definition, failing with the list of known ids.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownApi`] if no definition has this id.
    pub fn require(&self, id: &str) -> Result<Arc<ApiDefinition>> {
        self.get(id).ok_or_else(|| {
            debug!(api_id = %id, "Unknown API requested");
            Error::UnknownApi {
                id: id.to_string(),
                available: self.ids(),
            }
        })
    }

    /// Whether an id is registered
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.definitions.read().contains_key(id)
    }

    /// Registered ids, sorted
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.definitions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All definitions, sorted by id
    #[must_use]
    pub fn list(&self) -> Vec<Arc<ApiDefinition>> {
        let mut defs: Vec<Arc<ApiDefinition>> =
            self.definitions.read().values().cloned().collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs
    }

    /// Case-insensitive substring search over id, name and description
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<Arc<ApiDefinition>> {
        let needle = term.to_lowercase();
        self.list()
            .into_iter()
            .filter(|d| {
                d.id.to_lowercase().contains(&needle)
                    || d.name.to_lowercase().contains(&needle)
                    || d.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Counts for operational visibility
    #[must_use]
    pub fn summary(&self) -> RegistrySummary {
        let defs = self.list();
        let authenticated = defs.iter().filter(|d| d.requires_auth).count();
        RegistrySummary {
            total: defs.len(),
            public: defs.len() - authenticated,
            authenticated,
            apis: defs
                .iter()
                .map(|d| ApiSummary {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    requires_auth: d.requires_auth,
                    endpoints: d.endpoints.len(),
                    rate_limit: d.rate_limit.as_ref().map(ToString::to_string),
                })
                .collect(),
        }
    }

    /// Number of definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.read().len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.read().is_empty()
    }
}

/// Registry counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySummary {
    /// All definitions
    pub total: usize,
    /// Definitions without `requiresAuth`
    pub public: usize,
    /// Definitions with `requiresAuth`
    pub authenticated: usize,
    /// Per-definition detail
    pub apis: Vec<ApiSummary>,
}

/// Per-definition line of a [`RegistrySummary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// Definition id
    pub id: String,
    /// Display name
    pub name: String,
    /// Whether a token is required
    pub requires_auth: bool,
    /// Endpoint count
    pub endpoints: usize,
    /// Advisory rate limit, rendered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<String>,
}
