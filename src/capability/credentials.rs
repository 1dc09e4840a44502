//! Credential resolution.
//!
//! The core never stores or decrypts secrets; it asks a [`CredentialSource`]
//! for a resolved string at execution time and forgets it afterwards.

use std::collections::HashMap;

use async_trait::async_trait;

/// Resolves the secret for an API on behalf of an agent
#[async_trait]
pub trait CredentialSource: Send + Sync + 'static {
    /// Resolved secret, or `None` if not configured
    async fn resolve(&self, agent_id: Option<&str>, api_id: &str) -> Option<String>;

    /// Where the secret is expected, for "not configured" errors
    fn describe(&self, api_id: &str) -> String;
}

/// Environment variable holding the key of `api_id`: `{APIID_UPPERCASE}_API_KEY`.
///
/// Characters outside `[A-Za-z0-9]` become `_`.
#[must_use]
pub fn env_var_name(api_id: &str) -> String {
    let stem: String = api_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_API_KEY")
}

/// Reads `{APIID_UPPERCASE}_API_KEY` from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

#[async_trait]
impl CredentialSource for EnvCredentials {
    async fn resolve(&self, _agent_id: Option<&str>, api_id: &str) -> Option<String> {
        std::env::var(env_var_name(api_id))
            .ok()
            .filter(|v| !v.trim().is_empty())
    }

    fn describe(&self, api_id: &str) -> String {
        env_var_name(api_id)
    }
}

/// Fixed map of api id to secret
#[derive(Default)]
pub struct StaticCredentials {
    secrets: HashMap<String, String>,
}

impl StaticCredentials {
    /// Empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret for `api_id`
    #[must_use]
    pub fn with(mut self, api_id: &str, secret: &str) -> Self {
        self.secrets.insert(api_id.to_string(), secret.to_string());
        self
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn resolve(&self, _agent_id: Option<&str>, api_id: &str) -> Option<String> {
        self.secrets.get(api_id).cloned()
    }

    fn describe(&self, api_id: &str) -> String {
        env_var_name(api_id)
    }
}
