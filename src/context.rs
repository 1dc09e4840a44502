//! Startup wiring
//!
//! Builds the registry, client, provider, hub and capability executor from
//! a [`Config`] and owns them for the life of the process.

use std::sync::Arc;

use tracing::info;

use crate::capability::CapabilityExecutor;
use crate::client::ApiClient;
use crate::config::Config;
use crate::hub::Hub;
use crate::provider::AnyApiProvider;
use crate::registry::ApiRegistry;
use crate::Result;

/// Everything the process shares across requests
pub struct AppContext {
    /// Full registry: built-ins plus `custom_apis`
    pub registry: Arc<ApiRegistry>,
    /// Shared HTTP client
    pub client: ApiClient,
    /// Hub with the `AnyAPI` provider registered
    pub hub: Hub,
    /// Direct execution over the curated set
    pub capabilities: CapabilityExecutor,
}

impl AppContext {
    /// Build and initialize every component.
    ///
    /// # Errors
    ///
    /// Fails on an invalid or duplicate custom API, an unknown curated id, or
    /// if the HTTP client or provider cannot be initialized.
    pub async fn build(config: &Config) -> Result<Self> {
        let registry = Arc::new(ApiRegistry::with_builtins());
        for definition in &config.custom_apis {
            registry.register(definition.clone())?;
        }

        let client = ApiClient::new(&config.client)?;

        let curated = Arc::new(ApiRegistry::curated(&config.capabilities.curated)?);
        let capabilities = CapabilityExecutor::new(curated, client.clone());

        let hub = Hub::new(config.hub.clone());
        hub.register_server(Arc::new(AnyApiProvider::new(
            Arc::clone(&registry),
            client.clone(),
        )))
        .await?;

        info!(
            apis = registry.len(),
            curated = capabilities.curated().len(),
            "AnyAPI Hub ready"
        );

        Ok(Self {
            registry,
            client,
            hub,
            capabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_builds_full_stack() {
        let ctx = AppContext::build(&Config::default()).await.unwrap();
        assert_eq!(ctx.registry.len(), 5);
        assert_eq!(ctx.capabilities.curated().len(), 4);
        assert!(!ctx.capabilities.curated().contains("jsonplaceholder"));
        assert_eq!(ctx.hub.server_names(), vec!["anyapi"]);
        assert_eq!(ctx.hub.get_all_tools().len(), 4);
    }

    #[tokio::test]
    async fn custom_api_colliding_with_builtin_fails() {
        let mut config = Config::default();
        config.custom_apis.push(
            serde_json::from_value(serde_json::json!({
                "id": "github",
                "name": "Shadow",
                "baseUrl": "https://shadow.example.com"
            }))
            .unwrap(),
        );
        let err = AppContext::build(&config).await.err().unwrap();
        assert_eq!(err.kind(), "duplicate_api_registration");
    }
}
