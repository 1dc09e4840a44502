//! Configuration management

use std::{path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::registry::ApiDefinition;
use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving credentials.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    pub env_files: Vec<String>,
    /// Outbound HTTP client configuration
    pub client: ClientConfig,
    /// Hub configuration
    pub hub: HubConfig,
    /// Capability wrapper configuration
    pub capabilities: CapabilityConfig,
    /// Additional API definitions registered at startup
    pub custom_apis: Vec<ApiDefinition>,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Deadline for a single upstream call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Upper bound on a response body; larger bodies fail with a transport error
    pub max_response_bytes: usize,
    /// User-Agent sent when a definition does not set one
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_response_bytes: 10 * 1024 * 1024, // 10MB
            user_agent: format!("anyapi-hub/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Advisory only: reported in hub status, not enforced
    pub max_concurrent_actions: usize,
    /// Capacity of the lifecycle event channel
    pub event_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_concurrent_actions: 10,
            event_buffer: 256,
        }
    }
}

/// Capability wrapper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Built-in API ids admitted to the curated capability set
    pub curated: Vec<String>,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            curated: ["coingecko", "openweather", "restcountries", "github"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // ANYAPI_HUB_CLIENT__TIMEOUT=10s -> client.timeout
        figment = figment.merge(Env::prefixed("ANYAPI_HUB_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        config.load_env_files();

        Ok(config)
    }

    /// Reject values that would make the hub unusable
    fn validate(&self) -> Result<()> {
        if self.client.timeout.is_zero() {
            return Err(Error::Config("client.timeout must be greater than zero".to_string()));
        }
        if self.client.max_response_bytes == 0 {
            return Err(Error::Config(
                "client.max_response_bytes must be greater than zero".to_string(),
            ));
        }
        if self.hub.event_buffer == 0 {
            return Err(Error::Config("hub.event_buffer must be greater than zero".to_string()));
        }
        Ok(())
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = if path_str.starts_with('~') {
                if let Some(home) = dirs::home_dir() {
                    path_str.replacen('~', &home.display().to_string(), 1)
                } else {
                    path_str.clone()
                }
            } else {
                path_str.clone()
            };

            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => {
                        tracing::info!("Loaded env file: {expanded}");
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load env file {expanded}: {e}");
                    }
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }
}
