//! Capability Wrapper: direct `apiId.endpointName` execution.
//!
//! Runs against a curated definition set, smaller than the full registry,
//! and shares the [`ApiClient`] request pipeline with `make_api_call`:
//!
//! ```text
//! ActionRequest ──▶ gate ──▶ curated registry ──▶ bind params ──▶ credential
//!                                                                    │
//!                                      ActionResult ◀── ApiClient ◀──┘
//! ```
//!
//! # Security
//!
//! Credentials come from a [`CredentialSource`] at execution time. They are
//! never logged and never returned in results.

mod action;
mod credentials;
mod gate;

pub use action::{Action, ActionRequest, ActionResult};
pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials, env_var_name};
pub use gate::{AllowAll, AllowList, CapabilityGate};

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::client::{ApiCallRequest, ApiClient};
use crate::error::{ErrorBody, ParamLocation};
use crate::registry::{ApiEndpoint, ApiParameter, ApiRegistry};
use crate::{Error, Result};

/// Executes actions against the curated definitions
pub struct CapabilityExecutor {
    curated: Arc<ApiRegistry>,
    client: ApiClient,
    credentials: Arc<dyn CredentialSource>,
    gate: Arc<dyn CapabilityGate>,
}

impl CapabilityExecutor {
    /// Executor reading keys from the environment, with every capability allowed
    pub fn new(curated: Arc<ApiRegistry>, client: ApiClient) -> Self {
        Self {
            curated,
            client,
            credentials: Arc::new(EnvCredentials),
            gate: Arc::new(AllowAll),
        }
    }

    /// Replace the credential source
    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Replace the license gate
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<dyn CapabilityGate>) -> Self {
        self.gate = gate;
        self
    }

    /// The curated definition set
    #[must_use]
    pub fn curated(&self) -> &ApiRegistry {
        &self.curated
    }

    /// Execute an action. Failures are reported in the result, never raised.
    pub async fn execute(&self, request: ActionRequest) -> ActionResult {
        match self.try_execute(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(action = %request.action, kind = e.kind(), error = %e, "Action failed");
                ActionResult::failed(&e)
            }
        }
    }

    async fn try_execute(&self, request: &ActionRequest) -> Result<ActionResult> {
        let action = Action::parse(&request.action)?;
        if !self.gate.is_allowed(&action.api_id) {
            return Err(Error::CapabilityDenied(action.api_id));
        }

        let definition = self.curated.require(&action.api_id)?;
        let endpoint =
            definition
                .endpoint(&action.endpoint)
                .ok_or_else(|| Error::EndpointNotFound {
                    endpoint: action.endpoint.clone(),
                    available: definition.endpoint_names(),
                })?;

        let mut call = bind(&definition.id, endpoint, &request.params)?;

        if definition.requires_auth {
            let token = self
                .credentials
                .resolve(request.agent_id.as_deref(), &definition.id)
                .await
                .ok_or_else(|| Error::CredentialNotConfigured {
                    variable: self.credentials.describe(&definition.id),
                })?;
            call.access_token = Some(token);
        }

        let response = self.client.execute_request(&definition, &call).await?;
        let summary = format!(
            "{}: {} returned HTTP {} ({} ms)",
            definition.name, endpoint.name, response.status_code, response.response_time
        );
        info!(action = %action, status = response.status_code, "{summary}");

        if response.is_success() {
            return Ok(ActionResult::ok(response.data, summary));
        }

        let error = ErrorBody {
            kind: "upstream_http_error",
            message: format!("HTTP {}: {}", response.status_code, response.body_text()),
            issues: Vec::new(),
        };
        Ok(ActionResult {
            success: false,
            data: Some(response.data),
            summary: Some(summary),
            error: Some(error),
        })
    }
}

/// Present and not an empty string
fn provided<'a>(params: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    params
        .get(name)
        .filter(|v| !v.is_null() && v.as_str() != Some(""))
}

fn bind_declared(
    declared: &[ApiParameter],
    params: &Map<String, Value>,
    location: ParamLocation,
) -> Result<Map<String, Value>> {
    let mut bound = Map::new();
    for param in declared {
        match provided(params, &param.name) {
            Some(value) => {
                bound.insert(param.name.clone(), value.clone());
            }
            None if param.required && param.default.is_none() => {
                return Err(Error::MissingParameter {
                    name: param.name.clone(),
                    location,
                });
            }
            None => {}
        }
    }
    Ok(bound)
}

/// Split a flat parameter map into path, query and body by the endpoint's declarations.
/// Undeclared parameters are dropped.
fn bind(api_id: &str, endpoint: &ApiEndpoint, params: &Map<String, Value>) -> Result<ApiCallRequest> {
    let path_params = bind_declared(&endpoint.parameters, params, ParamLocation::Path)?;
    let query_params = bind_declared(&endpoint.query_params, params, ParamLocation::Query)?;
    let body = if endpoint.method.has_body() && !endpoint.body_params.is_empty() {
        Some(Value::Object(bind_declared(
            &endpoint.body_params,
            params,
            ParamLocation::Body,
        )?))
    } else {
        None
    };

    Ok(ApiCallRequest {
        path_params,
        query_params,
        body,
        ..ApiCallRequest::new(api_id, endpoint.name.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::registry::builtin;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn executor() -> CapabilityExecutor {
        let curated = ApiRegistry::curated(&["coingecko".to_string(), "openweather".to_string()])
            .unwrap();
        CapabilityExecutor::new(
            Arc::new(curated),
            ApiClient::new(&ClientConfig::default()).unwrap(),
        )
    }

    async fn error_kind(executor: &CapabilityExecutor, action: &str, p: Value) -> &'static str {
        let result = executor.execute(ActionRequest::new(action, params(p))).await;
        assert!(!result.success);
        result.error.unwrap().kind
    }

    #[test]
    fn bind_splits_by_declaration_and_drops_extras() {
        let def = builtin::definitions().into_iter().find(|d| d.id == "coingecko").unwrap();
        let endpoint = def.endpoint("coin_market_chart").unwrap();
        let call = bind(
            "coingecko",
            endpoint,
            &params(json!({ "id": "bitcoin", "vs_currency": "usd", "days": 7, "junk": 1 })),
        )
        .unwrap();
        assert_eq!(call.path_params, params(json!({ "id": "bitcoin" })));
        assert_eq!(call.query_params, params(json!({ "vs_currency": "usd", "days": 7 })));
        assert!(call.body.is_none());
    }

    #[test]
    fn bind_treats_empty_string_as_missing() {
        let def = builtin::definitions().into_iter().find(|d| d.id == "coingecko").unwrap();
        let endpoint = def.endpoint("coin_details").unwrap();
        let err = bind("coingecko", endpoint, &params(json!({ "id": "" }))).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParameter { ref name, location: ParamLocation::Path } if name == "id"
        ));
    }

    #[test]
    fn bind_omits_absent_optionals() {
        let def = builtin::definitions().into_iter().find(|d| d.id == "coingecko").unwrap();
        let endpoint = def.endpoint("simple_price").unwrap();
        let call = bind(
            "coingecko",
            endpoint,
            &params(json!({ "ids": "bitcoin", "vs_currencies": "usd", "include_market_cap": "" })),
        )
        .unwrap();
        assert!(!call.query_params.contains_key("include_market_cap"));
        assert!(!call.query_params.contains_key("include_24hr_change"));
    }

    #[test]
    fn bind_builds_body_for_post() {
        let def = builtin::definitions()
            .into_iter()
            .find(|d| d.id == "jsonplaceholder")
            .unwrap();
        let endpoint = def.endpoint("create_post").unwrap();
        let call = bind(
            "jsonplaceholder",
            endpoint,
            &params(json!({ "title": "t", "body": "b", "userId": 1 })),
        )
        .unwrap();
        assert_eq!(call.body, Some(json!({ "title": "t", "body": "b", "userId": 1 })));
        assert!(call.query_params.is_empty());
    }

    #[tokio::test]
    async fn local_failures_are_results_not_errors() {
        let executor = executor();
        assert_eq!(error_kind(&executor, "coingecko", json!({})).await, "malformed_action");
        // github is built in but not curated here
        assert_eq!(error_kind(&executor, "github.get_user", json!({})).await, "unknown_api");
        assert_eq!(error_kind(&executor, "coingecko.nope", json!({})).await, "endpoint_not_found");
        assert_eq!(
            error_kind(&executor, "coingecko.coin_details", json!({})).await,
            "missing_parameter"
        );
    }

    #[tokio::test]
    async fn missing_key_names_the_variable() {
        // GIVEN: a credential source with nothing configured
        let executor = executor().with_credentials(Arc::new(StaticCredentials::new()));

        // WHEN: an authenticated API is called
        let result = executor
            .execute(ActionRequest::new("openweather.current_weather", params(json!({ "q": "Oslo" }))))
            .await;

        // THEN: the error names OPENWEATHER_API_KEY
        let error = result.error.unwrap();
        assert_eq!(error.kind, "credential_not_configured");
        assert!(error.message.contains("OPENWEATHER_API_KEY"), "{}", error.message);
    }

    #[tokio::test]
    async fn denied_capability_is_distinct() {
        let executor = executor().with_gate(Arc::new(AllowList::new(["openweather"])));
        assert_eq!(
            error_kind(&executor, "coingecko.trending", json!({})).await,
            "capability_denied"
        );
    }
}
