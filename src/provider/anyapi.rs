//! `AnyAPI` provider: generic REST invocation over the API registry.
//!
//! Tools:
//! - `make_api_call`: validate and execute one endpoint call
//! - `list_available_apis`: browse the registry
//! - `get_api_documentation`: auth, rate limit and per-endpoint examples
//! - `add_custom_api`: register a new definition at runtime

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::{Provider, ProviderHealth, Tool, schema};
use crate::client::{ApiCallRequest, ApiCallResponse, ApiClient};
use crate::error::FieldIssue;
use crate::registry::{ApiDefinition, ApiEndpoint, ApiParameter, ApiRegistry, AuthType};
use crate::{Error, Result};

const PROVIDER_NAME: &str = "anyapi";

/// Upstream bodies quoted in error messages are cut to this many characters.
const ERROR_BODY_CHARS: usize = 500;

/// Tool provider for every API in the registry
pub struct AnyApiProvider {
    registry: Arc<ApiRegistry>,
    client: ApiClient,
}

/// A validated tool invocation
#[derive(Debug)]
enum AnyApiCall {
    MakeApiCall(ApiCallRequest),
    ListAvailableApis(ListFilter),
    GetApiDocumentation(String),
    AddCustomApi(Box<ApiDefinition>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFilter {
    requires_auth: Option<bool>,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocsArgs {
    api_id: String,
}

impl AnyApiCall {
    fn parse(tool: &str, arguments: &Value) -> Result<Self> {
        let schema = tool_schema(tool).ok_or_else(|| Error::UnknownTool {
            provider: PROVIDER_NAME.to_string(),
            tool: tool.to_string(),
        })?;
        let args = schema::validate(arguments, &schema)?;

        Ok(match tool {
            "make_api_call" => Self::MakeApiCall(typed(args)?),
            "list_available_apis" => Self::ListAvailableApis(typed(args)?),
            "get_api_documentation" => {
                let DocsArgs { api_id } = typed(args)?;
                Self::GetApiDocumentation(api_id)
            }
            _ => Self::AddCustomApi(Box::new(typed(args)?)),
        })
    }
}

/// Deserialize schema-checked arguments; a shape the schema let through is
/// still reported as a field issue.
fn typed<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| Error::SchemaValidation(vec![FieldIssue::new("", e.to_string())]))
}

impl AnyApiProvider {
    /// Create a provider over a shared registry and client
    pub fn new(registry: Arc<ApiRegistry>, client: ApiClient) -> Self {
        Self { registry, client }
    }

    async fn make_api_call(&self, request: ApiCallRequest) -> Result<Value> {
        let definition = self.registry.require(&request.api_id)?;
        let response = self.client.execute_request(&definition, &request).await?;
        Ok(call_result(&response))
    }

    fn list_available_apis(&self, filter: &ListFilter) -> Value {
        let category = filter.category.as_deref().map(str::to_lowercase);
        let apis: Vec<Value> = self
            .registry
            .list()
            .iter()
            .filter(|d| filter.requires_auth.is_none_or(|r| d.requires_auth == r))
            .filter(|d| {
                category
                    .as_deref()
                    .is_none_or(|c| d.description.to_lowercase().contains(c))
            })
            .map(|d| api_listing(d))
            .collect();

        let authenticated = apis
            .iter()
            .filter(|a| a["requiresAuth"] == Value::Bool(true))
            .count();
        json!({
            "total": apis.len(),
            "public": apis.len() - authenticated,
            "authenticated": authenticated,
            "apis": apis,
        })
    }

    fn get_api_documentation(&self, api_id: &str) -> Result<Value> {
        let definition = self.registry.require(api_id)?;
        Ok(documentation(&definition))
    }

    fn add_custom_api(&self, definition: ApiDefinition) -> Result<Value> {
        if self.registry.contains(&definition.id) {
            return Err(Error::DuplicateApiRegistration(definition.id));
        }
        let definition = self.registry.register(definition)?;
        Ok(json!({
            "success": true,
            "message": format!(
                "API '{}' registered with {} endpoint(s); call it with make_api_call",
                definition.id,
                definition.endpoints.len()
            ),
            "apiId": definition.id,
            "endpoints": definition.endpoint_names(),
        }))
    }
}

#[async_trait]
impl Provider for AnyApiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn tools(&self) -> Vec<Tool> {
        TOOLS
            .iter()
            .filter_map(|(name, description)| {
                tool_schema(name).map(|input_schema| Tool {
                    name: (*name).to_string(),
                    description: (*description).to_string(),
                    input_schema,
                })
            })
            .collect()
    }

    async fn initialize(&self) -> Result<()> {
        info!(apis = self.registry.len(), "AnyAPI provider ready");
        Ok(())
    }

    async fn call_tool(&self, tool: &str, arguments: Value) -> Result<Value> {
        let call = AnyApiCall::parse(tool, &arguments)?;
        debug!(tool, "Dispatching AnyAPI tool");

        match call {
            AnyApiCall::MakeApiCall(request) => self.make_api_call(request).await,
            AnyApiCall::ListAvailableApis(filter) => Ok(self.list_available_apis(&filter)),
            AnyApiCall::GetApiDocumentation(api_id) => self.get_api_documentation(&api_id),
            AnyApiCall::AddCustomApi(definition) => self.add_custom_api(*definition),
        }
    }

    async fn health(&self) -> ProviderHealth {
        if self.registry.is_empty() {
            ProviderHealth::Degraded("no APIs registered".to_string())
        } else {
            ProviderHealth::Healthy
        }
    }
}

// ── Results ──────────────────────────────────────────────────────────────────

fn call_result(response: &ApiCallResponse) -> Value {
    let mut result = json!({
        "success": response.is_success(),
        "apiId": response.api_id,
        "endpoint": response.endpoint,
        "statusCode": response.status_code,
        "responseTime": response.response_time,
        "headers": response.headers,
        "data": response.data,
    });
    if !response.is_success() {
        let body: String = response.body_text().chars().take(ERROR_BODY_CHARS).collect();
        result["error"] = Value::String(format!(
            "API request failed with status {}: {body}",
            response.status_code
        ));
    }
    result
}

fn api_listing(definition: &ApiDefinition) -> Value {
    json!({
        "id": definition.id,
        "name": definition.name,
        "description": definition.description,
        "baseUrl": definition.base_url,
        "requiresAuth": definition.requires_auth,
        "authType": definition.auth_type,
        "rateLimit": definition.rate_limit.as_ref().map(ToString::to_string),
        "endpointCount": definition.endpoints.len(),
        "endpoints": definition.endpoints.iter().map(|e| json!({
            "name": e.name,
            "method": e.method,
            "path": e.path,
            "description": e.description,
        })).collect::<Vec<_>>(),
    })
}

fn auth_instructions(definition: &ApiDefinition) -> String {
    let how = match definition.auth_type {
        None => return "No authentication required.".to_string(),
        Some(AuthType::Bearer) => {
            "Pass your token as accessToken; it is sent as 'Authorization: Bearer <token>'."
                .to_string()
        }
        Some(AuthType::ApiKey) => format!(
            "Pass your API key as accessToken; it is sent in the '{}' header.",
            definition.auth_header_name.as_deref().unwrap_or_default()
        ),
        Some(AuthType::Basic) => "Pass base64-encoded 'user:password' as accessToken; it is sent as 'Authorization: Basic <token>'.".to_string(),
        Some(AuthType::Query) => format!(
            "Pass your API key as accessToken; it is sent as the '{}' query parameter.",
            definition.auth_query_param.as_deref().unwrap_or_default()
        ),
        Some(AuthType::Custom) => {
            "Supply the required authentication headers in the headers argument.".to_string()
        }
    };
    if definition.requires_auth {
        how
    } else {
        format!("Optional. {how}")
    }
}

fn param_docs(params: &[ApiParameter]) -> Vec<Value> {
    params
        .iter()
        .map(|p| {
            let mut doc = json!({
                "name": p.name,
                "type": p.param_type,
                "required": p.required,
                "description": p.description,
            });
            if let Some(default) = &p.default {
                doc["default"] = default.clone();
            }
            if let Some(values) = &p.enum_values {
                doc["enum"] = Value::Array(values.clone());
            }
            doc
        })
        .collect()
}

/// Required parameters with example values; if none are required, the first optional one
fn example_params(params: &[ApiParameter]) -> Map<String, Value> {
    let mut picked: Vec<&ApiParameter> = params.iter().filter(|p| p.required).collect();
    if picked.is_empty() {
        picked.extend(params.first());
    }
    picked
        .into_iter()
        .map(|p| (p.name.clone(), p.example_value()))
        .collect()
}

fn example_call(definition: &ApiDefinition, endpoint: &ApiEndpoint) -> Value {
    let mut args = Map::new();
    args.insert("apiId".to_string(), json!(definition.id));
    args.insert("endpoint".to_string(), json!(endpoint.name));
    for (key, params) in [
        ("pathParams", &endpoint.parameters),
        ("queryParams", &endpoint.query_params),
    ] {
        let example = example_params(params);
        if !example.is_empty() {
            args.insert(key.to_string(), Value::Object(example));
        }
    }
    if endpoint.method.has_body() {
        let example = example_params(&endpoint.body_params);
        if !example.is_empty() {
            args.insert("body".to_string(), Value::Object(example));
        }
    }
    if definition.requires_auth {
        args.insert("accessToken".to_string(), json!("<your-token>"));
    }
    json!({ "tool": "make_api_call", "arguments": args })
}

fn documentation(definition: &ApiDefinition) -> Value {
    let rate_limit = definition.rate_limit.as_ref().map(|r| {
        json!({
            "requests": r.requests,
            "window": r.window,
            "note": "Advisory only: not enforced by this server; pace your calls accordingly.",
        })
    });

    json!({
        "id": definition.id,
        "name": definition.name,
        "description": definition.description,
        "baseUrl": definition.base_url,
        "authentication": {
            "required": definition.requires_auth,
            "type": definition.auth_type,
            "instructions": auth_instructions(definition),
        },
        "rateLimit": rate_limit,
        "commonHeaders": definition.common_headers,
        "endpoints": definition.endpoints.iter().map(|e| json!({
            "name": e.name,
            "description": e.description,
            "method": e.method,
            "path": e.path,
            "parameters": {
                "path": param_docs(&e.parameters),
                "query": param_docs(&e.query_params),
                "body": param_docs(&e.body_params),
            },
            "headers": e.headers,
            "example": example_call(definition, e),
        })).collect::<Vec<_>>(),
    })
}

// ── Tool schemas ─────────────────────────────────────────────────────────────

const TOOLS: &[(&str, &str)] = &[
    (
        "make_api_call",
        "Call an endpoint of a registered API. Path, query and body parameters are validated against the API definition before any request is sent.",
    ),
    (
        "list_available_apis",
        "List registered APIs, optionally filtered by whether they require authentication or by a category keyword matched against the description.",
    ),
    (
        "get_api_documentation",
        "Authentication instructions, advisory rate limits and every endpoint of an API, each with the exact make_api_call arguments that invoke it.",
    ),
    (
        "add_custom_api",
        "Register a new REST API definition. It becomes callable with make_api_call immediately.",
    ),
];

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

fn parameter_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "type": { "type": "string", "enum": ["string", "number", "integer", "boolean", "object", "array"] },
            "required": { "type": "boolean" },
            "description": { "type": "string" },
            "default": {},
            "enum": { "type": "array" }
        },
        "required": ["name"],
        "additionalProperties": false
    })
}

fn tool_schema(tool: &str) -> Option<Value> {
    let schema = match tool {
        "make_api_call" => json!({
            "type": "object",
            "properties": {
                "apiId": { "type": "string", "minLength": 1, "description": "Registered API id" },
                "endpoint": { "type": "string", "minLength": 1, "description": "Endpoint name or path" },
                "method": { "type": "string", "enum": METHODS, "description": "Overrides the endpoint's method" },
                "accessToken": { "type": "string", "description": "Credential for APIs that require authentication" },
                "pathParams": { "type": "object", "description": "Values for {placeholders} in the path" },
                "queryParams": { "type": "object", "description": "Query string parameters" },
                "body": { "type": "object", "description": "JSON body for POST/PUT/PATCH" },
                "headers": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "Extra request headers"
                }
            },
            "required": ["apiId", "endpoint"],
            "additionalProperties": false
        }),
        "list_available_apis" => json!({
            "type": "object",
            "properties": {
                "requiresAuth": { "type": "boolean", "description": "Only APIs with (true) or without (false) authentication" },
                "category": { "type": "string", "description": "Keyword matched against API descriptions" }
            },
            "additionalProperties": false
        }),
        "get_api_documentation" => json!({
            "type": "object",
            "properties": {
                "apiId": { "type": "string", "minLength": 1, "description": "Registered API id" }
            },
            "required": ["apiId"],
            "additionalProperties": false
        }),
        "add_custom_api" => json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "minLength": 1 },
                "name": { "type": "string", "minLength": 1 },
                "description": { "type": "string" },
                "baseUrl": { "type": "string", "minLength": 1 },
                "requiresAuth": { "type": "boolean" },
                "authType": { "type": "string", "enum": ["bearer", "apikey", "api_key", "basic", "query", "custom"] },
                "authHeaderName": { "type": "string" },
                "authQueryParam": { "type": "string" },
                "rateLimit": {
                    "type": "object",
                    "properties": {
                        "requests": { "type": "integer", "minimum": 1 },
                        "window": { "type": "string" }
                    },
                    "required": ["requests", "window"],
                    "additionalProperties": false
                },
                "commonHeaders": { "type": "object", "additionalProperties": { "type": "string" } },
                "endpoints": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string", "minLength": 1 },
                            "description": { "type": "string" },
                            "path": { "type": "string" },
                            "method": { "type": "string", "enum": METHODS },
                            "parameters": { "type": "array", "items": parameter_schema() },
                            "queryParams": { "type": "array", "items": parameter_schema() },
                            "bodyParams": { "type": "array", "items": parameter_schema() },
                            "headers": { "type": "object", "additionalProperties": { "type": "string" } }
                        },
                        "required": ["name", "path"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["id", "name", "baseUrl", "endpoints"],
            "additionalProperties": false
        }),
        _ => return None,
    };
    Some(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use pretty_assertions::assert_eq;

    fn provider() -> AnyApiProvider {
        AnyApiProvider::new(
            Arc::new(ApiRegistry::with_builtins()),
            ApiClient::new(&ClientConfig::default()).unwrap(),
        )
    }

    fn ids(result: &Value) -> Vec<&str> {
        result["apis"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn declares_four_closed_schemas() {
        let tools = provider().tools();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["make_api_call", "list_available_apis", "get_api_documentation", "add_custom_api"]
        );
        for tool in &tools {
            assert_eq!(tool.input_schema["additionalProperties"], json!(false), "{}", tool.name);
        }
    }

    #[tokio::test]
    async fn list_filters_by_requires_auth() {
        // GIVEN: the built-in registry
        let provider = provider();

        // WHEN: listing APIs that require auth
        let result = provider
            .call_tool("list_available_apis", json!({ "requiresAuth": true }))
            .await
            .unwrap();

        // THEN: only openweather is returned
        assert_eq!(ids(&result), vec!["openweather"]);
        assert_eq!(result["authenticated"], json!(1));

        let public = provider
            .call_tool("list_available_apis", json!({ "requiresAuth": false }))
            .await
            .unwrap();
        assert_eq!(
            ids(&public),
            vec!["coingecko", "github", "jsonplaceholder", "restcountries"]
        );
    }

    #[tokio::test]
    async fn list_filters_by_category_case_insensitively() {
        let result = provider()
            .call_tool("list_available_apis", json!({ "category": "CRYPTOCURRENCY" }))
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["coingecko"]);
        assert_eq!(result["apis"][0]["endpointCount"], json!(4));
    }

    #[tokio::test]
    async fn documentation_for_unknown_api_fails() {
        let err = provider()
            .call_tool("get_api_documentation", json!({ "apiId": "nope" }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownApi { .. }));
    }

    #[tokio::test]
    async fn documentation_covers_auth_rate_limit_and_examples() {
        let doc = provider()
            .call_tool("get_api_documentation", json!({ "apiId": "openweather" }))
            .await
            .unwrap();

        let instructions = doc["authentication"]["instructions"].as_str().unwrap();
        assert!(instructions.contains("'appid' query parameter"), "{instructions}");
        assert_eq!(doc["rateLimit"]["requests"], json!(60));
        assert!(doc["rateLimit"]["note"].as_str().unwrap().contains("Advisory"));

        let example = &doc["endpoints"][0]["example"];
        assert_eq!(example["tool"], json!("make_api_call"));
        assert_eq!(
            example["arguments"],
            json!({
                "apiId": "openweather",
                "endpoint": "current_weather",
                "queryParams": { "q": "<q>" },
                "accessToken": "<your-token>"
            })
        );
    }

    #[tokio::test]
    async fn documentation_example_uses_required_path_params() {
        let doc = provider()
            .call_tool("get_api_documentation", json!({ "apiId": "github" }))
            .await
            .unwrap();
        let issues = doc["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["name"] == "list_repo_issues")
            .unwrap();
        assert_eq!(
            issues["example"]["arguments"]["pathParams"],
            json!({ "owner": "<owner>", "repo": "<repo>" })
        );
        assert_eq!(issues["example"]["arguments"]["queryParams"], json!({ "state": "open" }));
        assert!(doc["authentication"]["instructions"]
            .as_str()
            .unwrap()
            .starts_with("Optional."));
    }

    #[tokio::test]
    async fn add_custom_api_rejects_builtin_id() {
        let err = provider()
            .call_tool(
                "add_custom_api",
                json!({
                    "id": "coingecko",
                    "name": "Fake",
                    "baseUrl": "https://fake.example.com",
                    "endpoints": [{ "name": "x", "path": "/x" }]
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateApiRegistration(ref id) if id == "coingecko"));
    }

    #[tokio::test]
    async fn add_custom_api_registers_and_lists() {
        let provider = provider();
        let result = provider
            .call_tool(
                "add_custom_api",
                json!({
                    "id": "catfacts",
                    "name": "Cat Facts",
                    "description": "Random cat facts",
                    "baseUrl": "https://catfact.ninja",
                    "requiresAuth": false,
                    "endpoints": [{
                        "name": "facts",
                        "path": "/facts",
                        "method": "GET",
                        "queryParams": [{ "name": "limit", "type": "number" }]
                    }]
                }),
            )
            .await
            .unwrap();
        assert_eq!(result["success"], json!(true));
        assert_eq!(result["endpoints"], json!(["facts"]));

        let listed = provider
            .call_tool("list_available_apis", json!({ "category": "cat facts" }))
            .await
            .unwrap();
        assert_eq!(ids(&listed), vec!["catfacts"]);
    }

    #[tokio::test]
    async fn add_custom_api_reports_every_schema_issue() {
        let err = provider()
            .call_tool(
                "add_custom_api",
                json!({
                    "name": "No id",
                    "baseUrl": "https://x.example.com",
                    "authType": "oauth",
                    "endpoints": [{ "path": "/a" }]
                }),
            )
            .await
            .unwrap_err();
        let Error::SchemaValidation(issues) = err else {
            panic!("expected SchemaValidation");
        };
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths.len(), 3, "{issues:?}");
        assert!(paths.contains(&"id"));
        assert!(paths.contains(&"authType"));
        assert!(paths.contains(&"endpoints[0].name"));
    }

    #[tokio::test]
    async fn non_string_header_values_are_schema_issues() {
        // GIVEN: header values that cannot be sent as strings
        let args = json!({
            "apiId": "coingecko",
            "endpoint": "trending",
            "headers": { "X-Count": { "n": 5 }, "X-Flags": [1, 2], "Accept": "application/json" }
        });

        // WHEN: make_api_call is invoked
        let err = provider().call_tool("make_api_call", args).await.unwrap_err();

        // THEN: a schema error names each header, before any request
        assert_eq!(err.kind(), "schema_validation_error");
        let Error::SchemaValidation(issues) = err else {
            panic!("expected SchemaValidation");
        };
        let mut paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["headers.X-Count", "headers.X-Flags"]);
    }

    #[tokio::test]
    async fn custom_api_header_values_are_checked() {
        let err = provider()
            .call_tool(
                "add_custom_api",
                json!({
                    "id": "headers-api",
                    "name": "Headers",
                    "baseUrl": "https://headers.example.com",
                    "commonHeaders": { "X-Version": null },
                    "endpoints": [{ "name": "a", "path": "/a", "headers": { "X-Mode": {} } }]
                }),
            )
            .await
            .unwrap_err();
        let Error::SchemaValidation(issues) = err else {
            panic!("expected SchemaValidation");
        };
        let mut paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(paths, vec!["commonHeaders.X-Version", "endpoints[0].headers.X-Mode"]);
    }

    #[tokio::test]
    async fn add_custom_api_rejects_invalid_definition() {
        let err = provider()
            .call_tool(
                "add_custom_api",
                json!({
                    "id": "secured",
                    "name": "Secured",
                    "baseUrl": "https://secured.example.com",
                    "requiresAuth": true,
                    "authType": "apikey",
                    "endpoints": [{ "name": "x", "path": "/x" }]
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_definition");
    }

    #[tokio::test]
    async fn make_api_call_unknown_api_lists_ids() {
        let err = provider()
            .call_tool("make_api_call", json!({ "apiId": "nope", "endpoint": "x" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("coingecko, github, jsonplaceholder, openweather, restcountries"));
    }

    #[tokio::test]
    async fn make_api_call_requires_credential_before_network() {
        let err = provider()
            .call_tool(
                "make_api_call",
                json!({ "apiId": "openweather", "endpoint": "current_weather", "queryParams": {} }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let err = provider().call_tool("delete_everything", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool { .. }));
    }

    #[test]
    fn error_result_embeds_status_and_truncated_body() {
        let response = ApiCallResponse {
            status_code: 500,
            headers: std::collections::BTreeMap::new(),
            data: json!("x".repeat(2000)),
            response_time: 12,
            api_id: "github".to_string(),
            endpoint: "get_user".to_string(),
        };
        let result = call_result(&response);
        assert_eq!(result["success"], json!(false));
        let error = result["error"].as_str().unwrap();
        assert!(error.starts_with("API request failed with status 500: xxx"));
        assert!(error.len() < 600);
    }
}
