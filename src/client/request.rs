//! Request and response types, validation, and request building.
//!
//! Everything here is pure: no I/O happens until [`super::ApiClient`] sends
//! a [`PreparedRequest`].

use std::collections::BTreeMap;
use std::fmt;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::ParamLocation;
use crate::hub::trace::TRACE_HEADER;
use crate::registry::{ApiDefinition, ApiEndpoint, ApiParameter, AuthType, HttpMethod};
use crate::{Error, Result};

/// A resolved invocation of one endpoint
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiCallRequest {
    /// Registry id
    pub api_id: String,
    /// Endpoint name or raw path
    pub endpoint: String,
    /// Overrides the endpoint's declared method
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    /// Values for `{placeholder}`s in the path
    pub path_params: Map<String, Value>,
    /// Query string values; nulls are dropped
    pub query_params: Map<String, Value>,
    /// JSON body for POST/PUT/PATCH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Extra headers, highest precedence
    pub headers: BTreeMap<String, String>,
    /// Credential injected per the definition's auth type
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl fmt::Debug for ApiCallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCallRequest")
            .field("api_id", &self.api_id)
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .field("path_params", &self.path_params)
            .field("query_params", &self.query_params)
            .field("body", &self.body)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiCallRequest {
    /// Request for `endpoint` of `api_id` with no parameters
    pub fn new(api_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set a path parameter
    #[must_use]
    pub fn path_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.path_params.insert(name.to_string(), value.into());
        self
    }

    /// Set a query parameter
    #[must_use]
    pub fn query_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.query_params.insert(name.to_string(), value.into());
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a request header
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Set the access token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Outcome of an HTTP round trip. Status >= 400 is data, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Response headers with UTF-8 values
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON, or the raw text
    pub data: Value,
    /// Wall-clock time in milliseconds
    pub response_time: u64,
    /// Registry id
    pub api_id: String,
    /// Resolved endpoint name
    pub endpoint: String,
}

impl ApiCallResponse {
    /// Whether the upstream accepted the call (status < 400)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code < 400
    }

    /// Body rendered for error messages
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A fully built request, ready to send
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// Effective method
    pub method: HttpMethod,
    /// Absolute URL including the query string
    pub url: Url,
    /// Merged headers, auth included
    pub headers: HeaderMap,
    /// JSON body, if any
    pub body: Option<Value>,
}

fn is_present(values: &Map<String, Value>, name: &str) -> bool {
    values.get(name).is_some_and(|v| !v.is_null())
}

fn check_required(
    params: &[ApiParameter],
    values: &Map<String, Value>,
    location: ParamLocation,
) -> Result<()> {
    for param in params.iter().filter(|p| p.required && p.default.is_none()) {
        if !is_present(values, &param.name) {
            return Err(Error::MissingParameter {
                name: param.name.clone(),
                location,
            });
        }
    }
    Ok(())
}

/// Check a request against its definition without any network I/O.
///
/// Order: endpoint, path, query, body, then credential.
///
/// # Errors
///
/// [`Error::EndpointNotFound`], [`Error::MissingParameter`] or
/// [`Error::MissingCredential`].
pub fn validate_request<'a>(
    definition: &'a ApiDefinition,
    request: &ApiCallRequest,
) -> Result<&'a ApiEndpoint> {
    let endpoint =
        definition
            .endpoint(&request.endpoint)
            .ok_or_else(|| Error::EndpointNotFound {
                endpoint: request.endpoint.clone(),
                available: definition.endpoint_names(),
            })?;

    check_required(&endpoint.parameters, &request.path_params, ParamLocation::Path)?;
    check_required(&endpoint.query_params, &request.query_params, ParamLocation::Query)?;

    let empty = Map::new();
    let body = match &request.body {
        Some(Value::Object(map)) => map,
        _ => &empty,
    };
    check_required(&endpoint.body_params, body, ParamLocation::Body)?;

    if definition.requires_auth && request.token().is_none() {
        return Err(Error::MissingCredential(definition.id.clone()));
    }

    Ok(endpoint)
}

/// String form of a parameter value as it goes on the wire
fn wire_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(wire_string).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    name.parse::<HeaderName>()
        .map_err(|_| Error::InvalidHeader(format!("invalid header name '{name}'")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    // Never echo the value: it may be a credential.
    value
        .parse::<HeaderValue>()
        .map_err(|_| Error::InvalidHeader(format!("invalid value for header '{name}'")))
}

fn secret_value(name: &str, value: &str) -> Result<HeaderValue> {
    let mut value = header_value(name, value)?;
    value.set_sensitive(true);
    Ok(value)
}

/// Build the outbound request for an already validated endpoint.
///
/// # Errors
///
/// [`Error::InvalidHeader`] for headers that are not valid HTTP, or
/// [`Error::InvalidDefinition`] if base URL and path do not form a URL.
pub fn prepare(
    definition: &ApiDefinition,
    endpoint: &ApiEndpoint,
    request: &ApiCallRequest,
    trace_id: Option<&str>,
) -> Result<PreparedRequest> {
    let method = request.method.unwrap_or(endpoint.method);
    let token = request.token();

    // Path: textual substitution, values percent-encoded.
    let mut path = endpoint.path.clone();
    for (name, value) in &request.path_params {
        if value.is_null() {
            continue;
        }
        let encoded = urlencoding::encode(&wire_string(value)).into_owned();
        path = path.replace(&format!("{{{name}}}"), &encoded);
    }
    for param in &endpoint.parameters {
        if let Some(default) = &param.default
            && !is_present(&request.path_params, &param.name)
        {
            let encoded = urlencoding::encode(&wire_string(default)).into_owned();
            path = path.replace(&format!("{{{}}}", param.name), &encoded);
        }
    }
    if !path.is_empty() && !path.starts_with('/') {
        path.insert(0, '/');
    }

    let raw = format!("{}{path}", definition.base_url.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| Error::InvalidDefinition {
        id: definition.id.clone(),
        reason: format!("cannot build URL for endpoint '{}': {e}", endpoint.name),
    })?;

    // Query: auth param first, then provided values, then declared defaults.
    let mut query: Vec<(String, String)> = Vec::new();
    if definition.auth_type == Some(AuthType::Query)
        && let (Some(param), Some(token)) = (definition.auth_query_param.as_deref(), token)
    {
        query.push((param.to_string(), token.to_string()));
    }
    for (name, value) in &request.query_params {
        if !value.is_null() {
            query.push((name.clone(), wire_string(value)));
        }
    }
    for param in &endpoint.query_params {
        if let Some(default) = &param.default
            && !is_present(&request.query_params, &param.name)
        {
            query.push((param.name.clone(), wire_string(default)));
        }
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    // Headers: common < endpoint < request.
    let mut headers = HeaderMap::new();
    for (name, value) in definition
        .common_headers
        .iter()
        .chain(&endpoint.headers)
        .chain(&request.headers)
    {
        headers.insert(header_name(name)?, header_value(name, value)?);
    }

    if let Some(token) = token {
        match definition.auth_type {
            Some(AuthType::Bearer) => {
                headers.insert(
                    AUTHORIZATION,
                    secret_value("Authorization", &format!("Bearer {token}"))?,
                );
            }
            Some(AuthType::Basic) => {
                headers.insert(
                    AUTHORIZATION,
                    secret_value("Authorization", &format!("Basic {token}"))?,
                );
            }
            Some(AuthType::ApiKey) => {
                if let Some(name) = definition.auth_header_name.as_deref() {
                    headers.insert(header_name(name)?, secret_value(name, token)?);
                }
            }
            // Query is applied above; custom auth is carried in request headers.
            Some(AuthType::Query | AuthType::Custom) | None => {}
        }
    }

    if let Some(trace_id) = trace_id
        && !headers.contains_key(TRACE_HEADER)
    {
        headers.insert(TRACE_HEADER, header_value(TRACE_HEADER, trace_id)?);
    }

    let body = if method.has_body() {
        build_body(endpoint, request.body.clone())
    } else {
        None
    };
    if body.is_some() && !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    Ok(PreparedRequest {
        method,
        url,
        headers,
        body,
    })
}

fn build_body(endpoint: &ApiEndpoint, body: Option<Value>) -> Option<Value> {
    let defaults: Vec<&ApiParameter> = endpoint
        .body_params
        .iter()
        .filter(|p| p.default.is_some())
        .collect();

    match body {
        Some(Value::Object(mut map)) => {
            for param in defaults {
                if let Some(default) = &param.default
                    && !is_present(&map, &param.name)
                {
                    map.insert(param.name.clone(), default.clone());
                }
            }
            Some(Value::Object(map))
        }
        None if !defaults.is_empty() => {
            let map = defaults
                .into_iter()
                .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
                .collect();
            Some(Value::Object(map))
        }
        other => other,
    }
}
