//! API definition types
//!
//! These types map directly to the JSON shape accepted by `add_custom_api`
//! and the `custom_apis` configuration section (camelCase keys).

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("static regex"));

/// A registry entry describing one external REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
    /// Unique key within a registry
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// What the API provides (also searched by `category` filters)
    #[serde(default)]
    pub description: String,

    /// Base URL; endpoint paths are appended to it
    pub base_url: String,

    /// Whether every call needs an access token
    #[serde(default)]
    pub requires_auth: bool,

    /// How the access token is attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,

    /// Header carrying the key for `apikey` auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_header_name: Option<String>,

    /// Query parameter carrying the key for `query` auth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_query_param: Option<String>,

    /// Advisory rate limit; documented, never enforced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,

    /// Headers sent with every request to this API
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_headers: BTreeMap<String, String>,

    /// Declared endpoints, in documentation order
    #[serde(default)]
    pub endpoints: Vec<ApiEndpoint>,
}

/// Authentication strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// Token in a named header
    #[serde(alias = "api_key")]
    ApiKey,
    /// `Authorization: Basic <token>` (token pre-encoded)
    Basic,
    /// Token in a named query parameter
    Query,
    /// Caller supplies auth headers itself
    Custom,
}

impl AuthType {
    /// Wire name as used in definitions
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::ApiKey => "apikey",
            Self::Basic => "basic",
            Self::Query => "query",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory rate limit metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window
    pub requests: u32,
    /// Window label (`second`, `minute`, `hour`, `day`, ...)
    pub window: String,
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requests per {}", self.requests, self.window)
    }
}

/// HTTP method of an endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[default]
    #[serde(alias = "get")]
    Get,
    /// POST
    #[serde(alias = "post")]
    Post,
    /// PUT
    #[serde(alias = "put")]
    Put,
    /// PATCH
    #[serde(alias = "patch")]
    Patch,
    /// DELETE
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    /// Upper-case method token
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Methods that carry a JSON body
    #[must_use]
    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Patch => Self::PATCH,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// One callable endpoint of an API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    /// Unique within its definition
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Path relative to the base URL, may contain `{param}` placeholders
    pub path: String,

    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,

    /// Path parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ApiParameter>,

    /// Query parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<ApiParameter>,

    /// JSON body parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_params: Vec<ApiParameter>,

    /// Endpoint-specific headers (override `commonHeaders`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ApiEndpoint {
    /// Placeholder names appearing in `path`, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        PLACEHOLDER
            .captures_iter(&self.path)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }
}

/// Declared parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// string
    String,
    /// number (integer or float)
    #[serde(alias = "integer")]
    Number,
    /// boolean
    Boolean,
    /// object
    Object,
    /// array
    Array,
}

impl ParamType {
    /// JSON Schema type name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    /// Placeholder value used in generated documentation examples
    #[must_use]
    pub fn example_value(self, name: &str) -> Value {
        match self {
            Self::String => Value::String(format!("<{name}>")),
            Self::Number => Value::from(1),
            Self::Boolean => Value::Bool(true),
            Self::Object => Value::Object(serde_json::Map::new()),
            Self::Array => Value::Array(Vec::new()),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiParameter {
    /// Parameter name as sent on the wire
    pub name: String,

    /// Declared type
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: ParamType,

    /// Whether the caller must provide it
    #[serde(default)]
    pub required: bool,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Value used when the caller omits the parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Allowed values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

fn default_param_type() -> ParamType {
    ParamType::String
}

impl ApiParameter {
    /// Required parameter
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: true,
            description: description.to_string(),
            default: None,
            enum_values: None,
        }
    }

    /// Optional parameter
    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    /// Attach a default value
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Attach allowed values
    #[must_use]
    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Value to show in a `make_api_call` example for this parameter
    #[must_use]
    pub fn example_value(&self) -> Value {
        self.default
            .clone()
            .or_else(|| self.enum_values.as_ref().and_then(|v| v.first().cloned()))
            .unwrap_or_else(|| self.param_type.example_value(&self.name))
    }
}

impl ApiDefinition {
    /// Resolve an endpoint by name, falling back to an exact path match
    #[must_use]
    pub fn endpoint(&self, name_or_path: &str) -> Option<&ApiEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.name == name_or_path)
            .or_else(|| self.endpoints.iter().find(|e| e.path == name_or_path))
    }

    /// Declared endpoint names, in order
    #[must_use]
    pub fn endpoint_names(&self) -> Vec<String> {
        self.endpoints.iter().map(|e| e.name.clone()).collect()
    }

    /// Check the structural invariants of a definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] naming the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidDefinition {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty".to_string()));
        }
        // Actions are split on the first '.', so a dotted id is unreachable.
        if self.id.contains('.') || self.id.contains(char::is_whitespace) {
            return Err(invalid(
                "id must not contain '.' or whitespace".to_string(),
            ));
        }

        match url::Url::parse(&self.base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => {
                return Err(invalid(format!(
                    "baseUrl scheme '{}' is not http(s)",
                    u.scheme()
                )));
            }
            Err(e) => return Err(invalid(format!("baseUrl is not a valid URL: {e}"))),
        }

        if self.requires_auth && self.auth_type.is_none() {
            return Err(invalid("requiresAuth is set but authType is missing".to_string()));
        }
        match self.auth_type {
            Some(AuthType::ApiKey) if is_blank(self.auth_header_name.as_deref()) => {
                return Err(invalid("authType 'apikey' requires authHeaderName".to_string()));
            }
            Some(AuthType::Query) if is_blank(self.auth_query_param.as_deref()) => {
                return Err(invalid("authType 'query' requires authQueryParam".to_string()));
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            if endpoint.name.trim().is_empty() {
                return Err(invalid("endpoint name must not be empty".to_string()));
            }
            if !seen.insert(endpoint.name.as_str()) {
                return Err(invalid(format!("duplicate endpoint name '{}'", endpoint.name)));
            }
            for placeholder in endpoint.placeholders() {
                if !endpoint.parameters.iter().any(|p| p.name == placeholder) {
                    return Err(invalid(format!(
                        "endpoint '{}' uses {{{placeholder}}} without declaring it in parameters",
                        endpoint.name
                    )));
                }
            }
        }

        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal(id: &str) -> ApiDefinition {
        serde_json::from_value(json!({
            "id": id,
            "name": "Example",
            "baseUrl": "https://api.example.com",
            "endpoints": [
                { "name": "get_item", "path": "/items/{id}",
                  "parameters": [{ "name": "id", "type": "string", "required": true }] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let def = minimal("example");
        assert!(!def.requires_auth);
        assert_eq!(def.endpoints[0].method, HttpMethod::Get);
        assert!(def.endpoints[0].parameters[0].required);
        assert!(def.validate().is_ok());
    }

    #[test]
    fn endpoint_resolves_by_name_then_path() {
        let def = minimal("example");
        assert_eq!(def.endpoint("get_item").unwrap().path, "/items/{id}");
        assert_eq!(def.endpoint("/items/{id}").unwrap().name, "get_item");
        assert!(def.endpoint("missing").is_none());
    }

    #[test]
    fn apikey_without_header_is_invalid() {
        let mut def = minimal("example");
        def.requires_auth = true;
        def.auth_type = Some(AuthType::ApiKey);
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("authHeaderName"), "{err}");
    }

    #[test]
    fn query_auth_without_param_is_invalid() {
        let mut def = minimal("example");
        def.requires_auth = true;
        def.auth_type = Some(AuthType::Query);
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("authQueryParam"), "{err}");
    }

    #[test]
    fn requires_auth_without_type_is_invalid() {
        let mut def = minimal("example");
        def.requires_auth = true;
        assert!(matches!(def.validate(), Err(Error::InvalidDefinition { .. })));
    }

    #[test]
    fn dotted_id_is_invalid() {
        assert!(minimal("my.api").validate().is_err());
    }

    #[test]
    fn undeclared_placeholder_is_invalid() {
        let mut def = minimal("example");
        def.endpoints[0].path = "/items/{id}/{version}".to_string();
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("{version}"), "{err}");
    }

    #[test]
    fn duplicate_endpoint_names_are_invalid() {
        let mut def = minimal("example");
        def.endpoints.push(def.endpoints[0].clone());
        assert!(def.validate().is_err());
    }

    #[test]
    fn non_http_base_url_is_invalid() {
        let mut def = minimal("example");
        def.base_url = "ftp://files.example.com".to_string();
        assert!(def.validate().is_err());
    }

    #[test]
    fn auth_type_accepts_snake_case_alias() {
        let t: AuthType = serde_json::from_value(json!("api_key")).unwrap();
        assert_eq!(t, AuthType::ApiKey);
        assert_eq!(serde_json::to_value(t).unwrap(), json!("apikey"));
    }

    #[test]
    fn example_value_prefers_default_then_enum() {
        let p = ApiParameter::optional("units", ParamType::String, "")
            .with_enum(["metric", "imperial"]);
        assert_eq!(p.example_value(), json!("metric"));
        let p = p.with_default(json!("imperial"));
        assert_eq!(p.example_value(), json!("imperial"));
        let p = ApiParameter::required("id", ParamType::String, "");
        assert_eq!(p.example_value(), json!("<id>"));
    }
}
