//! Error types for AnyAPI Hub

use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for AnyAPI Hub
pub type Result<T> = std::result::Result<T, Error>;

/// Where a request parameter is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// `{name}` placeholder in the endpoint path
    Path,
    /// Query string
    Query,
    /// JSON request body
    Body,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Body => "body",
        })
    }
}

/// A single field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Dotted path to the offending field (`endpoints[0].path`); empty for the root.
    pub path: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// AnyAPI Hub errors
#[derive(Error, Debug)]
pub enum Error {
    /// Action string is not `apiId.endpointName`
    #[error("Malformed action '{0}': expected '<apiId>.<endpointName>'")]
    MalformedAction(String),

    /// No API definition with this id
    #[error("Unknown API '{id}'. Available APIs: {}", .available.join(", "))]
    UnknownApi {
        /// Requested id
        id: String,
        /// Ids that are registered
        available: Vec<String>,
    },

    /// Endpoint not declared by the resolved definition
    #[error("Endpoint '{endpoint}' not found. Available endpoints: {}", .available.join(", "))]
    EndpointNotFound {
        /// Requested endpoint name or path
        endpoint: String,
        /// Endpoint names declared by the definition
        available: Vec<String>,
    },

    /// A required parameter is absent
    #[error("Missing required {location} parameter: {name}")]
    MissingParameter {
        /// Parameter name
        name: String,
        /// Binding site
        location: ParamLocation,
    },

    /// API requires authentication but no access token was supplied
    #[error("API '{0}' requires authentication but no access token was provided")]
    MissingCredential(String),

    /// Credential lookup returned nothing
    #[error("Credential not configured: set the {variable} environment variable")]
    CredentialNotConfigured {
        /// Expected environment variable
        variable: String,
    },

    /// Tool arguments failed schema validation
    #[error("Schema validation failed: {}", join_issues(.0))]
    SchemaValidation(Vec<FieldIssue>),

    /// API id already registered
    #[error("API '{0}' is already registered")]
    DuplicateApiRegistration(String),

    /// Definition violates a structural invariant
    #[error("Invalid API definition '{id}': {reason}")]
    InvalidDefinition {
        /// Definition id
        id: String,
        /// What is wrong
        reason: String,
    },

    /// No provider registered under this name
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider does not declare this tool
    #[error("Unknown tool '{tool}' on provider '{provider}'")]
    UnknownTool {
        /// Provider name
        provider: String,
        /// Tool name
        tool: String,
    },

    /// Provider `initialize()` failed
    #[error("Provider '{provider}' failed to initialize: {reason}")]
    ProviderInit {
        /// Provider name
        provider: String,
        /// Underlying failure
        reason: String,
    },

    /// Provider name already taken
    #[error("Provider '{0}' is already registered")]
    ProviderAlreadyRegistered(String),

    /// Header name or value is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// License gate refused the capability or tool
    #[error("'{0}' is not enabled for this installation")]
    CapabilityDenied(String),

    /// Network-level failure (DNS, connect, TLS, timeout, oversized body)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable, machine-readable error code for result envelopes
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedAction(_) => "malformed_action",
            Self::UnknownApi { .. } => "unknown_api",
            Self::EndpointNotFound { .. } => "endpoint_not_found",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::MissingCredential(_) => "missing_credential",
            Self::CredentialNotConfigured { .. } => "credential_not_configured",
            Self::SchemaValidation(_) => "schema_validation_error",
            Self::DuplicateApiRegistration(_) => "duplicate_api_registration",
            Self::InvalidDefinition { .. } => "invalid_definition",
            Self::UnknownProvider(_) => "unknown_provider",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::ProviderInit { .. } => "provider_init_error",
            Self::ProviderAlreadyRegistered(_) => "provider_already_registered",
            Self::InvalidHeader(_) => "invalid_header",
            Self::CapabilityDenied(_) => "capability_denied",
            Self::Transport(_) => "transport_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }

    /// Returns `true` for failures detected before any network I/O.
    #[must_use]
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // Strip the URL: query-string credentials must not leak into messages.
        Self::Transport(e.without_url().to_string())
    }
}

/// Serializable form of an [`Error`] for result envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Value of [`Error::kind`]
    pub kind: &'static str,
    /// Display message
    pub message: String,
    /// Field-level issues for schema validation failures
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldIssue>,
}

impl From<&Error> for ErrorBody {
    fn from(e: &Error) -> Self {
        let issues = match e {
            Error::SchemaValidation(issues) => issues.clone(),
            _ => Vec::new(),
        };
        Self {
            kind: e.kind(),
            message: e.to_string(),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_names_location() {
        let err = Error::MissingParameter {
            name: "id".to_string(),
            location: ParamLocation::Path,
        };
        assert_eq!(err.to_string(), "Missing required path parameter: id");
        assert_eq!(err.kind(), "missing_parameter");
    }

    #[test]
    fn schema_validation_lists_every_issue() {
        let err = Error::SchemaValidation(vec![
            FieldIssue::new("apiId", "required parameter is missing"),
            FieldIssue::new("method", "must be one of: \"GET\", \"POST\""),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("apiId: required parameter is missing"));
        assert!(msg.contains("method: must be one of"));

        let body = ErrorBody::from(&err);
        assert_eq!(body.kind, "schema_validation_error");
        assert_eq!(body.issues.len(), 2);
    }

    #[test]
    fn unknown_api_lists_available_ids() {
        let err = Error::UnknownApi {
            id: "nope".to_string(),
            available: vec!["coingecko".to_string(), "github".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown API 'nope'. Available APIs: coingecko, github"
        );
    }

    #[test]
    fn only_transport_errors_are_non_local() {
        assert!(!Error::Transport("connection refused".to_string()).is_local());
        assert!(Error::MissingCredential("openweather".to_string()).is_local());
    }
}
