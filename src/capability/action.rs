//! Action strings and the request/result envelopes of direct execution.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorBody;
use crate::{Error, Result};

/// An `apiId.endpointName` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Part before the first '.'
    pub api_id: String,
    /// Everything after the first '.'
    pub endpoint: String,
}

impl Action {
    /// Split on the first '.'; both halves must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedAction`] otherwise.
    pub fn parse(action: &str) -> Result<Self> {
        match action.trim().split_once('.') {
            Some((api_id, endpoint)) if !api_id.is_empty() && !endpoint.is_empty() => Ok(Self {
                api_id: api_id.to_string(),
                endpoint: endpoint.to_string(),
            }),
            _ => Err(Error::MalformedAction(action.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.api_id, self.endpoint)
    }
}

/// Inbound direct-execution request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    /// `"<apiId>.<endpointName>"`
    pub action: String,
    /// Flat parameter map, split into path/query/body by the endpoint
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Agent on whose behalf the call runs (used for credential lookup)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    /// Conversation correlation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// End user correlation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_user_id: Option<String>,
}

impl ActionRequest {
    /// Request for `action` with `params`
    pub fn new(action: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            action: action.into(),
            params,
            ..Self::default()
        }
    }
}

/// Outcome of a direct execution; never an `Err`
#[derive(Debug, Clone, Serialize)]
pub struct ActionResult {
    /// Whether the upstream accepted the call
    pub success: bool,
    /// Upstream data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// One-line description for logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Failure detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ActionResult {
    /// Successful call
    #[must_use]
    pub fn ok(data: Value, summary: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            summary: Some(summary),
            error: None,
        }
    }

    /// Failed call
    #[must_use]
    pub fn failed(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            summary: None,
            error: Some(ErrorBody::from(error)),
        }
    }
}
