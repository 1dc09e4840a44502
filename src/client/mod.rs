//! API Client
//!
//! Validates an [`ApiCallRequest`] against its [`ApiDefinition`], builds the
//! outbound request and performs a single HTTP round trip.
//!
//! # Security
//!
//! - Access tokens are injected at build time and marked sensitive
//! - URLs are never logged (query auth puts the token in the query string)
//! - Transport errors are stripped of their URL before surfacing

mod request;

pub use request::{
    ApiCallRequest, ApiCallResponse, PreparedRequest, prepare, validate_request,
};

use std::collections::BTreeMap;
use std::time::Instant;

use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::hub::trace;
use crate::registry::ApiDefinition;
use crate::{Error, Result};

/// Shared HTTP client for every registered API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    max_response_bytes: usize,
}

impl ApiClient {
    /// Build a client with the configured deadline and size limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Validate and execute a request.
    ///
    /// Status >= 400 is returned as a normal response.
    ///
    /// # Errors
    ///
    /// Any validation error from [`validate_request`] (before network I/O),
    /// [`Error::InvalidHeader`], or [`Error::Transport`] for network failures,
    /// timeouts and oversized bodies.
    pub async fn execute_request(
        &self,
        definition: &ApiDefinition,
        request: &ApiCallRequest,
    ) -> Result<ApiCallResponse> {
        let endpoint = validate_request(definition, request)?;
        let prepared = prepare(definition, endpoint, request, trace::current().as_deref())?;

        debug!(
            api_id = %definition.id,
            endpoint = %endpoint.name,
            method = %prepared.method,
            path = %prepared.url.path(),
            "Sending API request"
        );

        let mut builder = self
            .http
            .request(prepared.method.into(), prepared.url)
            .headers(prepared.headers);
        if let Some(body) = &prepared.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let started = Instant::now();
        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let headers = collect_headers(&response);
        let is_json = headers
            .get("content-type")
            .is_some_and(|ct| ct.contains("application/json"));

        let bytes = self.read_body(response).await?;
        let response_time = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            api_id = %definition.id,
            endpoint = %endpoint.name,
            status = status_code,
            elapsed_ms = response_time,
            "API request completed"
        );

        Ok(ApiCallResponse {
            status_code,
            headers,
            data: parse_body(&bytes, is_json),
            response_time,
            api_id: definition.id.clone(),
            endpoint: endpoint.name.clone(),
        })
    }

    async fn read_body(&self, mut response: Response) -> Result<Vec<u8>> {
        let limit = self.max_response_bytes;
        let too_large = || Error::Transport(format!("Response body exceeds {limit} bytes"));

        if response
            .content_length()
            .is_some_and(|len| len > u64::try_from(limit).unwrap_or(u64::MAX))
        {
            return Err(too_large());
        }

        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if buf.len() + chunk.len() > limit {
                return Err(too_large());
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

fn collect_headers(response: &Response) -> BTreeMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn parse_body(bytes: &[u8], is_json: bool) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    if is_json && let Ok(value) = serde_json::from_slice(bytes) {
        return value;
    }
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ApiRegistry;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ApiClient {
        ApiClient::new(&ClientConfig::default()).unwrap()
    }

    fn pointed_at(id: &str, server: &MockServer) -> ApiDefinition {
        let mut def = ApiRegistry::with_builtins().get(id).unwrap().as_ref().clone();
        def.base_url = server.uri();
        def
    }

    #[tokio::test]
    async fn json_response_is_parsed() {
        // GIVEN: an upstream returning JSON
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "bitcoin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bitcoin": { "usd": 1 } })))
            .expect(1)
            .mount(&server)
            .await;
        let def = pointed_at("coingecko", &server);

        // WHEN: the call executes
        let req = ApiCallRequest::new("coingecko", "simple_price")
            .query_param("ids", "bitcoin")
            .query_param("vs_currencies", "usd");
        let resp = client().execute_request(&def, &req).await.unwrap();

        // THEN: data is structured JSON
        assert_eq!(resp.status_code, 200);
        assert!(resp.is_success());
        assert_eq!(resp.data, json!({ "bitcoin": { "usd": 1 } }));
        assert_eq!(resp.endpoint, "simple_price");
        assert_eq!(resp.api_id, "coingecko");
    }

    #[tokio::test]
    async fn non_json_response_is_raw_text() {
        let server = MockServer::start().await;
        Mock::given(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
            .mount(&server)
            .await;
        let def = pointed_at("jsonplaceholder", &server);

        let resp = client()
            .execute_request(&def, &ApiCallRequest::new("jsonplaceholder", "get_users"))
            .await
            .unwrap();
        assert_eq!(resp.data, json!("plain words"));
    }

    #[tokio::test]
    async fn upstream_error_status_is_data_not_error() {
        let server = MockServer::start().await;
        Mock::given(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;
        let def = pointed_at("github", &server);

        let req = ApiCallRequest::new("github", "get_user").path_param("username", "ghost");
        let resp = client().execute_request(&def, &req).await.unwrap();
        assert_eq!(resp.status_code, 404);
        assert!(!resp.is_success());
        assert!(resp.body_text().contains("Not Found"));
    }

    #[tokio::test]
    async fn validation_failure_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let def = pointed_at("openweather", &server);

        let err = client()
            .execute_request(&def, &ApiCallRequest::new("openweather", "current_weather"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[tokio::test]
    async fn trace_id_header_is_sent_inside_scope() {
        let server = MockServer::start().await;
        Mock::given(path("/users"))
            .and(header("x-trace-id", "hub-abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let def = pointed_at("jsonplaceholder", &server);

        let req = ApiCallRequest::new("jsonplaceholder", "get_users");
        let client = client();
        let resp = trace::with_trace_id("hub-abc".to_string(), client.execute_request(&def, &req))
            .await
            .unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.data, Value::Null);
    }

    #[tokio::test]
    async fn oversized_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&server)
            .await;
        let def = pointed_at("jsonplaceholder", &server);
        let client = ApiClient::new(&ClientConfig {
            max_response_bytes: 1024,
            ..ClientConfig::default()
        })
        .unwrap();

        let err = client
            .execute_request(&def, &ApiCallRequest::new("jsonplaceholder", "get_users"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport_error");
    }

    #[tokio::test]
    async fn elapsed_deadline_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(path("/users"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;
        let def = pointed_at("jsonplaceholder", &server);
        let client = ApiClient::new(&ClientConfig {
            timeout: Duration::from_millis(50),
            ..ClientConfig::default()
        })
        .unwrap();

        let err = client
            .execute_request(&def, &ApiCallRequest::new("jsonplaceholder", "get_users"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error_without_url() {
        let mut def = ApiRegistry::with_builtins()
            .get("openweather")
            .unwrap()
            .as_ref()
            .clone();
        def.base_url = "http://127.0.0.1:1".to_string();

        let req = ApiCallRequest::new("openweather", "current_weather").with_token("secret-key");
        let err = client().execute_request(&def, &req).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.to_string().contains("secret-key"));
    }

    #[tokio::test]
    async fn post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(header("content-type", "application/json"))
            .and(wiremock::matchers::body_json(json!({ "title": "t", "body": "b", "userId": 1 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 101 })))
            .expect(1)
            .mount(&server)
            .await;
        let def = pointed_at("jsonplaceholder", &server);

        let req = ApiCallRequest::new("jsonplaceholder", "create_post")
            .with_body(json!({ "title": "t", "body": "b", "userId": 1 }));
        let resp = client().execute_request(&def, &req).await.unwrap();
        assert_eq!(resp.status_code, 201);
        assert_eq!(resp.data["id"], 101);
    }
}
