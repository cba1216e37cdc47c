// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Outbound HTTP endpoint abstraction.
//!
//! Everything the pipeline talks to over HTTP (JWKS documents, token
//! introspection, remote hydration and authorization) is described by an
//! [`Endpoint`]: URL, method, request headers and timeouts. The endpoint
//! owns a pooled `reqwest` client and honors the request context's
//! cancellation token at every suspension point.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use vigil_core::{PipelineError, PipelineResult};

// =============================================================================
// Endpoint
// =============================================================================

/// An outbound HTTP endpoint with its request defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Endpoint {
    /// Endpoint URL.
    pub url: String,

    /// HTTP method. Defaults to `GET`.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers. Defaults to `Accept: application/json`.
    #[serde(default = "default_headers")]
    pub headers: HashMap<String, String>,

    /// Connect timeout. Defaults to 5 seconds.
    #[serde(default = "default_connect_timeout", with = "vigil_core::duration")]
    pub connect_timeout: Duration,

    /// Total request deadline. Defaults to 10 seconds.
    #[serde(default = "default_timeout", with = "vigil_core::duration")]
    pub timeout: Duration,

    #[serde(skip)]
    client: OnceLock<Client>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_headers() -> HashMap<String, String> {
    HashMap::from([("Accept".to_string(), "application/json".to_string())])
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.method == other.method
            && self.headers == other.headers
            && self.connect_timeout == other.connect_timeout
            && self.timeout == other.timeout
    }
}

impl Endpoint {
    /// Creates an endpoint for the given URL with all defaults.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: default_headers(),
            connect_timeout: default_connect_timeout(),
            timeout: default_timeout(),
            client: OnceLock::new(),
        }
    }

    /// Validates URL, method and headers.
    ///
    /// Called by mechanism factories so that malformed endpoints surface as
    /// configuration errors at construction, never during request handling.
    pub fn validate(&self) -> PipelineResult<()> {
        Url::parse(&self.url)
            .map_err(|e| PipelineError::configuration(format!("invalid endpoint url '{}': {e}", self.url)))?;

        Method::from_bytes(self.method.as_bytes())
            .map_err(|_| PipelineError::configuration(format!("invalid http method '{}'", self.method)))?;

        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| PipelineError::configuration(format!("invalid header name '{name}'")))?;
            HeaderValue::from_str(value)
                .map_err(|_| PipelineError::configuration(format!("invalid header value for '{name}'")))?;
        }

        Ok(())
    }

    /// Sends the request without a body and decodes the JSON response.
    pub async fn send<T: DeserializeOwned>(&self, cancel: &CancellationToken) -> PipelineResult<T> {
        self.dispatch(cancel, Body::Empty).await
    }

    /// Sends the request with a form-encoded body.
    pub async fn send_form<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        params: &[(&str, &str)],
    ) -> PipelineResult<T> {
        self.dispatch(cancel, Body::Form(params)).await
    }

    /// Sends the request with a JSON body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        body: &Value,
    ) -> PipelineResult<T> {
        self.dispatch(cancel, Body::Json(body)).await
    }

    /// Sends the request with a JSON body and returns the response status
    /// without treating error statuses as failures. The body is drained.
    pub async fn probe(&self, cancel: &CancellationToken, body: &Value) -> PipelineResult<u16> {
        let request = self.build_request(Body::Json(body))?;

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            let status = response.status();
            let _ = response
                .bytes()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            Ok(status.as_u16())
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = exchange => result,
        }
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        body: Body<'_>,
    ) -> PipelineResult<T> {
        let request = self.build_request(body)?;

        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            let status = response.status();
            // always drain the body, also on error statuses
            let bytes = response
                .bytes()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            if !status.is_success() {
                return Err(PipelineError::communication(
                    format!("'{}' answered with status {status}", self.url),
                    status.is_server_error(),
                ));
            }

            serde_json::from_slice::<T>(&bytes).map_err(|e| {
                PipelineError::communication(
                    format!("unexpected response from '{}': {e}", self.url),
                    false,
                )
            })
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = exchange => result,
        }
    }

    fn build_request(&self, body: Body<'_>) -> PipelineResult<reqwest::RequestBuilder> {
        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|_| PipelineError::internal(format!("invalid http method '{}'", self.method)))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| PipelineError::internal(format!("invalid header name '{name}'")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| PipelineError::internal("invalid header value"))?;
            headers.insert(name, value);
        }

        let request = self.client()?.request(method, &self.url).headers(headers);
        Ok(match body {
            Body::Empty => request,
            Body::Form(params) => request.form(params),
            Body::Json(value) => request.json(value),
        })
    }

    fn client(&self) -> PipelineResult<&Client> {
        if self.client.get().is_none() {
            let client = Client::builder()
                .connect_timeout(self.connect_timeout)
                .timeout(self.timeout)
                .build()
                .map_err(|e| PipelineError::internal(format!("failed to build http client: {e}")))?;
            let _ = self.client.set(client);
        }

        Ok(self.client.get().expect("client initialized above"))
    }

    fn map_transport_error(&self, error: reqwest::Error) -> PipelineError {
        if error.is_timeout() {
            PipelineError::timeout(self.timeout)
        } else {
            PipelineError::communication(
                format!("request to '{}' failed: {error}", self.url),
                error.is_connect(),
            )
        }
    }
}

enum Body<'a> {
    Empty,
    Form(&'a [(&'a str, &'a str)]),
    Json(&'a Value),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_deserialize_defaults() {
        let endpoint: Endpoint = serde_yaml::from_str("url: http://test.local/jwks").unwrap();

        assert_eq!(endpoint.method, "GET");
        assert_eq!(
            endpoint.headers.get("Accept").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(endpoint.connect_timeout, Duration::from_secs(5));
        assert_eq!(endpoint.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut endpoint = Endpoint::new("not a url");
        assert!(endpoint.validate().is_err());

        endpoint = Endpoint::new("http://test.local");
        endpoint.method = "NOT A METHOD".to_string();
        assert!(endpoint.validate().is_err());

        endpoint = Endpoint::new("http://test.local");
        endpoint
            .headers
            .insert("bad\nname".to_string(), "x".to_string());
        assert!(endpoint.validate().is_err());
    }

    #[tokio::test]
    async fn test_send_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("Accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let endpoint = Endpoint::new(format!("{}/data", server.uri()));
        let value: Value = endpoint.send(&CancellationToken::new()).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_send_form_posts_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/introspect"))
            .and(body_string_contains("token=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"active": true})))
            .mount(&server)
            .await;

        let mut endpoint = Endpoint::new(format!("{}/introspect", server.uri()));
        endpoint.method = "POST".to_string();

        let value: Value = endpoint
            .send_form(&CancellationToken::new(), &[("token", "abc")])
            .await
            .unwrap();
        assert_eq!(value["active"], json!(true));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_communication() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let endpoint = Endpoint::new(server.uri());
        let result: PipelineResult<Value> = endpoint.send(&CancellationToken::new()).await;

        match result.unwrap_err() {
            PipelineError::Communication { transient, .. } => assert!(transient),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let endpoint = Endpoint::new(server.uri());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: PipelineResult<Value> = endpoint.send(&cancel).await;
        assert_eq!(result.unwrap_err(), PipelineError::Cancelled);
    }
}
