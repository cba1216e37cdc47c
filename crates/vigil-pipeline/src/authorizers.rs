// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authorizers: mechanisms that decide whether the subject may pass.
//!
//! Authorizers run after hydration with all-success semantics.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use vigil_core::{PipelineError, PipelineResult, RequestContext, Subject};

use crate::endpoint::Endpoint;
use crate::mechanism::{decode_config, decode_required_config};

// =============================================================================
// Authorizer Trait
// =============================================================================

/// A mechanism that allows or denies the authenticated subject.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Checks whether the subject may perform the request.
    async fn authorize(&self, ctx: &dyn RequestContext, subject: &Subject) -> PipelineResult<()>;

    /// Derives a new authorizer from this prototype with the given override.
    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Authorizer>>;
}

// =============================================================================
// AllowAuthorizer / DenyAuthorizer
// =============================================================================

/// Allows every subject.
#[derive(Debug, Clone, Default)]
pub struct AllowAuthorizer;

impl AllowAuthorizer {
    /// Creates the authorizer. There is nothing to configure.
    pub fn create() -> Self {
        Self
    }
}

#[async_trait]
impl Authorizer for AllowAuthorizer {
    async fn authorize(&self, _ctx: &dyn RequestContext, _subject: &Subject)
        -> PipelineResult<()> {
        Ok(())
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Authorizer>> {
        Ok(Arc::new(Self))
    }
}

/// Denies every subject.
#[derive(Debug, Clone, Default)]
pub struct DenyAuthorizer;

impl DenyAuthorizer {
    /// Creates the authorizer. There is nothing to configure.
    pub fn create() -> Self {
        Self
    }
}

#[async_trait]
impl Authorizer for DenyAuthorizer {
    async fn authorize(&self, _ctx: &dyn RequestContext, _subject: &Subject)
        -> PipelineResult<()> {
        Err(PipelineError::authorization("access denied"))
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Authorizer>> {
        Ok(Arc::new(Self))
    }
}

// =============================================================================
// ScopeAuthorizer
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScopeConfig {
    required: Vec<String>,
    attribute: Option<String>,
}

/// Requires the subject to carry the configured scope values.
///
/// Scopes are read from the attribute named by `attribute` (default `scp`),
/// which may be a string or an array of strings.
#[derive(Debug, Clone)]
pub struct ScopeAuthorizer {
    required: Vec<String>,
    attribute: String,
}

impl ScopeAuthorizer {
    /// Creates an authorizer from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: ScopeConfig = decode_config(config, "scope authorizer")?;
        Ok(Self {
            required: config.required,
            attribute: config.attribute.unwrap_or_else(|| "scp".to_string()),
        })
    }
}

#[async_trait]
impl Authorizer for ScopeAuthorizer {
    async fn authorize(&self, _ctx: &dyn RequestContext, subject: &Subject)
        -> PipelineResult<()> {
        let presented: Vec<String> = match subject.attribute(&self.attribute) {
            Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        for required in &self.required {
            if !presented.contains(required) {
                return Err(PipelineError::authorization(format!(
                    "subject '{}' lacks required scope '{required}'",
                    subject.id
                )));
            }
        }

        Ok(())
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Authorizer>> {
        Ok(Arc::new(Self::create(config)?))
    }
}

// =============================================================================
// RemoteAuthorizer
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteConfig {
    endpoint: Endpoint,
}

/// Delegates the decision to a remote endpoint.
///
/// The subject is posted as JSON; a 2xx response allows the request, 401
/// and 403 deny it, anything else is a communication error.
#[derive(Debug, Clone)]
pub struct RemoteAuthorizer {
    endpoint: Endpoint,
}

impl RemoteAuthorizer {
    /// Creates an authorizer from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: RemoteConfig = decode_required_config(config, "remote authorizer")?;

        let mut endpoint = config.endpoint;
        endpoint.method = "POST".to_string();
        endpoint.validate()?;

        Ok(Self { endpoint })
    }
}

#[async_trait]
impl Authorizer for RemoteAuthorizer {
    async fn authorize(&self, ctx: &dyn RequestContext, subject: &Subject)
        -> PipelineResult<()> {
        let payload = serde_json::json!({
            "subject": subject.id,
            "attributes": subject.attributes,
            "method": ctx.method(),
            "path": ctx.path(),
        });

        let status = self.endpoint.probe(ctx.cancellation(), &payload).await?;

        match status {
            200..=299 => Ok(()),
            401 | 403 => Err(PipelineError::authorization(format!(
                "subject '{}' denied by '{}'",
                subject.id, self.endpoint.url
            ))),
            status => Err(PipelineError::communication(
                format!(
                    "authorization endpoint '{}' answered with status {status}",
                    self.endpoint.url
                ),
                status >= 500,
            )),
        }
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Authorizer>> {
        if config.is_null() {
            return Ok(Arc::new(self.clone()));
        }
        Ok(Arc::new(Self::create(config)?))
    }
}

// =============================================================================
// CompositeAuthorizer
// =============================================================================

/// Runs authorizers in order; every one of them must allow the request.
pub struct CompositeAuthorizer {
    authorizers: Vec<Arc<dyn Authorizer>>,
}

impl CompositeAuthorizer {
    /// Creates a composite over the given authorizers.
    pub fn new(authorizers: Vec<Arc<dyn Authorizer>>) -> Self {
        Self { authorizers }
    }

    /// The number of composed authorizers.
    pub fn len(&self) -> usize {
        self.authorizers.len()
    }

    /// Returns `true` if no authorizers are composed.
    pub fn is_empty(&self) -> bool {
        self.authorizers.is_empty()
    }
}

#[async_trait]
impl Authorizer for CompositeAuthorizer {
    async fn authorize(&self, ctx: &dyn RequestContext, subject: &Subject)
        -> PipelineResult<()> {
        for authorizer in &self.authorizers {
            if ctx.cancellation().is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            authorizer.authorize(ctx, subject).await?;
        }
        Ok(())
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Authorizer>> {
        Err(PipelineError::configuration("reconfiguration not allowed"))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestContext;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_allow_and_deny() {
        let subject = Subject::new("u");
        let ctx = TestContext::new();

        assert!(AllowAuthorizer::create()
            .authorize(&ctx, &subject)
            .await
            .is_ok());

        let error = DenyAuthorizer::create()
            .authorize(&ctx, &subject)
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::Authorization { .. }));
    }

    #[tokio::test]
    async fn test_scope_authorizer() {
        let authorizer =
            ScopeAuthorizer::create(&json!({"required": ["read", "write"]})).unwrap();
        let ctx = TestContext::new();

        let subject = Subject::with_attributes("u", json!({"scp": ["read", "write", "x"]}));
        assert!(authorizer.authorize(&ctx, &subject).await.is_ok());

        let subject = Subject::with_attributes("u", json!({"scp": "read"}));
        assert!(authorizer.authorize(&ctx, &subject).await.is_err());
    }

    #[tokio::test]
    async fn test_remote_authorizer_allows_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/authz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let authorizer = RemoteAuthorizer::create(&json!({
            "endpoint": { "url": format!("{}/authz", server.uri()) }
        }))
        .unwrap();

        let result = authorizer
            .authorize(&TestContext::new(), &Subject::new("u"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_remote_authorizer_denies_on_403() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let authorizer = RemoteAuthorizer::create(&json!({
            "endpoint": { "url": server.uri() }
        }))
        .unwrap();

        let error = authorizer
            .authorize(&TestContext::new(), &Subject::new("u"))
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::Authorization { .. }));
    }

    #[tokio::test]
    async fn test_composite_all_must_allow() {
        let composite = CompositeAuthorizer::new(vec![
            Arc::new(AllowAuthorizer),
            Arc::new(DenyAuthorizer),
            Arc::new(AllowAuthorizer),
        ]);

        let error = composite
            .authorize(&TestContext::new(), &Subject::new("u"))
            .await
            .unwrap_err();
        assert!(matches!(error, PipelineError::Authorization { .. }));
    }
}
