// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OAuth2 token introspection authenticator (RFC 7662).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use vigil_core::{
    AuthenticationReason, PipelineError, PipelineResult, RequestContext, Subject,
};

use crate::endpoint::Endpoint;
use crate::extractors::{self, CompositeExtractor, ExtractorConfig};
use crate::mechanism::decode_required_config;
use crate::oauth2::Expectation;
use crate::session::SessionConfig;

use super::Authenticator;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IntrospectionConfig {
    introspection_endpoint: Endpoint,
    #[serde(default)]
    token_from: Option<Vec<ExtractorConfig>>,
    #[serde(default)]
    assertions: Expectation,
    #[serde(default)]
    session: SessionConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct IntrospectionOverride {
    #[serde(default)]
    assertions: Option<Expectation>,
}

// =============================================================================
// IntrospectionAuthenticator
// =============================================================================

/// Validates an opaque token at a remote introspection endpoint.
///
/// The introspection response claims run through the same Expectation
/// assertions as JWT claims (minus the algorithm check, which does not
/// apply to opaque tokens), then the session settings project them into
/// the subject.
#[derive(Debug, Clone)]
pub struct IntrospectionAuthenticator {
    endpoint: Endpoint,
    extractor: CompositeExtractor,
    expectation: Expectation,
    session: SessionConfig,
}

impl IntrospectionAuthenticator {
    /// Creates an authenticator from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: IntrospectionConfig =
            decode_required_config(config, "introspection authenticator")?;

        let mut endpoint = config.introspection_endpoint;
        // introspection is always a POST per RFC 7662
        endpoint.method = "POST".to_string();
        endpoint.validate()?;

        if config.assertions.trusted_issuers.is_empty() {
            return Err(PipelineError::configuration(
                "introspection authenticator requires at least one trusted issuer",
            ));
        }

        Ok(Self {
            endpoint,
            extractor: extractors::from_config(config.token_from)?,
            expectation: config.assertions,
            session: config.session,
        })
    }

    /// The introspection endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The claim validation policy.
    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }
}

#[async_trait]
impl Authenticator for IntrospectionAuthenticator {
    async fn authenticate(&self, ctx: &dyn RequestContext) -> PipelineResult<Subject> {
        let token = self.extractor.extract(ctx)?;

        let response: Value = self
            .endpoint
            .send_form(
                ctx.cancellation(),
                &[("token", token.as_str()), ("token_type_hint", "access_token")],
            )
            .await?;

        let active = response
            .get("active")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !active {
            return Err(PipelineError::authentication(
                AuthenticationReason::Denied,
                "token is not active",
            ));
        }

        self.expectation.assert_issuer(&response)?;
        self.expectation.assert_audience(&response)?;
        self.expectation.assert_validity(&response)?;
        self.expectation.assert_scopes(&response)?;

        let subject = self.session.extract(&response)?;
        debug!(subject = %subject.id, "introspection authentication succeeded");

        Ok(subject)
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Authenticator>> {
        let override_config: IntrospectionOverride = if config.is_null() {
            IntrospectionOverride::default()
        } else {
            serde_json::from_value(config.clone()).map_err(|e| {
                PipelineError::configuration(format!(
                    "invalid introspection authenticator override: {e}"
                ))
            })?
        };

        let mut derived = self.clone();
        if let Some(assertions) = override_config.assertions {
            if assertions.trusted_issuers.is_empty() {
                return Err(PipelineError::configuration(
                    "introspection authenticator override requires at least one trusted issuer",
                ));
            }
            derived.expectation = assertions;
        }

        Ok(Arc::new(derived))
    }
}

// =============================================================================
// Tests
// =============================================================================
