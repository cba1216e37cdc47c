// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT authenticator.
//!
//! Verifies a JWT credential end to end: extraction, header parsing, key
//! lookup against the configured JWKS endpoint, signature verification and
//! claim assertions, finally projecting the claims into a subject.
//!
//! The algorithm allow-list is checked before any JWKS I/O, so a token
//! signed with a disallowed algorithm never triggers a key fetch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use vigil_core::{
    AuthenticationReason, PipelineError, PipelineResult, RequestContext, Subject,
};

use crate::endpoint::Endpoint;
use crate::extractors::{self, CompositeExtractor, ExtractorConfig};
use crate::jwks::JwkStore;
use crate::mechanism::decode_required_config;
use crate::oauth2::Expectation;
use crate::session::SessionConfig;

use super::Authenticator;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JwtConfig {
    jwks_endpoint: Endpoint,
    #[serde(default)]
    jwt_token_from: Option<Vec<ExtractorConfig>>,
    #[serde(default)]
    jwt_assertions: Expectation,
    #[serde(default)]
    session: SessionConfig,
    #[serde(default, with = "vigil_core::duration::option")]
    cache_ttl: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct JwtOverride {
    #[serde(default)]
    jwt_assertions: Option<Expectation>,
    #[serde(default, with = "vigil_core::duration::option")]
    cache_ttl: Option<Duration>,
}

// =============================================================================
// JwtAuthenticator
// =============================================================================

/// Authenticates requests carrying a JWT, verified against a remote JWKS.
#[derive(Debug, Clone)]
pub struct JwtAuthenticator {
    endpoint: Endpoint,
    extractor: CompositeExtractor,
    expectation: Expectation,
    session: SessionConfig,
    cache_ttl: Option<Duration>,
    store: Arc<JwkStore>,
}

impl JwtAuthenticator {
    /// Creates an authenticator from its configuration.
    ///
    /// `jwks_endpoint.url` and at least one trusted issuer are mandatory;
    /// unknown configuration keys are rejected.
    pub fn create(config: &Value, store: Arc<JwkStore>) -> PipelineResult<Self> {
        let config: JwtConfig = decode_required_config(config, "jwt authenticator")?;

        config.jwks_endpoint.validate()?;
        if config.jwt_assertions.trusted_issuers.is_empty() {
            return Err(PipelineError::configuration(
                "jwt authenticator requires at least one trusted issuer",
            ));
        }

        Ok(Self {
            endpoint: config.jwks_endpoint,
            extractor: extractors::from_config(config.jwt_token_from)?,
            expectation: config.jwt_assertions,
            session: config.session,
            cache_ttl: config.cache_ttl,
            store,
        })
    }

    /// The JWKS endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The auth-data extractor.
    pub fn extractor(&self) -> &CompositeExtractor {
        &self.extractor
    }

    /// The claim validation policy.
    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// The subject extraction settings.
    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// The configured JWKS TTL override.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }

    /// Derives a new authenticator with the Expectation (and optionally the
    /// JWKS TTL) replaced. Endpoint, extractors and session are inherited;
    /// overriding anything else is a configuration error.
    pub fn reconfigure(&self, config: &Value) -> PipelineResult<JwtAuthenticator> {
        let override_config: JwtOverride = if config.is_null() {
            JwtOverride::default()
        } else {
            serde_json::from_value(config.clone()).map_err(|e| {
                PipelineError::configuration(format!("invalid jwt authenticator override: {e}"))
            })?
        };

        let mut derived = self.clone();

        if let Some(assertions) = override_config.jwt_assertions {
            if assertions.trusted_issuers.is_empty() {
                return Err(PipelineError::configuration(
                    "jwt authenticator override requires at least one trusted issuer",
                ));
            }
            derived.expectation = assertions;
        }
        if let Some(ttl) = override_config.cache_ttl {
            derived.cache_ttl = Some(ttl);
        }

        Ok(derived)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, ctx: &dyn RequestContext) -> PipelineResult<Subject> {
        let token = self.extractor.extract(ctx)?;

        let header = decode_header(&token).map_err(|e| {
            PipelineError::authentication(
                AuthenticationReason::MalformedToken,
                format!("failed to parse token header: {e}"),
            )
        })?;

        // checked before any JWKS I/O
        self.expectation.assert_algorithm(header.alg)?;

        let kid = header.kid.ok_or_else(|| {
            PipelineError::authentication(
                AuthenticationReason::UnknownKey,
                "token specifies no key id",
            )
        })?;

        let jwk = self
            .store
            .key_for(
                &self.endpoint,
                ctx.cancellation(),
                &kid,
                header.alg,
                self.cache_ttl,
            )
            .await?;

        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            PipelineError::internal(format!("failed to build verification key: {e}"))
        })?;

        // Signature only; the claim assertions below own issuer, audience,
        // validity and scopes so that reason codes stay stable.
        let mut validation = Validation::new(header.alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = Default::default();

        let data = decode::<Value>(&token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => PipelineError::authentication(
                AuthenticationReason::BadSignature,
                "token signature is invalid",
            ),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                PipelineError::authentication(
                    AuthenticationReason::MalformedToken,
                    format!("malformed token: {e}"),
                )
            }
            _ => PipelineError::authentication(
                AuthenticationReason::BadSignature,
                format!("token verification failed: {e}"),
            ),
        })?;

        self.expectation.assert_claims(&data.claims, header.alg)?;

        let subject = self.session.extract(&data.claims)?;
        debug!(subject = %subject.id, "jwt authentication succeeded");

        Ok(subject)
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Authenticator>> {
        Ok(Arc::new(self.reconfigure(config)?))
    }
}

// =============================================================================
// Tests
// =============================================================================
