// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unifiers: mechanisms that finalize the outbound request mutation.
//!
//! Exactly one unifier runs per rule, after authorization succeeded. It
//! turns the established subject into downstream credentials, typically
//! headers the fronting proxy forwards to the upstream service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use vigil_core::{PipelineResult, RequestContext, Subject};

use crate::mechanism::decode_config;

// =============================================================================
// Unifier Trait
// =============================================================================

/// A mechanism that emits downstream credentials for the subject.
#[async_trait]
pub trait Unifier: Send + Sync {
    /// Applies the outbound mutation for the given subject.
    async fn unify(&self, ctx: &dyn RequestContext, subject: &Subject) -> PipelineResult<()>;

    /// Derives a new unifier from this prototype with the given override.
    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Unifier>>;
}

// =============================================================================
// NoopUnifier
// =============================================================================

/// Emits nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopUnifier;

impl NoopUnifier {
    /// Creates the unifier. There is nothing to configure.
    pub fn create() -> Self {
        Self
    }
}

#[async_trait]
impl Unifier for NoopUnifier {
    async fn unify(&self, _ctx: &dyn RequestContext, _subject: &Subject) -> PipelineResult<()> {
        Ok(())
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Unifier>> {
        Ok(Arc::new(Self))
    }
}

// =============================================================================
// HeaderUnifier
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HeaderConfig {
    headers: HashMap<String, String>,
}

/// Sets upstream headers from subject attribute selectors.
///
/// Each entry maps a header name to a dotted attribute path; the reserved
/// path `id` resolves to the subject id. Selectors that resolve to nothing
/// are skipped.
#[derive(Debug, Clone)]
pub struct HeaderUnifier {
    headers: HashMap<String, String>,
}

impl HeaderUnifier {
    /// Creates a unifier from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: HeaderConfig = decode_config(config, "header unifier")?;
        Ok(Self {
            headers: config.headers,
        })
    }
}

#[async_trait]
impl Unifier for HeaderUnifier {
    async fn unify(&self, ctx: &dyn RequestContext, subject: &Subject) -> PipelineResult<()> {
        for (name, selector) in &self.headers {
            match subject.attribute(selector) {
                Some(Value::String(value)) => ctx.set_upstream_header(name, &value),
                Some(Value::Number(value)) => ctx.set_upstream_header(name, &value.to_string()),
                Some(Value::Bool(value)) => ctx.set_upstream_header(name, &value.to_string()),
                Some(other) => ctx.set_upstream_header(name, &other.to_string()),
                None => {
                    debug!(header = %name, selector = %selector, "selector yields nothing, skipping header");
                }
            }
        }
        Ok(())
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Unifier>> {
        Ok(Arc::new(Self::create(config)?))
    }
}

// =============================================================================
// CookieUnifier
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CookieConfig {
    cookies: HashMap<String, String>,
}

/// Sets an upstream `Cookie` header from subject attribute selectors.
#[derive(Debug, Clone)]
pub struct CookieUnifier {
    cookies: HashMap<String, String>,
}

impl CookieUnifier {
    /// Creates a unifier from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: CookieConfig = decode_config(config, "cookie unifier")?;
        Ok(Self {
            cookies: config.cookies,
        })
    }
}

#[async_trait]
impl Unifier for CookieUnifier {
    async fn unify(&self, ctx: &dyn RequestContext, subject: &Subject) -> PipelineResult<()> {
        let mut pairs: Vec<String> = Vec::with_capacity(self.cookies.len());

        // sorted for a deterministic header value
        let mut names: Vec<_> = self.cookies.keys().collect();
        names.sort();

        for name in names {
            let selector = &self.cookies[name];
            if let Some(value) = subject.attribute(selector) {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                pairs.push(format!("{name}={value}"));
            }
        }

        if !pairs.is_empty() {
            ctx.set_upstream_header("Cookie", &pairs.join("; "));
        }

        Ok(())
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Unifier>> {
        Ok(Arc::new(Self::create(config)?))
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

    #[tokio::test]
    async fn test_header_unifier_sets_selected_attributes() {
        let unifier = HeaderUnifier::create(&json!({
            "headers": {
                "X-User": "id",
                "X-Email": "email",
                "X-Missing": "nope"
            }
        }))
        .unwrap();

        let ctx = TestContext::new();
        let subject = Subject::with_attributes("user-1", json!({"email": "u@example.com"}));

        unifier.unify(&ctx, &subject).await.unwrap();

        let headers = ctx.upstream_headers();
        assert!(headers.contains(&("X-User".to_string(), "user-1".to_string())));
        assert!(headers.contains(&("X-Email".to_string(), "u@example.com".to_string())));
        assert!(!headers.iter().any(|(name, _)| name == "X-Missing"));
    }

    #[tokio::test]
    async fn test_cookie_unifier_builds_cookie_header() {
        let unifier = CookieUnifier::create(&json!({
            "cookies": {
                "uid": "id",
                "tier": "tier"
            }
        }))
        .unwrap();

        let ctx = TestContext::new();
        let subject = Subject::with_attributes("user-1", json!({"tier": "gold"}));

        unifier.unify(&ctx, &subject).await.unwrap();

        let headers = ctx.upstream_headers();
        assert_eq!(
            headers,
            vec![("Cookie".to_string(), "tier=gold; uid=user-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_noop_emits_nothing() {
        let ctx = TestContext::new();
        NoopUnifier::create()
            .unify(&ctx, &Subject::new("u"))
            .await
            .unwrap();
        assert!(ctx.upstream_headers().is_empty());
    }
}
