// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Hydrators: mechanisms that enrich the authenticated subject.
//!
//! Hydrators run after authentication with all-success semantics: the
//! first failure aborts the pipeline and is handed to the error handlers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use vigil_core::{PipelineError, PipelineResult, RequestContext, Subject};

use crate::endpoint::Endpoint;
use crate::mechanism::{decode_config, decode_required_config};

// =============================================================================
// Hydrator Trait
// =============================================================================

/// A mechanism that enriches the subject with additional attributes.
#[async_trait]
pub trait Hydrator: Send + Sync {
    /// Enriches the subject in place.
    async fn hydrate(&self, ctx: &dyn RequestContext, subject: &mut Subject)
        -> PipelineResult<()>;

    /// Derives a new hydrator from this prototype with the given override.
    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Hydrator>>;
}

// =============================================================================
// DefaultHydrator
// =============================================================================

/// Leaves the subject untouched.
#[derive(Debug, Clone, Default)]
pub struct DefaultHydrator;

impl DefaultHydrator {
    /// Creates the hydrator. There is nothing to configure.
    pub fn create() -> Self {
        Self
    }
}

#[async_trait]
impl Hydrator for DefaultHydrator {
    async fn hydrate(
        &self,
        _ctx: &dyn RequestContext,
        _subject: &mut Subject,
    ) -> PipelineResult<()> {
        Ok(())
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Hydrator>> {
        Ok(Arc::new(Self))
    }
}

// =============================================================================
// StaticHydrator
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StaticConfig {
    attributes: Map<String, Value>,
}

/// Merges a configured attribute object into the subject.
#[derive(Debug, Clone)]
pub struct StaticHydrator {
    attributes: Map<String, Value>,
}

impl StaticHydrator {
    /// Creates a hydrator from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: StaticConfig = decode_config(config, "static hydrator")?;
        Ok(Self {
            attributes: config.attributes,
        })
    }
}

#[async_trait]
impl Hydrator for StaticHydrator {
    async fn hydrate(
        &self,
        _ctx: &dyn RequestContext,
        subject: &mut Subject,
    ) -> PipelineResult<()> {
        subject.merge_attributes(&self.attributes);
        Ok(())
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Hydrator>> {
        Ok(Arc::new(Self::create(config)?))
    }
}

// =============================================================================
// RemoteHydrator
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteConfig {
    endpoint: Endpoint,
    #[serde(default)]
    attribute_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoteOverride {
    #[serde(default)]
    attribute_key: Option<String>,
}

/// Posts the subject to an endpoint and merges the JSON response into the
/// attributes.
///
/// With `attribute_key` configured, the response lands under that single
/// key; otherwise the response must be an object and its fields are merged
/// at the top level.
#[derive(Debug, Clone)]
pub struct RemoteHydrator {
    endpoint: Endpoint,
    attribute_key: Option<String>,
}

impl RemoteHydrator {
    /// Creates a hydrator from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: RemoteConfig = decode_required_config(config, "remote hydrator")?;
        config.endpoint.validate()?;

        Ok(Self {
            endpoint: config.endpoint,
            attribute_key: config.attribute_key,
        })
    }
}

#[async_trait]
impl Hydrator for RemoteHydrator {
    async fn hydrate(
        &self,
        ctx: &dyn RequestContext,
        subject: &mut Subject,
    ) -> PipelineResult<()> {
        let payload = serde_json::json!({
            "subject": subject.id,
            "attributes": subject.attributes,
        });

        let response: Value = self
            .endpoint
            .send_json(ctx.cancellation(), &payload)
            .await?;

        match &self.attribute_key {
            Some(key) => subject.set_attribute(key.clone(), response),
            None => match response.as_object() {
                Some(object) => subject.merge_attributes(object),
                None => {
                    return Err(PipelineError::communication(
                        format!(
                            "hydration endpoint '{}' returned a non-object document",
                            self.endpoint.url
                        ),
                        false,
                    ))
                }
            },
        }

        Ok(())
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Hydrator>> {
        let override_config: RemoteOverride = decode_config(config, "remote hydrator")?;

        let mut derived = self.clone();
        if let Some(key) = override_config.attribute_key {
            derived.attribute_key = Some(key);
        }

        Ok(Arc::new(derived))
    }
}

// =============================================================================
// CompositeHydrator
// =============================================================================

/// Runs hydrators in order; every one of them must succeed.
pub struct CompositeHydrator {
    hydrators: Vec<Arc<dyn Hydrator>>,
}

impl CompositeHydrator {
    /// Creates a composite over the given hydrators.
    pub fn new(hydrators: Vec<Arc<dyn Hydrator>>) -> Self {
        Self { hydrators }
    }

    /// The number of composed hydrators.
    pub fn len(&self) -> usize {
        self.hydrators.len()
    }

    /// Returns `true` if no hydrators are composed.
    pub fn is_empty(&self) -> bool {
        self.hydrators.is_empty()
    }
}

#[async_trait]
impl Hydrator for CompositeHydrator {
    async fn hydrate(&self, ctx: &dyn RequestContext, subject: &mut Subject)
        -> PipelineResult<()> {
        for hydrator in &self.hydrators {
            if ctx.cancellation().is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            hydrator.hydrate(ctx, subject).await?;
        }
        Ok(())
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Hydrator>> {
        Err(PipelineError::configuration("reconfiguration not allowed"))
    }
}

// =============================================================================
// Tests
// =============================================================================
