// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Anonymous authenticator.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use vigil_core::{PipelineError, PipelineResult, RequestContext, Subject};

use crate::mechanism::decode_config;

use super::Authenticator;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AnonymousConfig {
    subject: String,
}

impl Default for AnonymousConfig {
    fn default() -> Self {
        Self {
            subject: "anonymous".to_string(),
        }
    }
}

/// Always succeeds with a configurable subject id (default `anonymous`).
///
/// Used for routes that are open to everyone but still run through the
/// pipeline (e.g. to attach headers or rate limits per rule).
#[derive(Debug, Clone)]
pub struct AnonymousAuthenticator {
    subject: String,
}

impl AnonymousAuthenticator {
    /// Creates an authenticator from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: AnonymousConfig = decode_config(config, "anonymous authenticator")?;
        if config.subject.is_empty() {
            return Err(PipelineError::configuration(
                "anonymous authenticator requires a non-empty subject",
            ));
        }

        Ok(Self {
            subject: config.subject,
        })
    }
}

#[async_trait]
impl Authenticator for AnonymousAuthenticator {
    async fn authenticate(&self, _ctx: &dyn RequestContext) -> PipelineResult<Subject> {
        Ok(Subject::new(self.subject.clone()))
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn Authenticator>> {
        Ok(Arc::new(Self::create(config)?))
    }
}
