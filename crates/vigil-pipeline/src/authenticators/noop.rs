// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Noop authenticator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use vigil_core::{PipelineResult, RequestContext, Subject};

use super::Authenticator;

/// Authentication disabled: always succeeds with the fixed placeholder
/// subject `noop`.
///
/// Intended for rules where the upstream does its own authentication and
/// vigil only contributes authorization or header mutation.
#[derive(Debug, Clone, Default)]
pub struct NoopAuthenticator;

impl NoopAuthenticator {
    /// Creates the authenticator. There is nothing to configure.
    pub fn create() -> Self {
        Self
    }
}

#[async_trait]
impl Authenticator for NoopAuthenticator {
    async fn authenticate(&self, _ctx: &dyn RequestContext) -> PipelineResult<Subject> {
        Ok(Subject::new("noop"))
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Authenticator>> {
        Ok(Arc::new(Self))
    }
}
