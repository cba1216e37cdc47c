// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unauthorized authenticator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use vigil_core::{
    AuthenticationReason, PipelineError, PipelineResult, RequestContext, Subject,
};

use super::Authenticator;

/// Always fails authentication. Used to lock down routes by configuration.
#[derive(Debug, Clone, Default)]
pub struct UnauthorizedAuthenticator;

impl UnauthorizedAuthenticator {
    /// Creates the authenticator. There is nothing to configure.
    pub fn create() -> Self {
        Self
    }
}

#[async_trait]
impl Authenticator for UnauthorizedAuthenticator {
    async fn authenticate(&self, _ctx: &dyn RequestContext) -> PipelineResult<Subject> {
        Err(PipelineError::authentication(
            AuthenticationReason::Denied,
            "access denied by configuration",
        ))
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Authenticator>> {
        Ok(Arc::new(Self))
    }
}
