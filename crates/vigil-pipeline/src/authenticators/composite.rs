// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Composite authenticator with first-success semantics.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use vigil_core::{
    AuthenticationReason, PipelineError, PipelineResult, RequestContext, Subject,
};

use super::Authenticator;

/// An ordered list of authenticators.
///
/// The first authenticator to return a subject wins and no further
/// authenticators run. When every authenticator fails, the **last** error
/// is returned; intermediate errors are deliberately suppressed.
///
/// Cancellation short-circuits: a cancelled request is not retried against
/// the remaining authenticators.
pub struct CompositeAuthenticator {
    authenticators: Vec<Arc<dyn Authenticator>>,
}

impl CompositeAuthenticator {
    /// Creates a composite over the given authenticators.
    pub fn new(authenticators: Vec<Arc<dyn Authenticator>>) -> Self {
        Self { authenticators }
    }

    /// The number of composed authenticators.
    pub fn len(&self) -> usize {
        self.authenticators.len()
    }

    /// Returns `true` if no authenticators are composed.
    pub fn is_empty(&self) -> bool {
        self.authenticators.is_empty()
    }
}

#[async_trait]
impl Authenticator for CompositeAuthenticator {
    async fn authenticate(&self, ctx: &dyn RequestContext) -> PipelineResult<Subject> {
        let mut last_error = None;

        for authenticator in &self.authenticators {
            match authenticator.authenticate(ctx).await {
                Ok(subject) => return Ok(subject),
                Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
                Err(error) => {
                    debug!(error = %error, "authenticator failed, trying next");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PipelineError::authentication(
                AuthenticationReason::NoAuthData,
                "no authenticator configured",
            )
        }))
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Authenticator>> {
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
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAuthenticator {
        result: PipelineResult<Subject>,
        calls: AtomicUsize,
    }

    impl ScriptedAuthenticator {
        fn ok(id: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(Subject::new(id)),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(error: PipelineError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(error),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Authenticator for ScriptedAuthenticator {
        async fn authenticate(&self, _ctx: &dyn RequestContext) -> PipelineResult<Subject> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn Authenticator>> {
            Err(PipelineError::configuration("not reconfigurable"))
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let failing = ScriptedAuthenticator::err(PipelineError::authentication(
            AuthenticationReason::NoAuthData,
            "nothing",
        ));
        let succeeding = ScriptedAuthenticator::ok("winner");
        let never_reached = ScriptedAuthenticator::ok("loser");

        let composite = CompositeAuthenticator::new(vec![
            failing.clone(),
            succeeding.clone(),
            never_reached.clone(),
        ]);

        let subject = composite.authenticate(&TestContext::new()).await.unwrap();

        assert_eq!(subject.id, "winner");
        assert_eq!(failing.calls(), 1);
        assert_eq!(succeeding.calls(), 1);
        assert_eq!(never_reached.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_fail_returns_last_error() {
        let first = ScriptedAuthenticator::err(PipelineError::authentication(
            AuthenticationReason::MalformedToken,
            "first",
        ));
        let last = ScriptedAuthenticator::err(PipelineError::authentication(
            AuthenticationReason::BadIssuer,
            "last",
        ));

        let composite = CompositeAuthenticator::new(vec![first, last]);
        let error = composite
            .authenticate(&TestContext::new())
            .await
            .unwrap_err();

        assert_eq!(
            error.authentication_reason(),
            Some(AuthenticationReason::BadIssuer)
        );
    }

    #[tokio::test]
    async fn test_cancellation_short_circuits() {
        let cancelled = ScriptedAuthenticator::err(PipelineError::Cancelled);
        let never_reached = ScriptedAuthenticator::ok("unreachable");

        let composite =
            CompositeAuthenticator::new(vec![cancelled, never_reached.clone()]);
        let error = composite
            .authenticate(&TestContext::new())
            .await
            .unwrap_err();

        assert_eq!(error, PipelineError::Cancelled);
        assert_eq!(never_reached.calls(), 0);
    }

    #[tokio::test]
    async fn test_with_config_is_refused() {
        let composite = CompositeAuthenticator::new(vec![ScriptedAuthenticator::ok("s")]);
        let error = composite.with_config(&Value::Null).unwrap_err();

        assert_eq!(
            error,
            PipelineError::configuration("reconfiguration not allowed")
        );
    }
}
