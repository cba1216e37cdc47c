// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authenticators: mechanisms that establish the request's subject.
//!
//! Every authenticator implements the same interface; rules compose them in
//! a [`CompositeAuthenticator`] with first-success semantics. Variants:
//!
//! - `jwt` — verifies a JWT against a remote JWK set
//! - `oauth2_introspection` — validates a token at an introspection endpoint
//! - `anonymous` — always succeeds with a configurable subject
//! - `noop` — authentication disabled; placeholder subject
//! - `unauthorized` — always fails

mod anonymous;
mod composite;
mod introspection;
mod jwt;
mod noop;
mod unauthorized;

pub use anonymous::AnonymousAuthenticator;
pub use composite::CompositeAuthenticator;
pub use introspection::IntrospectionAuthenticator;
pub use jwt::JwtAuthenticator;
pub use noop::NoopAuthenticator;
pub use unauthorized::UnauthorizedAuthenticator;

use std::sync::Arc;

use async_trait::async_trait;

use vigil_core::{PipelineResult, RequestContext, Subject};

/// A mechanism that derives an authenticated [`Subject`] from the request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Attempts to authenticate the request.
    async fn authenticate(&self, ctx: &dyn RequestContext) -> PipelineResult<Subject>;

    /// Derives a new authenticator from this prototype with the given
    /// configuration override. The prototype itself is never mutated.
    ///
    /// Composites refuse reconfiguration with a configuration error.
    fn with_config(&self, config: &serde_json::Value) -> PipelineResult<Arc<dyn Authenticator>>;
}
