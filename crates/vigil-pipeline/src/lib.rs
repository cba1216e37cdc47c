// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vigil-pipeline
//!
//! The rule pipeline engine of the vigil access decision proxy.
//!
//! For every matched request the engine runs a composable chain of
//! mechanisms:
//!
//! - **Authenticators** establish the subject (first success wins)
//! - **Hydrators** enrich it (all must succeed)
//! - **Authorizers** allow or deny it (all must succeed)
//! - **Unifiers** emit the downstream credentials (exactly one)
//! - **Error handlers** translate failures into verdicts
//!
//! Mechanisms are built from configuration through the factory registry,
//! live as immutable prototypes in the [`registry::MechanismCatalog`], and
//! are rebound per rule via `with_config` overrides.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil_pipeline::jwks::JwkStore;
//! use vigil_pipeline::registry::{register_builtins, MechanismCatalog, MechanismFactoryRegistry};
//! use vigil_pipeline::rule::RuleTable;
//!
//! let mut registry = MechanismFactoryRegistry::new();
//! register_builtins(&mut registry, Arc::new(JwkStore::new()));
//!
//! let catalog = MechanismCatalog::from_config(&registry, &config.pipeline)?;
//! let table = RuleTable::from_config(&config.rules, &catalog)?;
//!
//! let verdict = table.match_rule("GET", "/api/x").unwrap().execute(&ctx).await;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Building Blocks
// =============================================================================

pub mod endpoint;
pub mod extractors;
pub mod jwks;
pub mod oauth2;
pub mod session;

// =============================================================================
// Mechanisms
// =============================================================================

pub mod authenticators;
pub mod authorizers;
pub mod error_handlers;
pub mod hydrators;
pub mod unifiers;

// =============================================================================
// Engine
// =============================================================================

pub mod registry;
pub mod rule;

mod mechanism;

#[cfg(test)]
pub(crate) mod testsupport;

pub use endpoint::Endpoint;
pub use extractors::{CompositeExtractor, ExtractStrategy, ExtractorConfig};
pub use jwks::{JwkStore, DEFAULT_JWKS_TTL};
pub use oauth2::{default_algorithms, Expectation, ScopeStrategy, ScopesMatcher};
pub use session::SessionConfig;

pub use authenticators::{
    AnonymousAuthenticator, Authenticator, CompositeAuthenticator, IntrospectionAuthenticator,
    JwtAuthenticator, NoopAuthenticator, UnauthorizedAuthenticator,
};
pub use authorizers::{
    AllowAuthorizer, Authorizer, CompositeAuthorizer, DenyAuthorizer, RemoteAuthorizer,
    ScopeAuthorizer,
};
pub use error_handlers::{
    CompositeErrorHandler, DefaultErrorHandler, ErrorHandler, RedirectErrorHandler,
    WwwAuthenticateErrorHandler,
};
pub use hydrators::{CompositeHydrator, DefaultHydrator, Hydrator, RemoteHydrator, StaticHydrator};
pub use unifiers::{CookieUnifier, HeaderUnifier, NoopUnifier, Unifier};

pub use registry::{register_builtins, MechanismCatalog, MechanismFactoryRegistry};
pub use rule::{Rule, RuleMatcher, RuleTable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
