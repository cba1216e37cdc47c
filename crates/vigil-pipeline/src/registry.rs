// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mechanism factories and the prototype catalog.
//!
//! The [`MechanismFactoryRegistry`] maps type tags (`jwt`, `allow`, ...)
//! to constructor functions. Builtins are registered explicitly via
//! [`register_builtins`] during bootstrap; there is no hidden global
//! registration.
//!
//! The [`MechanismCatalog`] holds the immutable prototypes built from the
//! configuration's `pipeline` section. Rules bind mechanisms by id, with
//! optional per-rule overrides applied through `with_config`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use vigil_config::{MechanismDecl, PipelineSection};
use vigil_core::{PipelineError, PipelineResult};

use crate::authenticators::{
    AnonymousAuthenticator, Authenticator, IntrospectionAuthenticator, JwtAuthenticator,
    NoopAuthenticator, UnauthorizedAuthenticator,
};
use crate::authorizers::{
    AllowAuthorizer, Authorizer, DenyAuthorizer, RemoteAuthorizer, ScopeAuthorizer,
};
use crate::error_handlers::{
    DefaultErrorHandler, ErrorHandler, RedirectErrorHandler, WwwAuthenticateErrorHandler,
};
use crate::hydrators::{DefaultHydrator, Hydrator, RemoteHydrator, StaticHydrator};
use crate::jwks::JwkStore;
use crate::unifiers::{CookieUnifier, HeaderUnifier, NoopUnifier, Unifier};

// =============================================================================
// Factory Types
// =============================================================================

/// Constructor for authenticator prototypes.
pub type AuthenticatorFactory =
    Arc<dyn Fn(&Value) -> PipelineResult<Arc<dyn Authenticator>> + Send + Sync>;
/// Constructor for hydrator prototypes.
pub type HydratorFactory = Arc<dyn Fn(&Value) -> PipelineResult<Arc<dyn Hydrator>> + Send + Sync>;
/// Constructor for authorizer prototypes.
pub type AuthorizerFactory =
    Arc<dyn Fn(&Value) -> PipelineResult<Arc<dyn Authorizer>> + Send + Sync>;
/// Constructor for unifier prototypes.
pub type UnifierFactory = Arc<dyn Fn(&Value) -> PipelineResult<Arc<dyn Unifier>> + Send + Sync>;
/// Constructor for error handler prototypes.
pub type ErrorHandlerFactory =
    Arc<dyn Fn(&Value) -> PipelineResult<Arc<dyn ErrorHandler>> + Send + Sync>;

// =============================================================================
// MechanismFactoryRegistry
// =============================================================================

/// Registry of mechanism constructors by type tag.
#[derive(Default)]
pub struct MechanismFactoryRegistry {
    authenticators: HashMap<String, AuthenticatorFactory>,
    hydrators: HashMap<String, HydratorFactory>,
    authorizers: HashMap<String, AuthorizerFactory>,
    unifiers: HashMap<String, UnifierFactory>,
    error_handlers: HashMap<String, ErrorHandlerFactory>,
}

impl MechanismFactoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an authenticator factory under the given type tag.
    pub fn register_authenticator(&mut self, tag: impl Into<String>, factory: AuthenticatorFactory) {
        let tag = tag.into();
        debug!(%tag, "registered authenticator factory");
        self.authenticators.insert(tag, factory);
    }

    /// Registers a hydrator factory under the given type tag.
    pub fn register_hydrator(&mut self, tag: impl Into<String>, factory: HydratorFactory) {
        let tag = tag.into();
        debug!(%tag, "registered hydrator factory");
        self.hydrators.insert(tag, factory);
    }

    /// Registers an authorizer factory under the given type tag.
    pub fn register_authorizer(&mut self, tag: impl Into<String>, factory: AuthorizerFactory) {
        let tag = tag.into();
        debug!(%tag, "registered authorizer factory");
        self.authorizers.insert(tag, factory);
    }

    /// Registers a unifier factory under the given type tag.
    pub fn register_unifier(&mut self, tag: impl Into<String>, factory: UnifierFactory) {
        let tag = tag.into();
        debug!(%tag, "registered unifier factory");
        self.unifiers.insert(tag, factory);
    }

    /// Registers an error handler factory under the given type tag.
    pub fn register_error_handler(&mut self, tag: impl Into<String>, factory: ErrorHandlerFactory) {
        let tag = tag.into();
        debug!(%tag, "registered error handler factory");
        self.error_handlers.insert(tag, factory);
    }

    fn create_authenticator(&self, decl: &MechanismDecl) -> PipelineResult<Arc<dyn Authenticator>> {
        let factory = self.authenticators.get(&decl.kind).ok_or_else(|| {
            PipelineError::configuration(format!("unknown authenticator type '{}'", decl.kind))
        })?;
        factory(decl.config.as_ref().unwrap_or(&Value::Null))
    }

    fn create_hydrator(&self, decl: &MechanismDecl) -> PipelineResult<Arc<dyn Hydrator>> {
        let factory = self.hydrators.get(&decl.kind).ok_or_else(|| {
            PipelineError::configuration(format!("unknown hydrator type '{}'", decl.kind))
        })?;
        factory(decl.config.as_ref().unwrap_or(&Value::Null))
    }

    fn create_authorizer(&self, decl: &MechanismDecl) -> PipelineResult<Arc<dyn Authorizer>> {
        let factory = self.authorizers.get(&decl.kind).ok_or_else(|| {
            PipelineError::configuration(format!("unknown authorizer type '{}'", decl.kind))
        })?;
        factory(decl.config.as_ref().unwrap_or(&Value::Null))
    }

    fn create_unifier(&self, decl: &MechanismDecl) -> PipelineResult<Arc<dyn Unifier>> {
        let factory = self.unifiers.get(&decl.kind).ok_or_else(|| {
            PipelineError::configuration(format!("unknown unifier type '{}'", decl.kind))
        })?;
        factory(decl.config.as_ref().unwrap_or(&Value::Null))
    }

    fn create_error_handler(&self, decl: &MechanismDecl) -> PipelineResult<Arc<dyn ErrorHandler>> {
        let factory = self.error_handlers.get(&decl.kind).ok_or_else(|| {
            PipelineError::configuration(format!("unknown error handler type '{}'", decl.kind))
        })?;
        factory(decl.config.as_ref().unwrap_or(&Value::Null))
    }
}

/// Registers all built-in mechanism types.
///
/// Called explicitly during bootstrap; the JWKS store is shared by all
/// token authenticators so key caching is process-wide.
pub fn register_builtins(registry: &mut MechanismFactoryRegistry, jwks: Arc<JwkStore>) {
    // authenticators
    registry.register_authenticator("jwt", {
        let jwks = jwks.clone();
        Arc::new(move |config: &Value| -> PipelineResult<Arc<dyn Authenticator>> {
            Ok(Arc::new(JwtAuthenticator::create(config, jwks.clone())?))
        })
    });
    registry.register_authenticator(
        "oauth2_introspection",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Authenticator>> {
            Ok(Arc::new(IntrospectionAuthenticator::create(config)?))
        }),
    );
    registry.register_authenticator(
        "anonymous",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Authenticator>> {
            Ok(Arc::new(AnonymousAuthenticator::create(config)?))
        }),
    );
    registry.register_authenticator(
        "noop",
        Arc::new(|_: &Value| -> PipelineResult<Arc<dyn Authenticator>> {
            Ok(Arc::new(NoopAuthenticator::create()))
        }),
    );
    registry.register_authenticator(
        "unauthorized",
        Arc::new(|_: &Value| -> PipelineResult<Arc<dyn Authenticator>> {
            Ok(Arc::new(UnauthorizedAuthenticator::create()))
        }),
    );

    // hydrators
    registry.register_hydrator(
        "default",
        Arc::new(|_: &Value| -> PipelineResult<Arc<dyn Hydrator>> {
            Ok(Arc::new(DefaultHydrator::create()))
        }),
    );
    registry.register_hydrator(
        "static",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Hydrator>> {
            Ok(Arc::new(StaticHydrator::create(config)?))
        }),
    );
    registry.register_hydrator(
        "remote",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Hydrator>> {
            Ok(Arc::new(RemoteHydrator::create(config)?))
        }),
    );

    // authorizers
    registry.register_authorizer(
        "allow",
        Arc::new(|_: &Value| -> PipelineResult<Arc<dyn Authorizer>> {
            Ok(Arc::new(AllowAuthorizer::create()))
        }),
    );
    registry.register_authorizer(
        "deny",
        Arc::new(|_: &Value| -> PipelineResult<Arc<dyn Authorizer>> {
            Ok(Arc::new(DenyAuthorizer::create()))
        }),
    );
    registry.register_authorizer(
        "scope",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Authorizer>> {
            Ok(Arc::new(ScopeAuthorizer::create(config)?))
        }),
    );
    registry.register_authorizer(
        "remote",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Authorizer>> {
            Ok(Arc::new(RemoteAuthorizer::create(config)?))
        }),
    );

    // unifiers
    registry.register_unifier(
        "noop",
        Arc::new(|_: &Value| -> PipelineResult<Arc<dyn Unifier>> {
            Ok(Arc::new(NoopUnifier::create()))
        }),
    );
    registry.register_unifier(
        "header",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Unifier>> {
            Ok(Arc::new(HeaderUnifier::create(config)?))
        }),
    );
    registry.register_unifier(
        "cookie",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn Unifier>> {
            Ok(Arc::new(CookieUnifier::create(config)?))
        }),
    );

    // error handlers
    registry.register_error_handler(
        "default",
        Arc::new(|_: &Value| -> PipelineResult<Arc<dyn ErrorHandler>> {
            Ok(Arc::new(DefaultErrorHandler::create()))
        }),
    );
    registry.register_error_handler(
        "redirect",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn ErrorHandler>> {
            Ok(Arc::new(RedirectErrorHandler::create(config)?))
        }),
    );
    registry.register_error_handler(
        "www_authenticate",
        Arc::new(|config: &Value| -> PipelineResult<Arc<dyn ErrorHandler>> {
            Ok(Arc::new(WwwAuthenticateErrorHandler::create(config)?))
        }),
    );
}

// =============================================================================
// MechanismCatalog
// =============================================================================

/// The immutable prototype catalog built from the `pipeline` configuration
/// section.
#[derive(Default)]
pub struct MechanismCatalog {
    authenticators: HashMap<String, Arc<dyn Authenticator>>,
    hydrators: HashMap<String, Arc<dyn Hydrator>>,
    authorizers: HashMap<String, Arc<dyn Authorizer>>,
    unifiers: HashMap<String, Arc<dyn Unifier>>,
    error_handlers: HashMap<String, Arc<dyn ErrorHandler>>,
}

impl std::fmt::Debug for MechanismCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MechanismCatalog").finish_non_exhaustive()
    }
}

impl MechanismCatalog {
    /// Builds all prototypes declared in the pipeline section.
    pub fn from_config(
        registry: &MechanismFactoryRegistry,
        pipeline: &PipelineSection,
    ) -> PipelineResult<Self> {
        let mut catalog = Self::default();

        for decl in &pipeline.authenticators {
            let prototype = registry.create_authenticator(decl)?;
            catalog.authenticators.insert(decl.id.clone(), prototype);
        }
        for decl in &pipeline.hydrators {
            let prototype = registry.create_hydrator(decl)?;
            catalog.hydrators.insert(decl.id.clone(), prototype);
        }
        for decl in &pipeline.authorizers {
            let prototype = registry.create_authorizer(decl)?;
            catalog.authorizers.insert(decl.id.clone(), prototype);
        }
        for decl in &pipeline.unifiers {
            let prototype = registry.create_unifier(decl)?;
            catalog.unifiers.insert(decl.id.clone(), prototype);
        }
        for decl in &pipeline.error_handlers {
            let prototype = registry.create_error_handler(decl)?;
            catalog.error_handlers.insert(decl.id.clone(), prototype);
        }

        Ok(catalog)
    }

    /// Looks up an authenticator prototype by id.
    pub fn authenticator(&self, id: &str) -> PipelineResult<Arc<dyn Authenticator>> {
        self.authenticators.get(id).cloned().ok_or_else(|| {
            PipelineError::configuration(format!("no authenticator with id '{id}'"))
        })
    }

    /// Looks up a hydrator prototype by id.
    pub fn hydrator(&self, id: &str) -> PipelineResult<Arc<dyn Hydrator>> {
        self.hydrators
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::configuration(format!("no hydrator with id '{id}'")))
    }

    /// Looks up an authorizer prototype by id.
    pub fn authorizer(&self, id: &str) -> PipelineResult<Arc<dyn Authorizer>> {
        self.authorizers
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::configuration(format!("no authorizer with id '{id}'")))
    }

    /// Looks up a unifier prototype by id.
    pub fn unifier(&self, id: &str) -> PipelineResult<Arc<dyn Unifier>> {
        self.unifiers
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::configuration(format!("no unifier with id '{id}'")))
    }

    /// Looks up an error handler prototype by id.
    pub fn error_handler(&self, id: &str) -> PipelineResult<Arc<dyn ErrorHandler>> {
        self.error_handlers.get(id).cloned().ok_or_else(|| {
            PipelineError::configuration(format!("no error handler with id '{id}'"))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_registry() -> MechanismFactoryRegistry {
        let mut registry = MechanismFactoryRegistry::new();
        register_builtins(&mut registry, Arc::new(JwkStore::new()));
        registry
    }

    fn pipeline_section(yaml: &str) -> PipelineSection {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_catalog_builds_prototypes() {
        let registry = builtin_registry();
        let pipeline = pipeline_section(
            r#"
authenticators:
  - id: anon
    type: anonymous
  - id: deny_all
    type: unauthorized
authorizers:
  - id: allow_all
    type: allow
unifiers:
  - id: ids
    type: header
    config:
      headers:
        X-User: id
error_handlers:
  - id: default
    type: default
"#,
        );

        let catalog = MechanismCatalog::from_config(&registry, &pipeline).unwrap();

        assert!(catalog.authenticator("anon").is_ok());
        assert!(catalog.authenticator("deny_all").is_ok());
        assert!(catalog.authorizer("allow_all").is_ok());
        assert!(catalog.unifier("ids").is_ok());
        assert!(catalog.error_handler("default").is_ok());
        assert!(catalog.authenticator("missing").is_err());
    }

    #[test]
    fn test_unknown_type_tag_fails() {
        let registry = builtin_registry();
        let pipeline = pipeline_section(
            r#"
authenticators:
  - id: x
    type: does_not_exist
"#,
        );

        assert!(MechanismCatalog::from_config(&registry, &pipeline).is_err());
    }

    #[test]
    fn test_invalid_mechanism_config_fails() {
        let registry = builtin_registry();
        let pipeline = pipeline_section(
            r#"
authenticators:
  - id: jwt_auth
    type: jwt
    config:
      jwt_assertions:
        issuers: [foo]
"#,
        );

        // missing jwks_endpoint
        assert!(MechanismCatalog::from_config(&registry, &pipeline).is_err());
    }
}
