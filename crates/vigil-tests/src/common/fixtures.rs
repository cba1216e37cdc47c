// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Canned configuration fixtures.

use std::sync::Arc;

use vigil_config::VigilConfig;
use vigil_pipeline::{
    register_builtins, JwkStore, MechanismCatalog, MechanismFactoryRegistry, RuleTable,
};
use vigil_proxy::AppState;

/// A configuration document guarding `/api/**` with a JWT authenticator
/// and forwarding the subject id upstream.
pub fn jwt_gateway_yaml(jwks_url: &str) -> String {
    format!(
        r#"
serve:
  verbose_errors: true
pipeline:
  authenticators:
    - id: api_jwt
      type: jwt
      config:
        jwks_endpoint:
          url: {jwks_url}
        jwt_assertions:
          issuers: [foobar]
          audiences: [bar]
          scopes:
            values: [foo]
          allowed_algorithms: [PS512]
          validity_leeway: 60s
  unifiers:
    - id: forward_subject
      type: header
      config:
        headers:
          X-Subject: id
rules:
  - id: "rule:api"
    match:
      url: "/api/**"
    execute:
      authenticators: [ {{ ref: api_jwt }} ]
      unifier: {{ ref: forward_subject }}
"#
    )
}

/// Builds registry, catalog and rule table from a configuration document.
pub fn build_table(config: &VigilConfig) -> RuleTable {
    let mut registry = MechanismFactoryRegistry::new();
    register_builtins(
        &mut registry,
        Arc::new(JwkStore::with_default_ttl(config.cache.jwks_ttl)),
    );

    let catalog = MechanismCatalog::from_config(&registry, &config.pipeline)
        .expect("catalog builds from fixture");
    RuleTable::from_config(&config.rules, &catalog).expect("rules build from fixture")
}

/// Builds the proxy state for a configuration document.
pub fn build_state(config: &VigilConfig) -> AppState {
    AppState::new(build_table(config), &config.serve)
}
