// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed configuration schema.
//!
//! The schema mirrors the YAML document layout. All field keys are
//! lowercase; unknown keys are rejected at every level so that typos
//! surface at startup instead of silently configuring nothing.
//!
//! ```yaml
//! serve:
//!   host: 0.0.0.0
//!   port: 4456
//! pipeline:
//!   authenticators:
//!     - id: jwt_auth
//!       type: jwt
//!       config: { ... }
//! rules:
//!   - id: "rule:api"
//!     match: { url: "/api/**", methods: [GET, POST] }
//!     execute:
//!       authenticators: [ { ref: jwt_auth } ]
//! ```

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Root Config
// =============================================================================

/// The root configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VigilConfig {
    /// HTTP serving settings.
    pub serve: ServeConfig,
    /// Logging settings.
    pub log: LogConfig,
    /// Cache settings.
    pub cache: CacheConfig,
    /// Mechanism prototype declarations.
    pub pipeline: PipelineSection,
    /// Rule declarations, in match order.
    pub rules: Vec<RuleDecl>,
}

impl VigilConfig {
    /// Validates cross-field constraints the type system cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        self.pipeline.validate()?;

        let mut rule_ids = HashSet::new();
        for rule in &self.rules {
            if !rule_ids.insert(rule.id.as_str()) {
                return Err(ConfigError::validation(
                    "rules",
                    format!("duplicate rule id '{}'", rule.id),
                ));
            }
            if rule.execute.authenticators.is_empty() {
                return Err(ConfigError::validation(
                    format!("rules[{}]", rule.id),
                    "a rule requires at least one authenticator",
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Serve / Log / Cache
// =============================================================================

/// HTTP serving settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Whether error responses carry a serialized `{code, message}` body.
    pub verbose_errors: bool,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4456,
            verbose_errors: false,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServeConfig {
    /// The socket address string to bind to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for log aggregation.
    Json,
    /// Minimal compact output.
    Compact,
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Default TTL for cached JWK sets.
    #[serde(with = "vigil_core::duration")]
    pub jwks_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            jwks_ttl: Duration::from_secs(300),
        }
    }
}

// =============================================================================
// Pipeline Section
// =============================================================================

/// Declarations of the mechanism prototypes available to rules.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    /// Authenticator prototypes.
    pub authenticators: Vec<MechanismDecl>,
    /// Hydrator prototypes.
    pub hydrators: Vec<MechanismDecl>,
    /// Authorizer prototypes.
    pub authorizers: Vec<MechanismDecl>,
    /// Unifier prototypes.
    pub unifiers: Vec<MechanismDecl>,
    /// Error handler prototypes.
    pub error_handlers: Vec<MechanismDecl>,
}

impl PipelineSection {
    fn validate(&self) -> ConfigResult<()> {
        for (kind, decls) in [
            ("authenticators", &self.authenticators),
            ("hydrators", &self.hydrators),
            ("authorizers", &self.authorizers),
            ("unifiers", &self.unifiers),
            ("error_handlers", &self.error_handlers),
        ] {
            let mut seen = HashSet::new();
            for decl in decls {
                if !seen.insert(decl.id.as_str()) {
                    return Err(ConfigError::validation(
                        format!("pipeline.{kind}"),
                        format!("duplicate mechanism id '{}'", decl.id),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// A single mechanism prototype declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MechanismDecl {
    /// Unique id rules refer to.
    pub id: String,
    /// The mechanism type tag (e.g. `jwt`, `allow`, `header`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific configuration.
    #[serde(default)]
    pub config: Option<Value>,
}

// =============================================================================
// Rules Section
// =============================================================================

/// A rule declaration: a request matcher plus the pipeline to execute.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDecl {
    /// Unique rule id, used in logs.
    pub id: String,
    /// The request matcher.
    #[serde(rename = "match")]
    pub matcher: MatchDecl,
    /// The pipeline to execute for matched requests.
    pub execute: ExecuteDecl,
}

/// Which requests a rule applies to.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchDecl {
    /// URL pattern.
    pub url: String,
    /// Pattern interpretation.
    #[serde(default)]
    pub matching_strategy: UrlStrategy,
    /// HTTP methods the rule applies to. Empty means all methods.
    #[serde(default)]
    pub methods: Vec<String>,
}

/// URL pattern interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStrategy {
    /// Glob pattern: `*` matches within a path segment, `**` across segments.
    #[default]
    Glob,
    /// Anchored regular expression.
    Regex,
}

/// The mechanisms a rule executes, by prototype reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecuteDecl {
    /// Authenticators, tried in order (first success wins).
    pub authenticators: Vec<MechanismRef>,
    /// Hydrators, run in order (all must succeed).
    pub hydrators: Vec<MechanismRef>,
    /// Authorizers, run in order (all must succeed).
    pub authorizers: Vec<MechanismRef>,
    /// The unifier finalizing the outbound mutation. Defaults to noop.
    pub unifier: Option<MechanismRef>,
    /// Error handlers, tried in order. Defaults to the default handler.
    pub error_handlers: Vec<MechanismRef>,
}

/// A reference to a mechanism prototype, with an optional config override.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MechanismRef {
    /// The prototype id.
    #[serde(rename = "ref")]
    pub id: String,
    /// Override configuration applied via `with_config`.
    #[serde(default)]
    pub config: Option<Value>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
serve:
  port: 8080
pipeline:
  authenticators:
    - id: anon
      type: anonymous
rules:
  - id: "rule:all"
    match:
      url: "/**"
    execute:
      authenticators:
        - ref: anon
"#
    }

    #[test]
    fn test_minimal_document() {
        let config: VigilConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.host, "127.0.0.1");
        assert_eq!(config.cache.jwks_ttl, Duration::from_secs(300));
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].matcher.matching_strategy, UrlStrategy::Glob);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: Result<VigilConfig, _> = serde_yaml::from_str("unknown_section: {}");
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_rule_ids_rejected() {
        let yaml = r#"
pipeline:
  authenticators:
    - id: anon
      type: anonymous
rules:
  - id: "r"
    match: { url: "/a" }
    execute: { authenticators: [ { ref: anon } ] }
  - id: "r"
    match: { url: "/b" }
    execute: { authenticators: [ { ref: anon } ] }
"#;
        let config: VigilConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rule_without_authenticator_rejected() {
        let yaml = r#"
rules:
  - id: "r"
    match: { url: "/a" }
    execute: {}
"#;
        let config: VigilConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        let config: LogConfig = serde_yaml::from_str("format: json").unwrap();
        assert_eq!(config.format, LogFormat::Json);
    }
}
