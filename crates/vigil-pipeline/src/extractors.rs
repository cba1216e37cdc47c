// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auth-data extraction strategies.
//!
//! Extractors pull a raw credential string out of the request according to
//! an ordered list of sources. Each primitive strategy looks at exactly one
//! place (header, cookie, query or form parameter); the composite walks its
//! list and returns the first hit.

use serde::Deserialize;

use vigil_core::{AuthenticationReason, PipelineError, PipelineResult, RequestContext};

// =============================================================================
// ExtractStrategy
// =============================================================================

/// A primitive auth-data extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractStrategy {
    /// Reads a request header, optionally stripping a scheme prefix.
    Header {
        /// Header name.
        name: String,
        /// Case-sensitive prefix to strip (e.g. `Bearer`).
        prefix: Option<String>,
    },
    /// Reads a cookie value.
    Cookie {
        /// Cookie name.
        name: String,
    },
    /// Reads the first query parameter value.
    Query {
        /// Parameter name.
        name: String,
    },
    /// Reads a form parameter from an `application/x-www-form-urlencoded`
    /// body, optionally stripping a prefix.
    Form {
        /// Parameter name.
        name: String,
        /// Case-sensitive prefix to strip.
        prefix: Option<String>,
    },
}

impl ExtractStrategy {
    /// Extracts the credential, or fails with `no_auth_data`.
    pub fn extract(&self, ctx: &dyn RequestContext) -> PipelineResult<String> {
        let value = match self {
            ExtractStrategy::Header { name, prefix } => {
                ctx.header(name).and_then(|v| strip(&v, prefix.as_deref()))
            }
            ExtractStrategy::Cookie { name } => ctx.cookie(name).filter(|v| !v.is_empty()),
            ExtractStrategy::Query { name } => {
                ctx.query_parameter(name).filter(|v| !v.is_empty())
            }
            ExtractStrategy::Form { name, prefix } => ctx
                .form_parameter(name)
                .and_then(|v| strip(&v, prefix.as_deref())),
        };

        value.ok_or_else(|| {
            PipelineError::authentication(
                AuthenticationReason::NoAuthData,
                "no authentication data present",
            )
        })
    }
}

/// Strips the optional prefix and surrounding whitespace. Empty results are
/// treated as absent.
fn strip(value: &str, prefix: Option<&str>) -> Option<String> {
    let stripped = match prefix {
        Some(prefix) => value.strip_prefix(prefix).unwrap_or(value),
        None => value,
    };
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// CompositeExtractor
// =============================================================================

/// An ordered list of extraction strategies; the first hit wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeExtractor {
    strategies: Vec<ExtractStrategy>,
}

impl CompositeExtractor {
    /// Creates a composite over the given strategies.
    pub fn new(strategies: Vec<ExtractStrategy>) -> Self {
        Self { strategies }
    }

    /// The default extraction triplet: `Authorization: Bearer ...` header,
    /// `access_token` cookie, `access_token` query parameter.
    pub fn default_strategies() -> Self {
        Self::new(vec![
            ExtractStrategy::Header {
                name: "Authorization".to_string(),
                prefix: Some("Bearer".to_string()),
            },
            ExtractStrategy::Cookie {
                name: "access_token".to_string(),
            },
            ExtractStrategy::Query {
                name: "access_token".to_string(),
            },
        ])
    }

    /// Extracts the credential from the first strategy that yields one.
    pub fn extract(&self, ctx: &dyn RequestContext) -> PipelineResult<String> {
        for strategy in &self.strategies {
            if let Ok(value) = strategy.extract(ctx) {
                return Ok(value);
            }
        }

        Err(PipelineError::authentication(
            AuthenticationReason::NoAuthData,
            "no authentication data present",
        ))
    }

    /// The strategies in evaluation order.
    pub fn strategies(&self) -> &[ExtractStrategy] {
        &self.strategies
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration form of a single extraction strategy.
///
/// Exactly one of the source keys must be set:
///
/// ```yaml
/// jwt_token_from:
///   - header: Authorization
///     prefix: Bearer
///   - cookie: access_token
///   - query_parameter: access_token
///   - form_parameter: access_token
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    header: Option<String>,
    cookie: Option<String>,
    query_parameter: Option<String>,
    form_parameter: Option<String>,
    prefix: Option<String>,
}

impl TryFrom<ExtractorConfig> for ExtractStrategy {
    type Error = PipelineError;

    fn try_from(config: ExtractorConfig) -> Result<Self, Self::Error> {
        let sources = [
            config.header.is_some(),
            config.cookie.is_some(),
            config.query_parameter.is_some(),
            config.form_parameter.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();

        if sources != 1 {
            return Err(PipelineError::configuration(
                "an extractor requires exactly one of header, cookie, query_parameter, form_parameter",
            ));
        }

        if let Some(name) = config.header {
            return Ok(ExtractStrategy::Header {
                name,
                prefix: config.prefix,
            });
        }
        if let Some(name) = config.form_parameter {
            return Ok(ExtractStrategy::Form {
                name,
                prefix: config.prefix,
            });
        }
        if config.prefix.is_some() {
            return Err(PipelineError::configuration(
                "prefix is only supported for header and form_parameter extractors",
            ));
        }
        if let Some(name) = config.cookie {
            return Ok(ExtractStrategy::Cookie { name });
        }

        Ok(ExtractStrategy::Query {
            name: config.query_parameter.expect("one source is set"),
        })
    }
}

/// Builds a composite extractor from configuration, falling back to the
/// default triplet when no strategies are configured.
pub fn from_config(configs: Option<Vec<ExtractorConfig>>) -> PipelineResult<CompositeExtractor> {
    match configs {
        None => Ok(CompositeExtractor::default_strategies()),
        Some(configs) if configs.is_empty() => Ok(CompositeExtractor::default_strategies()),
        Some(configs) => {
            let strategies = configs
                .into_iter()
                .map(ExtractStrategy::try_from)
                .collect::<PipelineResult<Vec<_>>>()?;
            Ok(CompositeExtractor::new(strategies))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
