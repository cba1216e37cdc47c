// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Scope matching algebras.
//!
//! A [`ScopesMatcher`] decides whether the scopes presented by a credential
//! satisfy the required scopes under one of three strategies:
//!
//! - **Exact**: every required scope must appear verbatim.
//! - **Wildcard**: required entries may contain `*`, matching any run.
//! - **Hierarchic**: scopes are dot-separated; a required `a.b` is satisfied
//!   by a presented `a.b` or anything below it (`a.b.c`).

use regex::Regex;
use serde::Deserialize;

// =============================================================================
// ScopeStrategy
// =============================================================================

/// The algebra used to compare a required scope against presented scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeStrategy {
    /// Verbatim string equality.
    #[default]
    Exact,
    /// `*` in the required entry matches any run of characters.
    Wildcard,
    /// Dot-separated hierarchy; descendants satisfy their ancestors.
    Hierarchic,
}

impl ScopeStrategy {
    /// Returns `true` if `presented` satisfies the single `required` entry.
    fn satisfies(&self, required: &str, presented: &str) -> bool {
        match self {
            ScopeStrategy::Exact => required == presented,
            ScopeStrategy::Wildcard => wildcard_pattern(required)
                .map(|re| re.is_match(presented))
                .unwrap_or(false),
            ScopeStrategy::Hierarchic => {
                presented == required
                    || presented
                        .strip_prefix(required)
                        .map(|rest| rest.starts_with('.'))
                        .unwrap_or(false)
            }
        }
    }
}

/// Compiles a wildcard scope entry into an anchored regex.
fn wildcard_pattern(required: &str) -> Option<Regex> {
    let pattern = format!("^{}$", regex::escape(required).replace(r"\*", ".*"));
    Regex::new(&pattern).ok()
}

// =============================================================================
// ScopesMatcher
// =============================================================================

/// Required scopes plus the strategy used to match them.
///
/// Deserializes from either a bare list (strategy defaults to exact):
///
/// ```yaml
/// scopes:
///   - read
///   - write
/// ```
///
/// or a map with explicit strategy:
///
/// ```yaml
/// scopes:
///   matching_strategy: hierarchic
///   values:
///     - api.read
/// ```
///
/// A `matching_strategy` without `values` is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawScopesMatcher")]
pub struct ScopesMatcher {
    strategy: ScopeStrategy,
    required: Vec<String>,
}

impl ScopesMatcher {
    /// Creates a matcher over the given required scopes.
    pub fn new(strategy: ScopeStrategy, required: Vec<impl Into<String>>) -> Self {
        Self {
            strategy,
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// A matcher without requirements; matches every credential.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns `true` when every required entry has at least one presented
    /// match under the configured strategy.
    pub fn matches(&self, presented: &[String]) -> bool {
        self.required.iter().all(|required| {
            presented
                .iter()
                .any(|scope| self.strategy.satisfies(required, scope))
        })
    }

    /// The required scope entries.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// The configured strategy.
    pub fn strategy(&self) -> ScopeStrategy {
        self.strategy
    }
}

// =============================================================================
// Deserialization
// =============================================================================

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFullMatcher {
    #[serde(default)]
    matching_strategy: Option<ScopeStrategy>,
    #[serde(default)]
    values: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScopesMatcher {
    List(Vec<String>),
    Full(RawFullMatcher),
}

impl TryFrom<RawScopesMatcher> for ScopesMatcher {
    type Error = String;

    fn try_from(raw: RawScopesMatcher) -> Result<Self, Self::Error> {
        match raw {
            RawScopesMatcher::List(values) => Ok(Self {
                strategy: ScopeStrategy::Exact,
                required: values,
            }),
            RawScopesMatcher::Full(full) => match (full.matching_strategy, full.values) {
                (strategy, Some(values)) => Ok(Self {
                    strategy: strategy.unwrap_or_default(),
                    required: values,
                }),
                (Some(_), None) => {
                    Err("scopes configuration provides matching_strategy without values".to_string())
                }
                (None, None) => Ok(Self::default()),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
