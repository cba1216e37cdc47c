// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Claim validation policy.
//!
//! An [`Expectation`] bundles everything a credential has to satisfy:
//! trusted issuers, target audiences, required scopes, the allow-listed
//! signature algorithms and the validity leeway. It is immutable once
//! constructed; rebinding a mechanism to a rule produces a new Expectation.
//!
//! Assertions run in a fixed order and the first failure wins:
//! algorithm → issuer → audience → validity window → scopes.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use serde_json::Value;

use vigil_core::{AuthenticationReason, PipelineError, PipelineResult};

use super::scopes::ScopesMatcher;

// =============================================================================
// Expectation
// =============================================================================

/// The claim validation policy applied by token-based authenticators.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectation {
    /// Required scopes and their matching strategy.
    pub scopes: ScopesMatcher,

    /// Audiences this service accepts. Empty disables the audience check.
    #[serde(rename = "audiences")]
    pub target_audiences: Vec<String>,

    /// Issuers whose tokens are accepted. Must not be empty for token
    /// authenticators; enforced at construction.
    #[serde(rename = "issuers")]
    pub trusted_issuers: Vec<String>,

    /// Signature algorithms accepted for verification.
    ///
    /// The default excludes `none` and the HMAC family: only the asymmetric
    /// RS, ES and PS algorithms are allow-listed.
    pub allowed_algorithms: Vec<Algorithm>,

    /// Slack applied symmetrically to `nbf` and `exp`.
    #[serde(with = "vigil_core::duration")]
    pub validity_leeway: Duration,
}

impl Default for Expectation {
    fn default() -> Self {
        Self {
            scopes: ScopesMatcher::none(),
            target_audiences: Vec::new(),
            trusted_issuers: Vec::new(),
            allowed_algorithms: default_algorithms(),
            validity_leeway: Duration::ZERO,
        }
    }
}

/// The default algorithm allow-list: the asymmetric RS, ES and PS families.
pub fn default_algorithms() -> Vec<Algorithm> {
    vec![
        Algorithm::RS256,
        Algorithm::RS384,
        Algorithm::RS512,
        Algorithm::ES256,
        Algorithm::ES384,
        Algorithm::PS256,
        Algorithm::PS384,
        Algorithm::PS512,
    ]
}

impl Expectation {
    /// Returns `true` if the given algorithm is allow-listed.
    pub fn allows_algorithm(&self, algorithm: Algorithm) -> bool {
        self.allowed_algorithms.contains(&algorithm)
    }

    /// Asserts that the given algorithm is allow-listed.
    pub fn assert_algorithm(&self, algorithm: Algorithm) -> PipelineResult<()> {
        if self.allows_algorithm(algorithm) {
            Ok(())
        } else {
            Err(PipelineError::authentication(
                AuthenticationReason::BadAlgorithm,
                format!("algorithm {algorithm:?} is not allowed"),
            ))
        }
    }

    /// Asserts that the `iss` claim names a trusted issuer.
    pub fn assert_issuer(&self, claims: &Value) -> PipelineResult<()> {
        let issuer = claims.get("iss").and_then(Value::as_str).unwrap_or("");
        if self.trusted_issuers.iter().any(|trusted| trusted == issuer) {
            Ok(())
        } else {
            Err(PipelineError::authentication(
                AuthenticationReason::BadIssuer,
                format!("issuer '{issuer}' is not trusted"),
            ))
        }
    }

    /// Asserts that at least one `aud` entry is targeted at this service.
    ///
    /// An empty target set disables the check. The `aud` claim may be a
    /// single string or an array of strings.
    pub fn assert_audience(&self, claims: &Value) -> PipelineResult<()> {
        if self.target_audiences.is_empty() {
            return Ok(());
        }

        let presented = claim_strings(claims.get("aud"));
        if presented
            .iter()
            .any(|audience| self.target_audiences.contains(audience))
        {
            Ok(())
        } else {
            Err(PipelineError::authentication(
                AuthenticationReason::BadAudience,
                "token is not targeted at this service",
            ))
        }
    }

    /// Asserts the validity window with the configured leeway applied
    /// symmetrically to `nbf` and `exp`. Absent claims skip their check.
    pub fn assert_validity(&self, claims: &Value) -> PipelineResult<()> {
        let now = Utc::now().timestamp();
        let leeway = self.validity_leeway.as_secs() as i64;

        if let Some(nbf) = claims.get("nbf").and_then(Value::as_i64) {
            if now < nbf - leeway {
                return Err(PipelineError::authentication(
                    AuthenticationReason::NotYetValid,
                    "token is not yet valid",
                ));
            }
        }

        if let Some(exp) = claims.get("exp").and_then(Value::as_i64) {
            if now > exp + leeway {
                return Err(PipelineError::authentication(
                    AuthenticationReason::Expired,
                    "token expired",
                ));
            }
        }

        Ok(())
    }

    /// Asserts the required scopes against the presented ones.
    ///
    /// Presented scopes are the union of the `scp` claim and the
    /// space-separated `scope` claim.
    pub fn assert_scopes(&self, claims: &Value) -> PipelineResult<()> {
        let presented = presented_scopes(claims);
        if self.scopes.matches(&presented) {
            Ok(())
        } else {
            Err(PipelineError::authentication(
                AuthenticationReason::ScopeMismatch,
                "presented scopes do not satisfy the required scopes",
            ))
        }
    }

    /// Runs all claim assertions in order; the first failure wins.
    pub fn assert_claims(&self, claims: &Value, algorithm: Algorithm) -> PipelineResult<()> {
        self.assert_algorithm(algorithm)?;
        self.assert_issuer(claims)?;
        self.assert_audience(claims)?;
        self.assert_validity(claims)?;
        self.assert_scopes(claims)?;
        Ok(())
    }
}

// =============================================================================
// Claim Helpers
// =============================================================================

/// Collects the presented scopes: the union of `scp` (string or array) and
/// the space-separated `scope` claim.
pub fn presented_scopes(claims: &Value) -> Vec<String> {
    let mut scopes = claim_strings(claims.get("scp"));

    for entry in claim_strings(claims.get("scope")) {
        for scope in entry.split_whitespace() {
            let scope = scope.to_string();
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
    }

    scopes
}

/// Reads a claim that may be a single string or an array of strings.
fn claim_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expectation() -> Expectation {
        Expectation {
            trusted_issuers: vec!["issuer-1".to_string()],
            target_audiences: vec!["aud-1".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_default_excludes_hmac_and_none() {
        let defaults = default_algorithms();
        assert_eq!(defaults.len(), 8);
        assert!(!defaults.contains(&Algorithm::HS256));
        assert!(!defaults.contains(&Algorithm::HS384));
        assert!(!defaults.contains(&Algorithm::HS512));
        assert!(!defaults.contains(&Algorithm::EdDSA));
        assert!(defaults.contains(&Algorithm::PS512));
        assert!(defaults.contains(&Algorithm::ES256));
        assert!(defaults.contains(&Algorithm::RS256));
    }

    #[test]
    fn test_assert_algorithm() {
        let exp = expectation();
        assert!(exp.assert_algorithm(Algorithm::PS512).is_ok());

        let err = exp.assert_algorithm(Algorithm::HS256).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::BadAlgorithm)
        );
    }

    #[test]
    fn test_assert_issuer() {
        let exp = expectation();
        assert!(exp.assert_issuer(&json!({"iss": "issuer-1"})).is_ok());

        let err = exp.assert_issuer(&json!({"iss": "other"})).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::BadIssuer)
        );

        let err = exp.assert_issuer(&json!({})).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::BadIssuer)
        );
    }

    #[test]
    fn test_assert_audience_string_and_array() {
        let exp = expectation();
        assert!(exp.assert_audience(&json!({"aud": "aud-1"})).is_ok());
        assert!(exp
            .assert_audience(&json!({"aud": ["other", "aud-1"]}))
            .is_ok());

        let err = exp.assert_audience(&json!({"aud": ["other"]})).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::BadAudience)
        );
    }

    #[test]
    fn test_assert_audience_disabled_when_no_targets() {
        let exp = Expectation {
            target_audiences: Vec::new(),
            ..expectation()
        };
        assert!(exp.assert_audience(&json!({})).is_ok());
    }

    #[test]
    fn test_validity_leeway_is_symmetric() {
        let exp = Expectation {
            validity_leeway: Duration::from_secs(60),
            ..expectation()
        };
        let now = Utc::now().timestamp();

        // expired 30s ago, leeway 60s: still valid
        assert!(exp
            .assert_validity(&json!({"exp": now - 30, "nbf": now - 100}))
            .is_ok());

        // expired 90s ago, leeway 60s: rejected
        let err = exp.assert_validity(&json!({"exp": now - 90})).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::Expired)
        );

        // valid in 30s, leeway 60s: already acceptable
        assert!(exp.assert_validity(&json!({"nbf": now + 30})).is_ok());

        // valid in 90s, leeway 60s: rejected
        let err = exp.assert_validity(&json!({"nbf": now + 90})).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::NotYetValid)
        );
    }

    #[test]
    fn test_presented_scopes_union() {
        let scopes = presented_scopes(&json!({
            "scp": ["foo", "bar"],
            "scope": "bar baz"
        }));
        assert_eq!(scopes, vec!["foo", "bar", "baz"]);

        let scopes = presented_scopes(&json!({"scp": "single"}));
        assert_eq!(scopes, vec!["single"]);
    }

    #[test]
    fn test_assert_claims_order() {
        // A token that fails both algorithm and issuer checks must report
        // the algorithm failure first.
        let exp = expectation();
        let err = exp
            .assert_claims(&json!({"iss": "other"}), Algorithm::HS256)
            .unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::BadAlgorithm)
        );
    }

    #[test]
    fn test_deserialize_rejects_unknown_keys() {
        let result: Result<Expectation, _> = serde_yaml::from_str("unknown: true");
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_with_overrides() {
        let exp: Expectation = serde_yaml::from_str(
            r#"
issuers: [foobar]
allowed_algorithms: [ES384]
validity_leeway: 60s
"#,
        )
        .unwrap();

        assert_eq!(exp.trusted_issuers, vec!["foobar"]);
        assert_eq!(exp.allowed_algorithms, vec![Algorithm::ES384]);
        assert_eq!(exp.validity_leeway, Duration::from_secs(60));
    }
}
