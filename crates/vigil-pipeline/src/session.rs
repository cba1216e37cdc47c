// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subject extraction from a claims document.

use serde::Deserialize;
use serde_json::Value;

use vigil_core::{AuthenticationReason, PipelineError, PipelineResult, Subject};

/// Projects a decoded claims document into a [`Subject`].
///
/// Both selectors are dotted paths (`a.b.c`) over the claims JSON.
/// `subject_from` must resolve to a non-empty string (numbers are
/// formatted); `attributes_from` must resolve to an object and defaults to
/// the whole claims document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Selector for the subject id. Defaults to `sub`.
    pub subject_from: String,
    /// Selector for the attribute document. Defaults to the whole claims.
    pub attributes_from: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            subject_from: "sub".to_string(),
            attributes_from: None,
        }
    }
}

impl SessionConfig {
    /// Extracts the subject from the claims document.
    pub fn extract(&self, claims: &Value) -> PipelineResult<Subject> {
        let id = match lookup(claims, &self.subject_from) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(PipelineError::authentication(
                    AuthenticationReason::NoSubject,
                    format!("claim '{}' yields no subject", self.subject_from),
                ))
            }
        };

        let attributes = match &self.attributes_from {
            None => claims.clone(),
            Some(path) => match lookup(claims, path) {
                Some(value @ Value::Object(_)) => value.clone(),
                _ => {
                    return Err(PipelineError::authentication(
                        AuthenticationReason::NoSubject,
                        format!("claim '{path}' yields no attribute document"),
                    ))
                }
            },
        };

        Ok(Subject::with_attributes(id, attributes))
    }
}

/// Resolves a dotted path within a JSON document.
fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_to_sub_and_whole_claims() {
        let claims = json!({"sub": "user-1", "role": "admin"});
        let subject = SessionConfig::default().extract(&claims).unwrap();

        assert_eq!(subject.id, "user-1");
        assert_eq!(subject.attributes, claims);
    }

    #[test]
    fn test_nested_selector() {
        let config: SessionConfig =
            serde_yaml::from_str("subject_from: identity.user_id").unwrap();
        let claims = json!({"identity": {"user_id": "u-42"}});

        assert_eq!(config.extract(&claims).unwrap().id, "u-42");
    }

    #[test]
    fn test_numeric_subject_is_formatted() {
        let claims = json!({"sub": 1234});
        let subject = SessionConfig::default().extract(&claims).unwrap();
        assert_eq!(subject.id, "1234");
    }

    #[test]
    fn test_missing_or_empty_subject() {
        let config = SessionConfig::default();

        let err = config.extract(&json!({})).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::NoSubject)
        );

        let err = config.extract(&json!({"sub": ""})).unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::NoSubject)
        );
    }

    #[test]
    fn test_attributes_selector_must_be_object() {
        let config: SessionConfig =
            serde_yaml::from_str("attributes_from: profile").unwrap();

        let subject = config
            .extract(&json!({"sub": "u", "profile": {"email": "e"}}))
            .unwrap();
        assert_eq!(subject.attributes, json!({"email": "e"}));

        let err = config
            .extract(&json!({"sub": "u", "profile": "scalar"}))
            .unwrap_err();
        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::NoSubject)
        );
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let result: Result<SessionConfig, _> = serde_yaml::from_str("foo: bar");
        assert!(result.is_err());
    }
}
