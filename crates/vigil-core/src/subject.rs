// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The authenticated principal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The authenticated principal established by an authenticator.
///
/// A subject lives for a single request. It is created by exactly one
/// authenticator, may be enriched by hydrators, and is consumed by
/// authorizers and unifiers.
///
/// # Invariant
///
/// `id` is never empty once an authenticator has returned success.
/// Authenticators enforce this at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// The principal identifier (typically the `sub` claim).
    pub id: String,

    /// Attributes attached to the principal, usually the decoded claims
    /// document. Always a JSON object.
    #[serde(default = "empty_attributes")]
    pub attributes: Value,
}

fn empty_attributes() -> Value {
    Value::Object(serde_json::Map::new())
}

impl Subject {
    /// Creates a subject with an empty attribute set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: empty_attributes(),
        }
    }

    /// Creates a subject with the given attributes.
    pub fn with_attributes(id: impl Into<String>, attributes: Value) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Looks up an attribute by dotted path (`a.b.c`).
    ///
    /// The reserved path `id` resolves to the subject id.
    pub fn attribute(&self, path: &str) -> Option<Value> {
        if path == "id" {
            return Some(Value::String(self.id.clone()));
        }

        let mut current = &self.attributes;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }

        Some(current.clone())
    }

    /// Merges the fields of a JSON object into the attribute set.
    ///
    /// Existing keys are overwritten. Non-object attribute sets are replaced
    /// by an object first.
    pub fn merge_attributes(&mut self, values: &serde_json::Map<String, Value>) {
        if !self.attributes.is_object() {
            self.attributes = empty_attributes();
        }

        let target = self.attributes.as_object_mut().expect("attributes are an object");
        for (key, value) in values {
            target.insert(key.clone(), value.clone());
        }
    }

    /// Sets a single attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        if !self.attributes.is_object() {
            self.attributes = empty_attributes();
        }

        self.attributes
            .as_object_mut()
            .expect("attributes are an object")
            .insert(key.into(), value);
    }
}

// =============================================================================
// Tests
// =============================================================================
