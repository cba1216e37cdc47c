// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and environment overlay.
//!
//! # Loading Pipeline
//!
//! 1. Parse the YAML file into an untyped JSON value tree
//! 2. Overlay environment variables (`VIGIL_*`)
//! 3. Deserialize into the typed [`VigilConfig`] schema
//! 4. Validate cross-field constraints
//!
//! # Environment Variable Overlay
//!
//! `VIGIL_SERVE_PORT=9090` overrides `serve.port`. Underscores are
//! ambiguous (they appear both as hierarchy separators and inside keys such
//! as `verbose_errors`), so every `.`/`_` split interpretation of the
//! variable name is tried against the document; a candidate applies only
//! when its parent path already exists. Variables that match no known path
//! are ignored with a debug log.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::VigilConfig;

/// Environment variable prefix.
const ENV_PREFIX: &str = "VIGIL_";

// =============================================================================
// ConfigLoader
// =============================================================================

/// Loads the vigil configuration from a YAML file plus environment overlay.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Whether environment variables are overlaid. On by default.
    skip_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables the environment overlay (used by tests).
    pub fn without_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads and validates configuration from the given file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<VigilConfig> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.load_str(&content)
    }

    /// Loads and validates configuration from a YAML string.
    pub fn load_str(&self, content: &str) -> ConfigResult<VigilConfig> {
        let mut doc: Value = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::parse(e.to_string()))?;

        if doc.is_null() {
            doc = Value::Object(serde_json::Map::new());
        }

        if !self.skip_env {
            let vars = env::vars().filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|stripped| (stripped.to_string(), value))
            });
            apply_env_overlay(&mut doc, vars);
        }

        let config: VigilConfig =
            serde_json::from_value(doc).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }
}

// =============================================================================
// Environment Overlay
// =============================================================================

/// Overlays the given variables onto the untyped configuration tree.
///
/// Variable names are expected with the `VIGIL_` prefix already stripped.
pub fn apply_env_overlay(doc: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
    for (name, value) in vars {
        let lowered = name.to_lowercase();
        let parts: Vec<&str> = lowered.split('_').collect();

        let mut applied = false;
        for candidate in expand_splits(&parts) {
            if overlay_path(doc, &candidate, &value) {
                debug!(path = %candidate.join("."), "applied environment override");
                applied = true;
                break;
            }
        }

        if !applied {
            debug!(variable = %name, "environment variable matches no configuration path");
        }
    }
}

/// Expands an underscore-separated name into every `.`/`_` interpretation.
///
/// `["serve", "verbose", "errors"]` yields `serve.verbose.errors`,
/// `serve.verbose_errors`, `serve_verbose.errors` and `serve_verbose_errors`
/// as candidate paths (here represented as segment lists).
fn expand_splits(parts: &[&str]) -> Vec<Vec<String>> {
    if parts.len() <= 1 {
        return vec![parts.iter().map(|s| s.to_string()).collect()];
    }

    let tails = expand_splits(&parts[1..]);
    let mut result = Vec::with_capacity(tails.len() * 2);
    for tail in &tails {
        // head as its own path segment
        let mut split = Vec::with_capacity(tail.len() + 1);
        split.push(parts[0].to_string());
        split.extend(tail.iter().cloned());
        result.push(split);

        // head fused with the first tail segment
        let mut fused = tail.clone();
        fused[0] = format!("{}_{}", parts[0], fused[0]);
        result.push(fused);
    }
    result
}

/// Sets `value` at `path` if the parent path exists in the document.
///
/// Returns `true` when the override was applied.
fn overlay_path(doc: &mut Value, path: &[String], value: &str) -> bool {
    let (leaf, parents) = match path.split_last() {
        Some(split) => split,
        None => return false,
    };

    let mut current = doc;
    for segment in parents {
        current = match current.get_mut(segment) {
            Some(next) => next,
            None => return false,
        };
    }

    match current.as_object_mut() {
        Some(object) => {
            object.insert(leaf.clone(), coerce(value));
            true
        }
        None => false,
    }
}

/// Coerces an environment value into the most specific JSON type.
fn coerce(value: &str) -> Value {
    if let Ok(b) = value.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = value.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(f) {
            return Value::Number(number);
        }
    }
    Value::String(value.to_string())
}

// =============================================================================
// Tests
// =============================================================================
