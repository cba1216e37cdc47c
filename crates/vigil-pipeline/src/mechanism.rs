// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared mechanism plumbing.

use serde::de::DeserializeOwned;
use serde_json::Value;

use vigil_core::{PipelineError, PipelineResult};

/// Decodes an optional mechanism configuration.
///
/// A `null`/absent configuration yields the type's defaults. Unknown keys
/// are rejected by the target types (`deny_unknown_fields`), so typos fail
/// construction instead of silently configuring nothing.
pub(crate) fn decode_config<T>(config: &Value, mechanism: &str) -> PipelineResult<T>
where
    T: DeserializeOwned + Default,
{
    if config.is_null() {
        return Ok(T::default());
    }

    serde_json::from_value(config.clone()).map_err(|e| {
        PipelineError::configuration(format!("invalid {mechanism} configuration: {e}"))
    })
}

/// Decodes a mechanism configuration that must be present.
pub(crate) fn decode_required_config<T>(config: &Value, mechanism: &str) -> PipelineResult<T>
where
    T: DeserializeOwned,
{
    if config.is_null() {
        return Err(PipelineError::configuration(format!(
            "{mechanism} requires a configuration"
        )));
    }

    serde_json::from_value(config.clone()).map_err(|e| {
        PipelineError::configuration(format!("invalid {mechanism} configuration: {e}"))
    })
}
