// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vigil-config
//!
//! Configuration schema and loader for the vigil access decision proxy.
//!
//! Configuration is a YAML document with lowercase keys, overlaid with
//! `VIGIL_*` environment variables and deserialized into the typed
//! [`VigilConfig`] schema. Mechanism-specific configuration stays untyped
//! here (`serde_json::Value`) and is interpreted by the mechanism factories
//! in `vigil-pipeline`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{
    CacheConfig, ExecuteDecl, LogConfig, LogFormat, MatchDecl, MechanismDecl, MechanismRef,
    PipelineSection, RuleDecl, ServeConfig, UrlStrategy, VigilConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
