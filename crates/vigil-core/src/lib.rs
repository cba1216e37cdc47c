// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vigil-core
//!
//! Core abstractions and shared types for the vigil access decision proxy.
//!
//! This crate provides the foundational types used across all vigil
//! components:
//!
//! - **Subject**: the authenticated principal `{id, attributes}`
//! - **RequestContext**: the per-request abstraction mechanisms run against
//! - **Verdict**: the outcome of a pipeline run
//! - **Error**: the unified pipeline error hierarchy
//! - **Duration**: serde support for humane duration strings
//!
//! ## Example
//!
//! ```
//! use vigil_core::{AuthenticationReason, PipelineError, Subject, Verdict};
//!
//! let subject = Subject::new("user-1");
//! let verdict = Verdict::accepted(subject);
//! assert!(verdict.is_accepted());
//!
//! let error = PipelineError::authentication(AuthenticationReason::Expired, "token expired");
//! assert_eq!(error.status_code(), 401);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod context;
pub mod duration;
pub mod error;
pub mod subject;
pub mod verdict;

pub use context::RequestContext;
pub use error::{AuthenticationReason, PipelineError, PipelineResult};
pub use subject::Subject;
pub use verdict::Verdict;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
