// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # vigil-proxy
//!
//! HTTP decision boundary for the vigil access decision proxy.
//!
//! This crate owns everything that touches axum: the request context
//! implementation the pipeline runs against, the verdict-to-response
//! mapping (including the content-negotiated verbose error bodies), the
//! atomically swappable rule table state, and the catch-all decision
//! endpoint itself.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod context;
pub mod response;
pub mod server;
pub mod state;

pub use context::VigilContext;
pub use response::Responder;
pub use server::{router, serve};
pub use state::AppState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
