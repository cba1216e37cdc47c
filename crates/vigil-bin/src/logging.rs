// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging bootstrap for the vigil binary.
//!
//! The library crates only emit `tracing` events; choosing where they go
//! happens here, once, before the first decision is served. The decision
//! endpoint wraps every pipeline run in a `decide` span carrying the
//! request id, so the JSON format keeps the current span attached to each
//! event for log correlation.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vigil_config::LogFormat;

/// Dependencies whose per-request chatter drowns out decision logs at
/// `debug`: the HTTP stack serving the decision endpoint and the outbound
/// client doing JWKS and introspection calls.
const QUIET_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "h2", "tower_http", "reqwest"];

/// Initializes the logging subsystem.
///
/// `level` applies to vigil's own crates; the dependencies in
/// [`QUIET_DEPENDENCIES`] are capped at `warn`. A `RUST_LOG` environment
/// variable replaces the whole filter when set.
pub fn init_logging(level: &str, format: LogFormat) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => QUIET_DEPENDENCIES
            .iter()
            .fold(EnvFilter::new(level), |filter, dependency| {
                filter.add_directive(quiet(dependency))
            }),
    };

    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_ansi(is_terminal))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            // current span = the `decide` span with the request id
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).with_ansi(is_terminal))
            .init(),
    }
}

/// Caps a dependency at `warn`.
fn quiet(dependency: &str) -> Directive {
    format!("{dependency}=warn")
        .parse()
        .expect("directive built from a static crate name")
}

// =============================================================================
// Tests
// =============================================================================
