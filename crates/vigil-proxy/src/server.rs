// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The decision endpoint.
//!
//! Vigil serves a single catch-all route: the fronting proxy mirrors every
//! incoming request to it, and the response decides whether the original
//! request may pass (200 plus the headers to forward), must be redirected,
//! or is rejected with an error status.

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::Response;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use vigil_config::ServeConfig;
use vigil_core::{PipelineError, RequestContext, Verdict};

use crate::context::VigilContext;
use crate::state::AppState;

/// Builds the decision router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(decide)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handles one decision request.
async fn decide(State(state): State<AppState>, request: Request) -> Response<axum::body::Body> {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, state.max_body_bytes()).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let ctx = VigilContext::new(
                &parts,
                axum::body::Bytes::new(),
                state.shutdown_token().child_token(),
            );
            return state.responder().respond(
                &ctx,
                Verdict::denied(PipelineError::argument("request body too large")),
            );
        }
    };

    let ctx = VigilContext::new(&parts, bytes, state.shutdown_token().child_token());
    let table = state.rules();
    let span = info_span!("decide", request_id = %Uuid::now_v7());

    let verdict = async {
        match table.match_rule(ctx.method(), ctx.path()) {
            Some(rule) => {
                debug!(rule = %rule.id(), method = %ctx.method(), path = %ctx.path(), "rule matched");
                rule.execute(&ctx).await
            }
            None => {
                debug!(method = %ctx.method(), path = %ctx.path(), "no rule matched");
                Verdict::denied(PipelineError::authorization(format!(
                    "no rule matches {} {}",
                    ctx.method(),
                    ctx.path()
                )))
            }
        }
    }
    .instrument(span)
    .await;

    state.responder().respond(&ctx, verdict)
}

/// Binds the listener and serves until the state's shutdown token fires.
pub async fn serve(state: AppState, config: &ServeConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "decision endpoint listening");

    let shutdown = state.shutdown_token().clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

// =============================================================================
// Tests
// =============================================================================
