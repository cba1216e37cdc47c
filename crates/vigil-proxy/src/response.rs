// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Verdict to HTTP response mapping.
//!
//! The responder is the only place where pipeline outcomes become HTTP:
//! accepted requests answer 200 with the collected upstream headers (the
//! fronting proxy copies them onto the request it forwards), denials map
//! the error kind to a status, redirect verdicts become `Location`
//! responses.
//!
//! In verbose mode denials carry a serialized `{code, message}` body,
//! negotiated across JSON, XML and plain text via the request's `Accept`
//! header.

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use axum::http::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use vigil_core::{PipelineError, RequestContext, Verdict};

use crate::context::VigilContext;

// =============================================================================
// Responder
// =============================================================================

/// Maps verdicts onto HTTP responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Responder {
    verbose: bool,
}

/// The verbose error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl Responder {
    /// Creates a responder. With `verbose` enabled, denials carry an error
    /// body instead of a bare status.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Renders the verdict for the given request context.
    pub fn respond(&self, ctx: &VigilContext, verdict: Verdict) -> Response<Body> {
        match verdict {
            Verdict::Accepted { .. } => self.accepted(ctx),
            Verdict::Redirect { to, code } => self.redirect(&to, code),
            Verdict::Denied { error } => self.denied(ctx, &error),
        }
    }

    fn accepted(&self, ctx: &VigilContext) -> Response<Body> {
        let mut builder = Response::builder().status(StatusCode::OK);
        for (name, value) in ctx.upstream_headers() {
            builder = builder.header(name, value);
        }

        builder.body(Body::empty()).unwrap_or_else(|e| {
            error!(error = %e, "failed to build accept response");
            plain_status(StatusCode::INTERNAL_SERVER_ERROR)
        })
    }

    fn redirect(&self, to: &str, code: u16) -> Response<Body> {
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::FOUND);

        match HeaderValue::from_str(to) {
            Ok(location) => {
                let mut response = plain_status(status);
                response.headers_mut().insert(LOCATION, location);
                response
            }
            Err(e) => {
                error!(error = %e, "redirect target is not a valid header value");
                plain_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn denied(&self, ctx: &VigilContext, error: &PipelineError) -> Response<Body> {
        let status = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = if self.verbose {
            let accept = ctx.header("Accept").unwrap_or_default();
            let (content_type, body) = negotiate(&accept, error);

            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            response
        } else {
            plain_status(status)
        };

        for (name, value) in ctx.response_headers() {
            let name = HeaderName::from_bytes(name.as_bytes());
            let value = HeaderValue::from_str(&value);
            if let (Ok(name), Ok(value)) = (name, value) {
                response.headers_mut().insert(name, value);
            }
        }

        response
    }
}

fn plain_status(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

// =============================================================================
// Content Negotiation
// =============================================================================

/// Serializes `{code, message}` according to the `Accept` header.
fn negotiate(accept: &str, error: &PipelineError) -> (&'static str, String) {
    let code = error.error_type();
    let message = error.to_string();

    if accept.contains("application/json") {
        let body = ErrorBody { code, message };
        (
            "application/json",
            serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string()),
        )
    } else if accept.contains("application/xml") || accept.contains("text/xml") {
        (
            "application/xml",
            format!(
                "<error><code>{}</code><message>{}</message></error>",
                xml_escape(code),
                xml_escape(&message)
            ),
        )
    } else {
        ("text/plain", format!("{code}: {message}"))
    }
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// =============================================================================
// Tests
// =============================================================================
