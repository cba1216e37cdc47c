// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-request context abstraction.
//!
//! The host HTTP server creates one [`RequestContext`] per incoming request
//! and hands it to the rule pipeline. Mechanisms only ever see this trait,
//! never the server's own request types, which keeps the pipeline testable
//! with plain in-memory contexts.

use tokio_util::sync::CancellationToken;

/// Read access to an incoming request plus the outbound mutation surface.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; mutating accessors take `&self`
/// and use interior mutability so the context can be shared across the
/// pipeline stages of a single request.
pub trait RequestContext: Send + Sync {
    /// The HTTP method (uppercase, e.g. `GET`).
    fn method(&self) -> &str;

    /// The request path (no query string).
    fn path(&self) -> &str;

    /// Returns a header value by case-insensitive name.
    fn header(&self, name: &str) -> Option<String>;

    /// Returns a cookie value by name.
    fn cookie(&self, name: &str) -> Option<String>;

    /// Returns the first query parameter value by name.
    fn query_parameter(&self, name: &str) -> Option<String>;

    /// Returns a form parameter value by name.
    ///
    /// Only populated when the request body is
    /// `application/x-www-form-urlencoded`.
    fn form_parameter(&self, name: &str) -> Option<String>;

    /// The raw request body.
    fn body(&self) -> &[u8];

    /// Records a header to be forwarded to the upstream service.
    ///
    /// Repeated calls for the same name overwrite the previous value.
    fn set_upstream_header(&self, name: &str, value: &str);

    /// Snapshot of the headers recorded for the upstream service.
    fn upstream_headers(&self) -> Vec<(String, String)>;

    /// Records a header to be set on the response to the client
    /// (e.g. `WWW-Authenticate`).
    fn set_response_header(&self, name: &str, value: &str);

    /// Snapshot of the headers recorded for the client response.
    fn response_headers(&self) -> Vec<(String, String)>;

    /// The cancellation token scoped to this request.
    ///
    /// Mechanisms must observe it at their next I/O suspension point.
    fn cancellation(&self) -> &CancellationToken;
}
