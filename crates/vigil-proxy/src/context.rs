// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The axum-backed request context.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::request::Parts;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use vigil_core::RequestContext;

/// [`RequestContext`] implementation over a received axum request.
///
/// Query, cookie and form lookups are pre-parsed once at construction;
/// the outbound header sets use interior mutability so the context can be
/// shared across the pipeline stages.
pub struct VigilContext {
    method: String,
    path: String,
    headers: axum::http::HeaderMap,
    cookies: HashMap<String, String>,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    body: Bytes,
    upstream: Mutex<Vec<(String, String)>>,
    response: Mutex<Vec<(String, String)>>,
    token: CancellationToken,
}

impl VigilContext {
    /// Builds the context from request parts, the collected body and the
    /// request-scoped cancellation token.
    pub fn new(parts: &Parts, body: Bytes, token: CancellationToken) -> Self {
        let query = parts
            .uri
            .query()
            .map(parse_urlencoded)
            .unwrap_or_default();

        let cookies = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(parse_cookies)
            .collect();

        let is_form = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        let form = if is_form {
            match std::str::from_utf8(&body) {
                Ok(text) => parse_urlencoded(text),
                Err(_) => HashMap::new(),
            }
        } else {
            HashMap::new()
        };

        Self {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            headers: parts.headers.clone(),
            cookies,
            query,
            form,
            body,
            upstream: Mutex::new(Vec::new()),
            response: Mutex::new(Vec::new()),
            token,
        }
    }
}

/// Parses an urlencoded string, keeping the first value per name.
fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    let mut parsed = HashMap::new();
    for (name, value) in url::form_urlencoded::parse(input.as_bytes()) {
        parsed
            .entry(name.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    parsed
}

/// Parses a `Cookie` header value into name/value pairs.
fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.is_empty() || value.is_empty() {
                None
            } else {
                Some((name.to_string(), value.to_string()))
            }
        })
        .collect()
}

impl RequestContext for VigilContext {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    fn query_parameter(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn form_parameter(&self, name: &str) -> Option<String> {
        self.form.get(name).cloned()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn set_upstream_header(&self, name: &str, value: &str) {
        let mut headers = self.upstream.lock();
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        headers.push((name.to_string(), value.to_string()));
    }

    fn upstream_headers(&self) -> Vec<(String, String)> {
        self.upstream.lock().clone()
    }

    fn set_response_header(&self, name: &str, value: &str) {
        let mut headers = self.response.lock();
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        headers.push((name.to_string(), value.to_string()));
    }

    fn response_headers(&self) -> Vec<(String, String)> {
        self.response.lock().clone()
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_query_keeps_first_value() {
        let parts = parts(Request::builder().uri("/a?x=1&x=2&token=a%20b"));
        let ctx = VigilContext::new(&parts, Bytes::new(), CancellationToken::new());

        assert_eq!(ctx.query_parameter("x").as_deref(), Some("1"));
        assert_eq!(ctx.query_parameter("token").as_deref(), Some("a b"));
        assert_eq!(ctx.query_parameter("missing"), None);
    }

    #[test]
    fn test_cookies_parsed() {
        let parts = parts(
            Request::builder()
                .uri("/")
                .header("Cookie", "access_token=abc; other=x"),
        );
        let ctx = VigilContext::new(&parts, Bytes::new(), CancellationToken::new());

        assert_eq!(ctx.cookie("access_token").as_deref(), Some("abc"));
        assert_eq!(ctx.cookie("other").as_deref(), Some("x"));
    }

    #[test]
    fn test_form_only_for_urlencoded_bodies() {
        let parts = parts(
            Request::builder()
                .method("POST")
                .uri("/submit")
                .header("Content-Type", "application/x-www-form-urlencoded"),
        );
        let ctx = VigilContext::new(
            &parts,
            Bytes::from_static(b"token=tok&x=1"),
            CancellationToken::new(),
        );
        assert_eq!(ctx.form_parameter("token").as_deref(), Some("tok"));

        let parts = parts_json();
        let ctx = VigilContext::new(
            &parts,
            Bytes::from_static(b"token=tok"),
            CancellationToken::new(),
        );
        assert_eq!(ctx.form_parameter("token"), None);
    }

    fn parts_json() -> Parts {
        let (parts, _) = Request::builder()
            .method("POST")
            .uri("/submit")
            .header("Content-Type", "application/json")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let parts = parts(Request::builder().uri("/").header("X-Custom", "v"));
        let ctx = VigilContext::new(&parts, Bytes::new(), CancellationToken::new());

        assert_eq!(ctx.header("x-custom").as_deref(), Some("v"));
        assert_eq!(ctx.header("X-CUSTOM").as_deref(), Some("v"));
    }

    #[test]
    fn test_upstream_headers_overwrite_by_name() {
        let parts = parts(Request::builder().uri("/"));
        let ctx = VigilContext::new(&parts, Bytes::new(), CancellationToken::new());

        ctx.set_upstream_header("X-User", "a");
        ctx.set_upstream_header("x-user", "b");

        assert_eq!(
            ctx.upstream_headers(),
            vec![("x-user".to_string(), "b".to_string())]
        );
    }
}
