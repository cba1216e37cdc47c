// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared in-memory test doubles for pipeline unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use vigil_core::RequestContext;

/// An in-memory request context with builder-style setup.
pub struct TestContext {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    query: HashMap<String, String>,
    form: HashMap<String, String>,
    body: Vec<u8>,
    upstream: Mutex<Vec<(String, String)>>,
    response: Mutex<Vec<(String, String)>>,
    token: CancellationToken,
}

impl Default for TestContext {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            path: "/".to_string(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            query: HashMap::new(),
            form: HashMap::new(),
            body: Vec::new(),
            upstream: Mutex::new(Vec::new()),
            response: Mutex::new(Vec::new()),
            token: CancellationToken::new(),
        }
    }
}

impl TestContext {
    /// Creates an empty context for `GET /`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a cookie.
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a query parameter.
    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    /// Adds a form parameter.
    pub fn with_form(mut self, name: &str, value: &str) -> Self {
        self.form.insert(name.to_string(), value.to_string());
        self
    }

    /// Replaces the cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }
}

impl RequestContext for TestContext {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone())
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
        let mut headers = self.upstream.lock().expect("lock poisoned");
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        headers.push((name.to_string(), value.to_string()));
    }

    fn upstream_headers(&self) -> Vec<(String, String)> {
        self.upstream.lock().expect("lock poisoned").clone()
    }

    fn set_response_header(&self, name: &str, value: &str) {
        let mut headers = self.response.lock().expect("lock poisoned");
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        headers.push((name.to_string(), value.to_string()));
    }

    fn response_headers(&self) -> Vec<(String, String)> {
        self.response.lock().expect("lock poisoned").clone()
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}
