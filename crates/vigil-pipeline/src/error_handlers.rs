// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error handlers: mechanisms that translate pipeline errors into verdicts.
//!
//! A rule's error handlers form an ordered chain. Each handler inspects the
//! error and either declines (`None`, pass to the next) or produces the
//! final [`Verdict`]. Error handlers are the only pipeline site permitted
//! to translate an error into a response effect; the HTTP boundary then
//! maps the verdict onto status, headers and body.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use vigil_core::{PipelineError, PipelineResult, RequestContext, Verdict};

use crate::mechanism::{decode_config, decode_required_config};

// =============================================================================
// ErrorHandler Trait
// =============================================================================

/// A mechanism that maps a pipeline error into a verdict.
pub trait ErrorHandler: Send + Sync {
    /// Inspects the error; `None` declines and passes it to the next
    /// handler in the chain.
    fn handle(&self, ctx: &dyn RequestContext, error: &PipelineError) -> Option<Verdict>;

    /// Derives a new handler from this prototype with the given override.
    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn ErrorHandler>>;
}

// =============================================================================
// Error Kind Selector
// =============================================================================

/// The error kinds a conditional handler fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Authentication failures.
    Authentication,
    /// Authorization failures.
    Authorization,
    /// Upstream communication failures and timeouts.
    Communication,
    /// Internal errors.
    Internal,
}

impl ErrorKind {
    fn matches(&self, error: &PipelineError) -> bool {
        match self {
            ErrorKind::Authentication => {
                matches!(error, PipelineError::Authentication { .. })
            }
            ErrorKind::Authorization => matches!(error, PipelineError::Authorization { .. }),
            ErrorKind::Communication => matches!(
                error,
                PipelineError::Communication { .. } | PipelineError::CommunicationTimeout { .. }
            ),
            ErrorKind::Internal => matches!(error, PipelineError::Internal { .. }),
        }
    }
}

// =============================================================================
// DefaultErrorHandler
// =============================================================================

/// Accepts every error.
///
/// Redirect errors become redirect verdicts; everything else is denied
/// as-is and mapped to a status by the HTTP boundary.
#[derive(Debug, Clone, Default)]
pub struct DefaultErrorHandler;

impl DefaultErrorHandler {
    /// Creates the handler. There is nothing to configure.
    pub fn create() -> Self {
        Self
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, _ctx: &dyn RequestContext, error: &PipelineError) -> Option<Verdict> {
        match error {
            PipelineError::Redirect { to, code } => Some(Verdict::redirect(to.clone(), *code)),
            other => Some(Verdict::denied(other.clone())),
        }
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn ErrorHandler>> {
        Ok(Arc::new(Self))
    }
}

// =============================================================================
// RedirectErrorHandler
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RedirectConfig {
    to: String,
    #[serde(default = "default_redirect_code")]
    code: u16,
    #[serde(default = "default_redirect_when")]
    when: Vec<ErrorKind>,
}

fn default_redirect_code() -> u16 {
    302
}

fn default_redirect_when() -> Vec<ErrorKind> {
    vec![ErrorKind::Authentication]
}

/// Redirects the client when a matching error occurs (login flows).
#[derive(Debug, Clone)]
pub struct RedirectErrorHandler {
    to: String,
    code: u16,
    when: Vec<ErrorKind>,
}

impl RedirectErrorHandler {
    /// Creates a handler from its configuration. `to` is mandatory.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: RedirectConfig = decode_required_config(config, "redirect error handler")?;

        if !(300..400).contains(&config.code) {
            return Err(PipelineError::configuration(format!(
                "redirect error handler requires a 3xx status, got {}",
                config.code
            )));
        }

        Ok(Self {
            to: config.to,
            code: config.code,
            when: config.when,
        })
    }
}

impl ErrorHandler for RedirectErrorHandler {
    fn handle(&self, _ctx: &dyn RequestContext, error: &PipelineError) -> Option<Verdict> {
        if self.when.iter().any(|kind| kind.matches(error)) {
            Some(Verdict::redirect(self.to.clone(), self.code))
        } else {
            None
        }
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn ErrorHandler>> {
        Ok(Arc::new(Self::create(config)?))
    }
}

// =============================================================================
// WwwAuthenticateErrorHandler
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WwwAuthenticateConfig {
    realm: String,
}

impl Default for WwwAuthenticateConfig {
    fn default() -> Self {
        Self {
            realm: "vigil".to_string(),
        }
    }
}

/// Answers authentication failures with a `WWW-Authenticate` challenge.
#[derive(Debug, Clone)]
pub struct WwwAuthenticateErrorHandler {
    realm: String,
}

impl WwwAuthenticateErrorHandler {
    /// Creates a handler from its configuration.
    pub fn create(config: &Value) -> PipelineResult<Self> {
        let config: WwwAuthenticateConfig = decode_config(config, "www_authenticate error handler")?;
        Ok(Self { realm: config.realm })
    }
}

impl ErrorHandler for WwwAuthenticateErrorHandler {
    fn handle(&self, ctx: &dyn RequestContext, error: &PipelineError) -> Option<Verdict> {
        if !matches!(error, PipelineError::Authentication { .. }) {
            return None;
        }

        ctx.set_response_header(
            "WWW-Authenticate",
            &format!("Bearer realm=\"{}\"", self.realm),
        );
        Some(Verdict::denied(error.clone()))
    }

    fn with_config(&self, config: &Value) -> PipelineResult<Arc<dyn ErrorHandler>> {
        Ok(Arc::new(Self::create(config)?))
    }
}

// =============================================================================
// CompositeErrorHandler
// =============================================================================

/// Walks the handler chain; the first verdict wins.
pub struct CompositeErrorHandler {
    handlers: Vec<Arc<dyn ErrorHandler>>,
}

impl CompositeErrorHandler {
    /// Creates a composite over the given handlers.
    pub fn new(handlers: Vec<Arc<dyn ErrorHandler>>) -> Self {
        Self { handlers }
    }

    /// The default chain: just the default handler.
    pub fn default_chain() -> Self {
        Self::new(vec![Arc::new(DefaultErrorHandler)])
    }

    /// Dispatches the error; all-decline falls back to denying with the
    /// original error.
    pub fn dispatch(&self, ctx: &dyn RequestContext, error: PipelineError) -> Verdict {
        for handler in &self.handlers {
            if let Some(verdict) = handler.handle(ctx, &error) {
                return verdict;
            }
        }

        Verdict::denied(error)
    }

    /// The number of composed handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are composed.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl ErrorHandler for CompositeErrorHandler {
    fn handle(&self, ctx: &dyn RequestContext, error: &PipelineError) -> Option<Verdict> {
        self.handlers
            .iter()
            .find_map(|handler| handler.handle(ctx, error))
    }

    fn with_config(&self, _config: &Value) -> PipelineResult<Arc<dyn ErrorHandler>> {
        Err(PipelineError::configuration("reconfiguration not allowed"))
    }
}

// =============================================================================
// Tests
// =============================================================================
