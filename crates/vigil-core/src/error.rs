// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for vigil.
//!
//! Every failure a pipeline mechanism can produce is expressed as a
//! [`PipelineError`] kind. The kinds are stable: error handlers and the
//! HTTP boundary dispatch on them, so mechanisms must not invent ad-hoc
//! error shapes.
//!
//! # Error Kinds
//!
//! ```text
//! PipelineError
//! ├── Argument              - malformed input from the caller        → 400
//! ├── Configuration         - raised at construction time only       → 500
//! ├── Authentication        - subject could not be established       → 401
//! ├── Authorization         - subject is not allowed                 → 403
//! ├── Communication         - upstream unreachable                   → 502
//! ├── CommunicationTimeout  - upstream deadline exceeded             → 502
//! ├── Redirect              - mandated redirect, not a failure       → code
//! ├── Cancelled             - cooperative cancellation               → 499
//! └── Internal              - unexpected                             → 500
//! ```
//!
//! # Examples
//!
//! ```
//! use vigil_core::error::{AuthenticationReason, PipelineError};
//!
//! let error = PipelineError::authentication(AuthenticationReason::Expired, "token expired");
//! assert_eq!(error.status_code(), 401);
//! assert!(!error.is_retryable());
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

// =============================================================================
// AuthenticationReason
// =============================================================================

/// Stable reason codes for authentication failures.
///
/// Reasons are carried alongside the error so that callers (and the verbose
/// error responder) can report why a credential was rejected without parsing
/// free-form messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationReason {
    /// No credential could be extracted from the request.
    NoAuthData,
    /// The credential is not a well-formed token.
    MalformedToken,
    /// No verification key matches the token's key id and algorithm.
    UnknownKey,
    /// The token signature did not verify.
    BadSignature,
    /// The token issuer is not trusted.
    BadIssuer,
    /// None of the token audiences is targeted at this service.
    BadAudience,
    /// The token is signed with a disallowed algorithm.
    BadAlgorithm,
    /// The token expired (beyond the configured leeway).
    Expired,
    /// The token is not yet valid (beyond the configured leeway).
    NotYetValid,
    /// No (non-empty) subject could be extracted from the claims.
    NoSubject,
    /// The presented scopes do not satisfy the required scopes.
    ScopeMismatch,
    /// The credential was rejected outright (inactive token, deny-all).
    Denied,
}

impl AuthenticationReason {
    /// Returns the stable reason code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationReason::NoAuthData => "no_auth_data",
            AuthenticationReason::MalformedToken => "malformed_token",
            AuthenticationReason::UnknownKey => "unknown_key",
            AuthenticationReason::BadSignature => "bad_signature",
            AuthenticationReason::BadIssuer => "bad_issuer",
            AuthenticationReason::BadAudience => "bad_audience",
            AuthenticationReason::BadAlgorithm => "bad_algorithm",
            AuthenticationReason::Expired => "expired",
            AuthenticationReason::NotYetValid => "not_yet_valid",
            AuthenticationReason::NoSubject => "no_subject",
            AuthenticationReason::ScopeMismatch => "scope_mismatch",
            AuthenticationReason::Denied => "denied",
        }
    }
}

impl fmt::Display for AuthenticationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// PipelineError
// =============================================================================

/// The error type carried through the rule pipeline.
///
/// Mechanisms return this error; the engine does not swallow it. Error
/// handlers and the HTTP boundary are the only places where an error is
/// translated into a response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// Malformed input from the calling side.
    #[error("invalid argument: {message}")]
    Argument {
        /// Error message.
        message: String,
    },

    /// Invalid configuration. Raised while mechanisms are constructed or
    /// rebound, never during request handling.
    #[error("configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// The request could not be authenticated.
    #[error("authentication failed ({reason}): {message}")]
    Authentication {
        /// Stable reason code.
        reason: AuthenticationReason,
        /// Error message.
        message: String,
    },

    /// The authenticated subject is not allowed to perform the request.
    #[error("authorization failed: {message}")]
    Authorization {
        /// Error message.
        message: String,
    },

    /// An upstream service could not be reached or answered unexpectedly.
    #[error("communication error: {message}")]
    Communication {
        /// Error message.
        message: String,
        /// Whether a retry may succeed.
        transient: bool,
    },

    /// An upstream call exceeded its deadline.
    #[error("communication timed out after {duration:?}")]
    CommunicationTimeout {
        /// The configured deadline.
        duration: Duration,
    },

    /// A mandated redirect. Not a failure per se; conveys where to send
    /// the client.
    #[error("redirect to {to}")]
    Redirect {
        /// Target location.
        to: String,
        /// HTTP status code to respond with.
        code: u16,
    },

    /// The request was cancelled cooperatively.
    #[error("request cancelled")]
    Cancelled,

    /// An unexpected condition. Always maps to HTTP 500.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl PipelineError {
    /// Creates an argument error.
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Creates an authentication error with the given reason code.
    pub fn authentication(reason: AuthenticationReason, message: impl Into<String>) -> Self {
        Self::Authentication {
            reason,
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization { message: message.into() }
    }

    /// Creates a communication error.
    pub fn communication(message: impl Into<String>, transient: bool) -> Self {
        Self::Communication {
            message: message.into(),
            transient,
        }
    }

    /// Creates a communication timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::CommunicationTimeout { duration }
    }

    /// Creates a redirect.
    pub fn redirect(to: impl Into<String>, code: u16) -> Self {
        Self::Redirect { to: to.into(), code }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// Retryable errors are transient upstream conditions that may succeed
    /// on a subsequent attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::CommunicationTimeout { .. }
                | PipelineError::Communication { transient: true, .. }
        )
    }

    /// Returns the authentication reason, if this is an authentication error.
    pub fn authentication_reason(&self) -> Option<AuthenticationReason> {
        match self {
            PipelineError::Authentication { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Returns the error kind as a string for logging, metrics and the
    /// verbose error body.
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::Argument { .. } => "argument",
            PipelineError::Configuration { .. } => "configuration",
            PipelineError::Authentication { .. } => "authentication",
            PipelineError::Authorization { .. } => "authorization",
            PipelineError::Communication { .. } => "communication",
            PipelineError::CommunicationTimeout { .. } => "communication_timeout",
            PipelineError::Redirect { .. } => "redirect",
            PipelineError::Cancelled => "cancelled",
            PipelineError::Internal { .. } => "internal",
        }
    }

    /// Returns the HTTP status code this error maps to by default.
    ///
    /// 499 is the de-facto "client closed request" status.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Argument { .. } => 400,
            PipelineError::Authentication { .. } => 401,
            PipelineError::Authorization { .. } => 403,
            PipelineError::Communication { .. } | PipelineError::CommunicationTimeout { .. } => 502,
            PipelineError::Redirect { code, .. } => *code,
            PipelineError::Cancelled => 499,
            PipelineError::Configuration { .. } | PipelineError::Internal { .. } => 500,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with [`PipelineError`].
pub type PipelineResult<T> = Result<T, PipelineError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PipelineError::argument("bad").status_code(), 400);
        assert_eq!(
            PipelineError::authentication(AuthenticationReason::NoAuthData, "none").status_code(),
            401
        );
        assert_eq!(PipelineError::authorization("nope").status_code(), 403);
        assert_eq!(PipelineError::communication("down", true).status_code(), 502);
        assert_eq!(
            PipelineError::timeout(Duration::from_secs(10)).status_code(),
            502
        );
        assert_eq!(PipelineError::redirect("/login", 302).status_code(), 302);
        assert_eq!(PipelineError::Cancelled.status_code(), 499);
        assert_eq!(PipelineError::internal("boom").status_code(), 500);
        assert_eq!(PipelineError::configuration("bad").status_code(), 500);
    }

    #[test]
    fn test_retryable() {
        assert!(PipelineError::timeout(Duration::from_secs(5)).is_retryable());
        assert!(PipelineError::communication("reset", true).is_retryable());
        assert!(!PipelineError::communication("404", false).is_retryable());
        assert!(!PipelineError::Cancelled.is_retryable());
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(AuthenticationReason::NoAuthData.as_str(), "no_auth_data");
        assert_eq!(AuthenticationReason::BadAlgorithm.as_str(), "bad_algorithm");
        assert_eq!(AuthenticationReason::ScopeMismatch.as_str(), "scope_mismatch");
        assert_eq!(AuthenticationReason::NotYetValid.as_str(), "not_yet_valid");
    }

    #[test]
    fn test_authentication_reason_accessor() {
        let err = PipelineError::authentication(AuthenticationReason::BadIssuer, "untrusted");
        assert_eq!(err.authentication_reason(), Some(AuthenticationReason::BadIssuer));
        assert_eq!(PipelineError::Cancelled.authentication_reason(), None);
    }
}
