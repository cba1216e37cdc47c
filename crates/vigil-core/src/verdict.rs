// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The outcome of a pipeline run.

use crate::error::PipelineError;
use crate::subject::Subject;

/// The final decision for a request after the matched rule's pipeline ran.
///
/// `Accepted` means the outbound mutations (upstream headers) have been
/// applied to the request context and the request may pass. The two other
/// variants are produced by error handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The request is allowed; the subject was authenticated and authorized.
    Accepted {
        /// The established principal.
        subject: Subject,
    },

    /// The request is denied with the given pipeline error.
    Denied {
        /// The error to be mapped onto an HTTP response.
        error: PipelineError,
    },

    /// The client is to be redirected.
    Redirect {
        /// Target location.
        to: String,
        /// HTTP status code (usually 302 or 303).
        code: u16,
    },
}

impl Verdict {
    /// Creates an accepted verdict.
    pub fn accepted(subject: Subject) -> Self {
        Self::Accepted { subject }
    }

    /// Creates a denied verdict.
    pub fn denied(error: PipelineError) -> Self {
        Self::Denied { error }
    }

    /// Creates a redirect verdict.
    pub fn redirect(to: impl Into<String>, code: u16) -> Self {
        Self::Redirect { to: to.into(), code }
    }

    /// Returns `true` if the request may pass.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthenticationReason, PipelineError};

    #[test]
    fn test_accessors() {
        assert!(Verdict::accepted(Subject::new("u")).is_accepted());
        assert!(!Verdict::redirect("/login", 302).is_accepted());

        let denied = Verdict::denied(PipelineError::authentication(
            AuthenticationReason::NoAuthData,
            "no credential",
        ));
        assert!(!denied.is_accepted());
    }
}
