// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Rules and the pipeline engine.
//!
//! A rule binds a request matcher to an executable pipeline: composite
//! authenticators (first success), hydrators and authorizers (all must
//! succeed), exactly one unifier, and an error handler chain. The
//! [`RuleTable`] holds the rules in declaration order; the first matching
//! rule wins.
//!
//! Cancellation is observed between stages and inside endpoint I/O; a
//! cancelled request skips the remaining mechanisms and reaches the error
//! handlers as `CancelledError`.

use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use vigil_config::{MatchDecl, RuleDecl, UrlStrategy};
use vigil_core::{PipelineError, PipelineResult, RequestContext, Subject, Verdict};

use crate::authenticators::{Authenticator, CompositeAuthenticator};
use crate::authorizers::{Authorizer, CompositeAuthorizer};
use crate::error_handlers::CompositeErrorHandler;
use crate::hydrators::{CompositeHydrator, Hydrator};
use crate::registry::MechanismCatalog;
use crate::unifiers::{NoopUnifier, Unifier};

// =============================================================================
// RuleMatcher
// =============================================================================

/// Decides whether a rule applies to a request.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    methods: Vec<String>,
    pattern: Regex,
}

impl RuleMatcher {
    /// Builds a matcher from its configuration.
    pub fn from_config(decl: &MatchDecl) -> PipelineResult<Self> {
        let pattern = match decl.matching_strategy {
            UrlStrategy::Glob => glob_to_regex(&decl.url),
            UrlStrategy::Regex => format!("^(?:{})$", decl.url),
        };

        let pattern = Regex::new(&pattern).map_err(|e| {
            PipelineError::configuration(format!("invalid url pattern '{}': {e}", decl.url))
        })?;

        Ok(Self {
            methods: decl.methods.iter().map(|m| m.to_uppercase()).collect(),
            pattern,
        })
    }

    /// Returns `true` if the method and path match.
    ///
    /// An empty method list matches every method.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        if !self.methods.is_empty() && !self.methods.iter().any(|m| m == method) {
            return false;
        }

        self.pattern.is_match(path)
    }
}

/// Translates a URL glob into an anchored regex. `*` matches within a path
/// segment, `**` across segments.
fn glob_to_regex(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');

    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                pattern.push_str(".*");
            } else {
                pattern.push_str("[^/]*");
            }
        } else {
            pattern.push_str(&regex::escape(&c.to_string()));
        }
    }

    pattern.push('$');
    pattern
}

// =============================================================================
// Rule
// =============================================================================

/// A matcher plus the pipeline executed for matching requests.
pub struct Rule {
    id: String,
    matcher: RuleMatcher,
    authenticators: CompositeAuthenticator,
    hydrators: CompositeHydrator,
    authorizers: CompositeAuthorizer,
    unifier: Arc<dyn Unifier>,
    error_handlers: CompositeErrorHandler,
}

impl Rule {
    /// Builds a rule from its declaration, resolving mechanism references
    /// against the catalog and applying per-rule overrides.
    pub fn from_config(decl: &RuleDecl, catalog: &MechanismCatalog) -> PipelineResult<Self> {
        let matcher = RuleMatcher::from_config(&decl.matcher)?;

        let mut authenticators: Vec<Arc<dyn Authenticator>> = Vec::new();
        for reference in &decl.execute.authenticators {
            let prototype = catalog.authenticator(&reference.id)?;
            authenticators.push(match &reference.config {
                Some(config) => prototype.with_config(config)?,
                None => prototype,
            });
        }
        if authenticators.is_empty() {
            return Err(PipelineError::configuration(format!(
                "rule '{}' requires at least one authenticator",
                decl.id
            )));
        }

        let mut hydrators: Vec<Arc<dyn Hydrator>> = Vec::new();
        for reference in &decl.execute.hydrators {
            let prototype = catalog.hydrator(&reference.id)?;
            hydrators.push(match &reference.config {
                Some(config) => prototype.with_config(config)?,
                None => prototype,
            });
        }

        let mut authorizers: Vec<Arc<dyn Authorizer>> = Vec::new();
        for reference in &decl.execute.authorizers {
            let prototype = catalog.authorizer(&reference.id)?;
            authorizers.push(match &reference.config {
                Some(config) => prototype.with_config(config)?,
                None => prototype,
            });
        }

        let unifier: Arc<dyn Unifier> = match &decl.execute.unifier {
            Some(reference) => {
                let prototype = catalog.unifier(&reference.id)?;
                match &reference.config {
                    Some(config) => prototype.with_config(config)?,
                    None => prototype,
                }
            }
            None => Arc::new(NoopUnifier),
        };

        let error_handlers = if decl.execute.error_handlers.is_empty() {
            CompositeErrorHandler::default_chain()
        } else {
            let mut handlers = Vec::new();
            for reference in &decl.execute.error_handlers {
                let prototype = catalog.error_handler(&reference.id)?;
                handlers.push(match &reference.config {
                    Some(config) => prototype.with_config(config)?,
                    None => prototype,
                });
            }
            CompositeErrorHandler::new(handlers)
        };

        Ok(Self {
            id: decl.id.clone(),
            matcher,
            authenticators: CompositeAuthenticator::new(authenticators),
            hydrators: CompositeHydrator::new(hydrators),
            authorizers: CompositeAuthorizer::new(authorizers),
            unifier,
            error_handlers,
        })
    }

    /// The rule id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns `true` if this rule applies to the request.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.matcher.matches(method, path)
    }

    /// Executes the pipeline and produces the final verdict.
    pub async fn execute(&self, ctx: &dyn RequestContext) -> Verdict {
        match self.run(ctx).await {
            Ok(subject) => {
                debug!(rule = %self.id, subject = %subject.id, "request accepted");
                Verdict::accepted(subject)
            }
            Err(error) => {
                warn!(rule = %self.id, error = %error, "pipeline failed");
                self.error_handlers.dispatch(ctx, error)
            }
        }
    }

    async fn run(&self, ctx: &dyn RequestContext) -> PipelineResult<Subject> {
        if ctx.cancellation().is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mut subject = self.authenticators.authenticate(ctx).await?;
        self.hydrators.hydrate(ctx, &mut subject).await?;
        self.authorizers.authorize(ctx, &subject).await?;

        if ctx.cancellation().is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        self.unifier.unify(ctx, &subject).await?;
        Ok(subject)
    }
}

// =============================================================================
// RuleTable
// =============================================================================

/// The ordered rule set; the first matching rule wins.
pub struct RuleTable {
    rules: Vec<Arc<Rule>>,
}

impl RuleTable {
    /// Builds the table from the rule declarations.
    pub fn from_config(decls: &[RuleDecl], catalog: &MechanismCatalog) -> PipelineResult<Self> {
        let rules = decls
            .iter()
            .map(|decl| Rule::from_config(decl, catalog).map(Arc::new))
            .collect::<PipelineResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// An empty table.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Finds the first rule matching the request.
    pub fn match_rule(&self, method: &str, path: &str) -> Option<Arc<Rule>> {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .cloned()
    }

    /// The number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
