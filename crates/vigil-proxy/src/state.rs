// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared application state.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use vigil_config::ServeConfig;
use vigil_pipeline::RuleTable;

use crate::response::Responder;

/// Application state shared across request handlers.
///
/// The rule table is read-mostly: handlers take an `Arc` snapshot, so a
/// configuration reload swaps the table atomically while in-flight
/// requests continue against the rules they started with.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    table: RwLock<Arc<RuleTable>>,
    responder: Responder,
    max_body_bytes: usize,
    shutdown: CancellationToken,
}

impl AppState {
    /// Creates the state from the initial rule table and serve settings.
    pub fn new(table: RuleTable, serve: &ServeConfig) -> Self {
        Self {
            inner: Arc::new(StateInner {
                table: RwLock::new(Arc::new(table)),
                responder: Responder::new(serve.verbose_errors),
                max_body_bytes: serve.max_body_bytes,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Snapshot of the current rule table.
    pub fn rules(&self) -> Arc<RuleTable> {
        self.inner.table.read().clone()
    }

    /// Atomically replaces the rule table.
    pub fn swap_rules(&self, table: RuleTable) {
        let table = Arc::new(table);
        info!(rules = table.len(), "swapping rule table");
        *self.inner.table.write() = table;
    }

    /// The verdict responder.
    pub fn responder(&self) -> &Responder {
        &self.inner.responder
    }

    /// Maximum accepted request body size.
    pub fn max_body_bytes(&self) -> usize {
        self.inner.max_body_bytes
    }

    /// The application-scoped shutdown token. Request contexts derive their
    /// cancellation tokens from it.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_does_not_disturb_existing_snapshots() {
        let state = AppState::new(RuleTable::empty(), &ServeConfig::default());

        let snapshot = state.rules();
        state.swap_rules(RuleTable::empty());

        // the old snapshot stays usable
        assert!(snapshot.is_empty());
        assert!(state.rules().is_empty());
    }
}
