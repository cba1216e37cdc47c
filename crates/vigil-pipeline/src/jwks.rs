// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWKS retrieval and key caching.
//!
//! A [`JwkStore`] caches JWK sets per endpoint URL with a TTL (default
//! 5 minutes). Reads are lock-free snapshots; cache misses take a per-URL
//! fetch lock with a double-checked re-validation, so concurrent misses for
//! the same endpoint coalesce into exactly one HTTP request.
//!
//! Expired entries are evicted lazily at lookup time. A failed refresh
//! propagates its error; the stale entry is dropped, never served.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use jsonwebtoken::jwk::{Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::Algorithm;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vigil_core::{AuthenticationReason, PipelineError, PipelineResult};

use crate::endpoint::Endpoint;

/// Default TTL for cached JWK sets.
pub const DEFAULT_JWKS_TTL: Duration = Duration::from_secs(300);

// =============================================================================
// JwkStore
// =============================================================================

/// Process-wide JWKS cache with single-flight refresh.
#[derive(Debug)]
pub struct JwkStore {
    default_ttl: Duration,
    entries: DashMap<String, CachedKeys>,
    fetch_locks: DashMap<String, Arc<Mutex<()>>>,
}

#[derive(Debug, Clone)]
struct CachedKeys {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

impl JwkStore {
    /// Creates a store with the default 5 minute TTL.
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_JWKS_TTL)
    }

    /// Creates a store with a custom default TTL.
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: DashMap::new(),
            fetch_locks: DashMap::new(),
        }
    }

    /// Looks up the verification key for `kid`/`algorithm` at the given
    /// endpoint, fetching and caching the JWK set as needed.
    ///
    /// `ttl` overrides the store default for this endpoint (rules may
    /// configure their own `cache_ttl`).
    pub async fn key_for(
        &self,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
        kid: &str,
        algorithm: Algorithm,
        ttl: Option<Duration>,
    ) -> PipelineResult<Jwk> {
        let ttl = ttl.unwrap_or(self.default_ttl);

        if let Some(keys) = self.fresh(&endpoint.url, ttl) {
            return select_key(&keys, kid, algorithm);
        }

        // Miss or expired: serialize the refresh per URL. Whoever loses the
        // race re-checks the cache and uses the winner's result.
        let lock = self
            .fetch_locks
            .entry(endpoint.url.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(keys) = self.fresh(&endpoint.url, ttl) {
            return select_key(&keys, kid, algorithm);
        }

        // lazy eviction of the expired entry before the refresh
        self.entries.remove(&endpoint.url);

        debug!(url = %endpoint.url, "fetching jwks");
        let keys: JwkSet = endpoint.send(cancel).await?;
        let keys = Arc::new(keys);

        self.entries.insert(
            endpoint.url.clone(),
            CachedKeys {
                keys: keys.clone(),
                fetched_at: Instant::now(),
            },
        );

        select_key(&keys, kid, algorithm)
    }

    /// Returns the cached set if it is within its TTL.
    fn fresh(&self, url: &str, ttl: Duration) -> Option<Arc<JwkSet>> {
        self.entries.get(url).and_then(|entry| {
            if entry.fetched_at.elapsed() < ttl {
                Some(entry.keys.clone())
            } else {
                None
            }
        })
    }

    /// The number of cached endpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for JwkStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Key Selection
// =============================================================================

/// Selects the JWK whose `kid` matches and whose `alg`, when present,
/// equals the requested algorithm.
fn select_key(keys: &JwkSet, kid: &str, algorithm: Algorithm) -> PipelineResult<Jwk> {
    keys.keys
        .iter()
        .find(|jwk| {
            jwk.common.key_id.as_deref() == Some(kid)
                && jwk
                    .common
                    .key_algorithm
                    .map(|ka| key_algorithm_matches(ka, algorithm))
                    .unwrap_or(true)
        })
        .cloned()
        .ok_or_else(|| {
            PipelineError::authentication(
                AuthenticationReason::UnknownKey,
                format!("no key for kid '{kid}' and algorithm {algorithm:?}"),
            )
        })
}

/// Compares a JWK `alg` entry against a verification algorithm.
fn key_algorithm_matches(key_algorithm: KeyAlgorithm, algorithm: Algorithm) -> bool {
    let mapped = match key_algorithm {
        KeyAlgorithm::HS256 => Algorithm::HS256,
        KeyAlgorithm::HS384 => Algorithm::HS384,
        KeyAlgorithm::HS512 => Algorithm::HS512,
        KeyAlgorithm::RS256 => Algorithm::RS256,
        KeyAlgorithm::RS384 => Algorithm::RS384,
        KeyAlgorithm::RS512 => Algorithm::RS512,
        KeyAlgorithm::ES256 => Algorithm::ES256,
        KeyAlgorithm::ES384 => Algorithm::ES384,
        KeyAlgorithm::PS256 => Algorithm::PS256,
        KeyAlgorithm::PS384 => Algorithm::PS384,
        KeyAlgorithm::PS512 => Algorithm::PS512,
        KeyAlgorithm::EdDSA => Algorithm::EdDSA,
        _ => return false,
    };

    mapped == algorithm
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jwks_body() -> serde_json::Value {
        json!({
            "keys": [{
                "kty": "RSA",
                "kid": "key-1",
                "alg": "RS256",
                "n": "qoKKJSy_dgBXO9pGYZZWZTVJF2texqh2fM1Y4gLo7mp1PWKmyi9Q9VZ0BV16nCSzIYuwjcNPJURtUDTTkvZGnRGjgnO1Zk3remLsCgnk6KKcGDtluS2hSRn-Wb5hDqJNQjBYiKsCHogcgAJMuXeOpAZ0hVbyGz1qILtYIsrcaWg",
                "e": "AQAB"
            }]
        })
    }

    async fn jwks_server(expected_hits: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .expect(expected_hits)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_cache_hit_avoids_second_fetch() {
        let server = jwks_server(1).await;
        let endpoint = Endpoint::new(format!("{}/jwks", server.uri()));
        let store = JwkStore::new();
        let cancel = CancellationToken::new();

        let first = store
            .key_for(&endpoint, &cancel, "key-1", Algorithm::RS256, None)
            .await
            .unwrap();
        let second = store
            .key_for(&endpoint, &cancel, "key-1", Algorithm::RS256, None)
            .await
            .unwrap();

        assert_eq!(first.common.key_id, second.common.key_id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let server = jwks_server(1).await;
        let endpoint = Endpoint::new(format!("{}/jwks", server.uri()));
        let store = Arc::new(JwkStore::new());
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            store.key_for(&endpoint, &cancel, "key-1", Algorithm::RS256, None),
            store.key_for(&endpoint, &cancel, "key-1", Algorithm::RS256, None),
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let server = jwks_server(2).await;
        let endpoint = Endpoint::new(format!("{}/jwks", server.uri()));
        let store = JwkStore::with_default_ttl(Duration::from_millis(10));
        let cancel = CancellationToken::new();

        store
            .key_for(&endpoint, &cancel, "key-1", Algorithm::RS256, None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        store
            .key_for(&endpoint, &cancel, "key-1", Algorithm::RS256, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_kid() {
        let server = jwks_server(1).await;
        let endpoint = Endpoint::new(format!("{}/jwks", server.uri()));
        let store = JwkStore::new();

        let err = store
            .key_for(
                &endpoint,
                &CancellationToken::new(),
                "other-kid",
                Algorithm::RS256,
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::UnknownKey)
        );
    }

    #[tokio::test]
    async fn test_algorithm_mismatch_is_unknown_key() {
        let server = jwks_server(1).await;
        let endpoint = Endpoint::new(format!("{}/jwks", server.uri()));
        let store = JwkStore::new();

        let err = store
            .key_for(
                &endpoint,
                &CancellationToken::new(),
                "key-1",
                Algorithm::PS512,
                None,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.authentication_reason(),
            Some(AuthenticationReason::UnknownKey)
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_served_stale() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let endpoint = Endpoint::new(format!("{}/jwks", server.uri()));
        let store = JwkStore::new();

        let result = store
            .key_for(
                &endpoint,
                &CancellationToken::new(),
                "key-1",
                Algorithm::RS256,
                None,
            )
            .await;

        assert!(matches!(
            result.unwrap_err(),
            PipelineError::Communication { .. }
        ));
        assert!(store.is_empty());
    }
}
