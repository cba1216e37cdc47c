// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! End-to-end JWT authenticator scenarios against a mock JWKS server.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigil_core::AuthenticationReason;
use vigil_pipeline::{Authenticator, JwkStore, JwtAuthenticator};
use vigil_tests::common::builders::standard_claims;
use vigil_tests::common::{MockRequestContext, SigningKey};

fn authenticator(jwks_url: &str) -> JwtAuthenticator {
    let config = json!({
        "jwks_endpoint": { "url": jwks_url },
        "jwt_assertions": {
            "issuers": ["foobar"],
            "audiences": ["bar"],
            "scopes": { "values": ["foo"] },
            "allowed_algorithms": ["PS512"],
            "validity_leeway": "60s"
        }
    });

    JwtAuthenticator::create(&config, Arc::new(JwkStore::new())).unwrap()
}

async fn jwks_server(document: Value, expected_hits: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .expect(expected_hits)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn happy_path_yields_subject_with_claims() {
    let key = SigningKey::generate("bar");
    let server = jwks_server(key.jwks_document(Algorithm::PS512), 1).await;

    let claims = standard_claims("foo", "foobar", "bar");
    let token = key.sign(Algorithm::PS512, &claims);

    let auth = authenticator(&format!("{}/jwks", server.uri()));
    let ctx = MockRequestContext::new().with_bearer(&token);

    let subject = auth.authenticate(&ctx).await.unwrap();

    assert_eq!(subject.id, "foo");
    assert_eq!(subject.attributes, claims);
}

#[tokio::test]
async fn credential_from_cookie_and_query_fallbacks() {
    let key = SigningKey::generate("bar");
    // the second authentication is served from the key cache
    let server = jwks_server(key.jwks_document(Algorithm::PS512), 1).await;

    let token = key.sign(Algorithm::PS512, &standard_claims("foo", "foobar", "bar"));
    let auth = authenticator(&format!("{}/jwks", server.uri()));

    let ctx = MockRequestContext::new().with_cookie("access_token", &token);
    assert_eq!(auth.authenticate(&ctx).await.unwrap().id, "foo");

    let ctx = MockRequestContext::new().with_query("access_token", &token);
    assert_eq!(auth.authenticate(&ctx).await.unwrap().id, "foo");
}

#[tokio::test]
async fn missing_credential_does_not_touch_jwks() {
    let key = SigningKey::generate("bar");
    let server = jwks_server(key.jwks_document(Algorithm::PS512), 0).await;

    let auth = authenticator(&format!("{}/jwks", server.uri()));
    let error = auth
        .authenticate(&MockRequestContext::new())
        .await
        .unwrap_err();

    assert_eq!(
        error.authentication_reason(),
        Some(AuthenticationReason::NoAuthData)
    );
}

#[tokio::test]
async fn disallowed_algorithm_fails_without_jwks_fetch() {
    let key = SigningKey::generate("bar");
    let server = jwks_server(key.jwks_document(Algorithm::PS512), 0).await;

    // HMAC-signed token; the allow-list only carries PS512
    let claims = standard_claims("foo", "foobar", "bar");
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"shared-secret"),
    )
    .unwrap();

    let auth = authenticator(&format!("{}/jwks", server.uri()));
    let ctx = MockRequestContext::new().with_bearer(&token);

    let error = auth.authenticate(&ctx).await.unwrap_err();
    assert_eq!(
        error.authentication_reason(),
        Some(AuthenticationReason::BadAlgorithm)
    );
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let auth = authenticator("http://127.0.0.1:1/jwks");
    let ctx = MockRequestContext::new().with_bearer("definitely.not-a.jwt");

    let error = auth.authenticate(&ctx).await.unwrap_err();
    assert_eq!(
        error.authentication_reason(),
        Some(AuthenticationReason::MalformedToken)
    );
}

#[tokio::test]
async fn unknown_kid_is_rejected() {
    let advertised = SigningKey::generate("bar");
    let rogue = SigningKey::generate("other");
    let server = jwks_server(advertised.jwks_document(Algorithm::PS512), 1).await;

    let token = rogue.sign(Algorithm::PS512, &standard_claims("foo", "foobar", "bar"));
    let auth = authenticator(&format!("{}/jwks", server.uri()));
    let ctx = MockRequestContext::new().with_bearer(&token);

    let error = auth.authenticate(&ctx).await.unwrap_err();
    assert_eq!(
        error.authentication_reason(),
        Some(AuthenticationReason::UnknownKey)
    );
}

#[tokio::test]
async fn wrong_key_material_fails_signature_check() {
    let advertised = SigningKey::generate("bar");
    let impostor = SigningKey::generate("bar");
    let server = jwks_server(advertised.jwks_document(Algorithm::PS512), 1).await;

    // same kid, different private key
    let token = impostor.sign(Algorithm::PS512, &standard_claims("foo", "foobar", "bar"));
    let auth = authenticator(&format!("{}/jwks", server.uri()));
    let ctx = MockRequestContext::new().with_bearer(&token);

    let error = auth.authenticate(&ctx).await.unwrap_err();
    assert_eq!(
        error.authentication_reason(),
        Some(AuthenticationReason::BadSignature)
    );
}

#[tokio::test]
async fn leeway_applies_symmetrically_to_exp() {
    let key = SigningKey::generate("bar");
    let server = jwks_server(key.jwks_document(Algorithm::PS512), 1).await;
    let auth = authenticator(&format!("{}/jwks", server.uri()));
    let now = Utc::now().timestamp();

    // expired 30s ago, within the 60s leeway
    let mut claims = standard_claims("foo", "foobar", "bar");
    claims["exp"] = json!(now - 30);
    let token = key.sign(Algorithm::PS512, &claims);
    let ctx = MockRequestContext::new().with_bearer(&token);
    assert!(auth.authenticate(&ctx).await.is_ok());

    // expired 90s ago, beyond the leeway
    claims["exp"] = json!(now - 90);
    let token = key.sign(Algorithm::PS512, &claims);
    let ctx = MockRequestContext::new().with_bearer(&token);
    let error = auth.authenticate(&ctx).await.unwrap_err();
    assert_eq!(
        error.authentication_reason(),
        Some(AuthenticationReason::Expired)
    );
}

#[tokio::test]
async fn claim_assertions_reject_mismatches() {
    let key = SigningKey::generate("bar");
    let server = jwks_server(key.jwks_document(Algorithm::PS512), 1).await;
    let auth = authenticator(&format!("{}/jwks", server.uri()));

    for (claims, reason) in [
        (
            standard_claims("foo", "rogue-issuer", "bar"),
            AuthenticationReason::BadIssuer,
        ),
        (
            standard_claims("foo", "foobar", "other-audience"),
            AuthenticationReason::BadAudience,
        ),
        (
            {
                let mut claims = standard_claims("foo", "foobar", "bar");
                claims["scp"] = json!(["bar"]);
                claims
            },
            AuthenticationReason::ScopeMismatch,
        ),
    ] {
        let token = key.sign(Algorithm::PS512, &claims);
        let ctx = MockRequestContext::new().with_bearer(&token);
        let error = auth.authenticate(&ctx).await.unwrap_err();
        assert_eq!(error.authentication_reason(), Some(reason));
    }
}

#[tokio::test]
async fn second_request_is_served_from_key_cache() {
    let key = SigningKey::generate("bar");
    let server = jwks_server(key.jwks_document(Algorithm::PS512), 1).await;
    let auth = authenticator(&format!("{}/jwks", server.uri()));

    for _ in 0..3 {
        let token = key.sign(Algorithm::PS512, &standard_claims("foo", "foobar", "bar"));
        let ctx = MockRequestContext::new().with_bearer(&token);
        assert!(auth.authenticate(&ctx).await.is_ok());
    }

    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
