// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT and JWKS builders for tests.
//!
//! Keys are generated on the fly so tests never embed key material. The
//! JWKS document and the compact token serialization both derive from the
//! same RSA key, which keeps signature verification end to end real.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use openssl::pkey::Private;
use openssl::rsa::Rsa;
use serde_json::{json, Value};

/// An RSA signing key with a fixed key id.
pub struct SigningKey {
    rsa: Rsa<Private>,
    kid: String,
}

impl SigningKey {
    /// Generates a fresh 2048-bit RSA key under the given key id.
    pub fn generate(kid: &str) -> Self {
        Self {
            rsa: Rsa::generate(2048).expect("rsa key generation"),
            kid: kid.to_string(),
        }
    }

    /// The key id.
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// The JWK Set document advertising this key's public half.
    pub fn jwks_document(&self, algorithm: Algorithm) -> Value {
        json!({
            "keys": [{
                "kty": "RSA",
                "kid": self.kid,
                "alg": algorithm_name(algorithm),
                "n": URL_SAFE_NO_PAD.encode(self.rsa.n().to_vec()),
                "e": URL_SAFE_NO_PAD.encode(self.rsa.e().to_vec()),
            }]
        })
    }

    /// Signs the claims into a compact JWT with this key's `kid` in the
    /// header.
    pub fn sign(&self, algorithm: Algorithm, claims: &Value) -> String {
        let mut header = Header::new(algorithm);
        header.kid = Some(self.kid.clone());

        let der = self.rsa.private_key_to_der().expect("rsa key export");
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_rsa_der(&der))
            .expect("jwt signing")
    }
}

fn algorithm_name(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::RS256 => "RS256",
        Algorithm::RS384 => "RS384",
        Algorithm::RS512 => "RS512",
        Algorithm::PS256 => "PS256",
        Algorithm::PS384 => "PS384",
        Algorithm::PS512 => "PS512",
        other => panic!("unsupported test algorithm {other:?}"),
    }
}

/// Standard claims the JWT scenarios use: valid for two seconds from now,
/// scoped `foo bar`.
pub fn standard_claims(subject: &str, issuer: &str, audience: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": subject,
        "iss": issuer,
        "jti": "foo",
        "iat": now - 1,
        "nbf": now - 1,
        "exp": now + 2,
        "aud": [audience],
        "scp": ["foo", "bar"],
    })
}
