// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OAuth2 / OIDC claim handling: scope algebras and the claim validation
//! policy shared by the token-based authenticators.

pub mod expectation;
pub mod scopes;

pub use expectation::{default_algorithms, presented_scopes, Expectation};
pub use scopes::{ScopeStrategy, ScopesMatcher};
