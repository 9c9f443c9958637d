// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated identity they decode into.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried inside a signed token.
///
/// Timestamps are Unix seconds, per the JWT registered claim names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Account email at issuance time
    pub email: String,
    /// Issuer
    pub iss: String,
    /// Issued at
    pub iat: i64,
    /// Not before
    pub nbf: i64,
    /// Expiration
    pub exp: i64,
}

/// Who a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: String,
    pub email: String,
}

impl TokenSubject {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

/// Authenticated caller for one request.
///
/// Only produced by a successful token validation; handlers read it from the
/// request context and never build one themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
    email: String,
    issued_at: DateTime<Utc>,
    not_before: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Identity {
    pub(crate) fn from_claims(claims: Claims) -> Option<Self> {
        Some(Self {
            user_id: claims.sub,
            email: claims.email,
            issued_at: timestamp(claims.iat)?,
            not_before: timestamp(claims.nbf)?,
            expires_at: timestamp(claims.exp)?,
        })
    }

    /// Canonical user ID (`sub` claim).
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// The subject to issue a follow-up token for.
    pub fn subject(&self) -> TokenSubject {
        TokenSubject::new(self.user_id.clone(), self.email.clone())
    }

    /// Whether `now` falls inside `[not_before, expires_at)`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.not_before && now < self.expires_at
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}
