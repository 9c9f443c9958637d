// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token lifecycle: issue, validate, renew.
//!
//! Stateless: there is no session table and no revocation list. A token is
//! trusted until its own `exp`.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::claims::{Identity, TokenSubject};
use super::codec::{ClaimsCodec, Secret, Token};
use super::error::TokenError;

/// Lifetime of a freshly issued token.
pub const ISSUE_TTL_HOURS: i64 = 72;

/// Lifetime of a renewed token.
pub const RENEW_TTL_HOURS: i64 = 24;

/// Issues and validates bearer tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
    codec: ClaimsCodec,
    issue_ttl: Duration,
    renew_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &Secret, issuer: impl Into<String>) -> Result<Self, TokenError> {
        Ok(Self {
            codec: ClaimsCodec::new(secret, issuer)?,
            issue_ttl: Duration::hours(ISSUE_TTL_HOURS),
            renew_ttl: Duration::hours(RENEW_TTL_HOURS),
        })
    }

    pub fn issue(&self, subject: &TokenSubject) -> Result<Token, TokenError> {
        self.issue_at(subject, Utc::now())
    }

    pub fn issue_at(&self, subject: &TokenSubject, now: DateTime<Utc>) -> Result<Token, TokenError> {
        let token = self.codec.encode(subject, now, now + self.issue_ttl)?;
        info!(user_id = %subject.user_id, "Token issued");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Identity, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        self.codec.decode(token, now).inspect_err(|e| {
            debug!(error = %e, "Token validation failed");
        })
    }

    /// Issue a shorter-lived replacement for a still-valid token.
    ///
    /// An expired token cannot be renewed; there is no grace window.
    pub fn renew(&self, token: &str) -> Result<Token, TokenError> {
        self.renew_at(token, Utc::now())
    }

    pub fn renew_at(&self, token: &str, now: DateTime<Utc>) -> Result<Token, TokenError> {
        let identity = self.validate_at(token, now)?;
        let renewed = self
            .codec
            .encode(&identity.subject(), now, now + self.renew_ttl)?;
        info!(user_id = %identity.user_id(), "Token renewed");
        Ok(renewed)
    }
}
