// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! [`TokenError`] is what the codec and token service return. [`AuthError`] is
//! the request-boundary failure (the "unauthenticated" family) that the
//! required gate and the `Auth` extractor reject with.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure to encode or decode a token.
///
/// Token failures are definitive for that token; nothing retries them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a parseable token (bad segments, bad JSON, missing claims).
    #[error("token is malformed")]
    Malformed,
    /// Signature mismatch, wrong key, or a signing algorithm other than HS256.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Outside the `[nbf, exp)` validity window.
    #[error("token has expired or is not yet valid")]
    Expired,
    /// Signing key misconfiguration.
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Header is not `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token is malformed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired or is not yet valid
    #[error("Token has expired")]
    TokenExpired,
    /// Internal error
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => AuthError::MalformedToken,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Encoding(msg) => AuthError::Internal(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
