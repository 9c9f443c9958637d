// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-boundary middleware.
//!
//! Layering, outermost first:
//!
//! 1. [`request_context`] puts a fresh [`RequestContext`] into the request
//!    extensions, with a cancellation token that fires on the request
//!    deadline or when the request is dropped.
//! 2. [`require_auth`] or [`optional_auth`] runs the [`AuthGate`] and swaps
//!    in the context augmented with the caller's identity.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/api/v1/profile", get(get_profile))
//!     .layer(from_fn_with_state(gate.clone(), require_auth));
//!
//! let app = Router::new()
//!     .merge(protected)
//!     .layer(from_fn_with_state(timeout, request_context));
//! ```
//!
//! The gate itself ([`AuthGate::authenticate`] / [`AuthGate::attach`]) does
//! not depend on axum; the functions here only adapt it.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{AuthError, Identity, TokenService};
use crate::context::RequestContext;
use crate::error::ApiError;

/// Whether a request may proceed without a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Reject with 401 unless a valid token is presented.
    Required,
    /// Attach the identity when a valid token is presented; otherwise go on anonymously.
    Optional,
}

/// Turns an `Authorization` header into an [`Identity`].
#[derive(Debug, Clone)]
pub struct AuthGate {
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Validate the bearer token in `headers`.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = bearer_token(headers)?;
        Ok(self.tokens.validate(token)?)
    }

    /// Return `ctx` augmented with the caller's identity.
    ///
    /// In `Optional` mode a missing or bad token yields `ctx` unchanged.
    pub fn attach(
        &self,
        ctx: &RequestContext,
        headers: &HeaderMap,
        mode: AuthMode,
    ) -> Result<RequestContext, AuthError> {
        match self.authenticate(headers) {
            Ok(identity) => ctx
                .with_identity(identity)
                .map_err(|e| AuthError::Internal(e.to_string())),
            Err(e) if mode == AuthMode::Optional => {
                debug!(error = %e, "Proceeding anonymously");
                Ok(ctx.clone())
            }
            Err(e) => Err(e),
        }
    }
}

/// Extract `<token>` from `Authorization: Bearer <token>`.
///
/// The header is split on its first space and the scheme must be exactly
/// `Bearer`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    match value.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

fn current_context(request: &Request) -> RequestContext {
    request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default()
}

async fn gate(gate: &AuthGate, mode: AuthMode, mut request: Request, next: Next) -> Response {
    let ctx = current_context(&request);
    match gate.attach(&ctx, request.headers(), mode) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => {
            debug!(error_code = e.error_code(), "Request rejected by auth gate");
            e.into_response()
        }
    }
}

/// Required gate: downstream only runs for a valid token.
pub async fn require_auth(State(auth): State<AuthGate>, request: Request, next: Next) -> Response {
    gate(&auth, AuthMode::Required, request, next).await
}

/// Optional gate: never fails the request.
pub async fn optional_auth(State(auth): State<AuthGate>, request: Request, next: Next) -> Response {
    gate(&auth, AuthMode::Optional, request, next).await
}

/// Give every request a context whose cancellation token fires when the
/// deadline passes or the request is dropped.
pub async fn request_context(
    State(timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    request
        .extensions_mut()
        .insert(RequestContext::new().with_cancellation(cancel.clone()));

    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            cancel.cancel();
            warn!(timeout_secs = timeout.as_secs(), "Request deadline exceeded");
            ApiError::new(StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
        }
    }
}
