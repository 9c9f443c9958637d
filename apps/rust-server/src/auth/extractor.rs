// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors over the per-request context.
//!
//! The auth gates do the token work; these only read what the gates left in
//! the request extensions.
//!
//! ```rust,ignore
//! async fn get_profile(
//!     State(state): State<AppState>,
//!     Ctx(ctx): Ctx,
//!     Auth(identity): Auth,
//! ) -> Result<Json<UserResponse>, ApiError> {
//!     // identity.user_id() is the authenticated caller
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, Identity};
use crate::context::RequestContext;

/// The request's context; anonymous and without a transaction if no
/// middleware set one.
pub struct Ctx(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Ctx(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default()))
    }
}

/// The authenticated caller. Rejects with 401 when the context has none.
pub struct Auth(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ctx(ctx) = Ctx::from_request_parts(parts, state).await.unwrap_or_else(|e| match e {});
        ctx.identity()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// The caller if one was authenticated.
pub struct OptionalAuth(pub Option<Identity>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ctx(ctx) = Ctx::from_request_parts(parts, state).await?;
        Ok(OptionalAuth(ctx.identity().cloned()))
    }
}
