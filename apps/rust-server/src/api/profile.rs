// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile endpoints. Both sit behind the required auth gate.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::json_body;
use crate::{
    auth::{Auth, Ctx},
    error::ApiError,
    models::{UpdateProfileRequest, User},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "Profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = User),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists"),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Auth(identity): Auth,
) -> Result<Json<User>, ApiError> {
    let user = state.profiles.get(&ctx, identity.user_id())?;
    Ok(Json(user.into()))
}

/// Update `name`, `phone` and/or `username`. Blank values are ignored.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfileRequest,
    tag = "Profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated profile", body = User),
        (status = 400, description = "No valid fields to update"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Account no longer exists"),
        (status = 409, description = "Username already exists"),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Auth(identity): Auth,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let request = json_body(payload)?;
    let user = state
        .profiles
        .update(&ctx, identity.user_id(), request)
        .await?;
    Ok(Json(user.into()))
}
